use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::{Action, DiffTarget, Nav, Tab};
use crate::diff::DiffDocument;
use crate::error::DashError;
use crate::event::Event;
use crate::forge::{Forge, WebKind};
use crate::metrics;
use crate::pipeline::Pipeline;
use crate::screen::Screen;
use crate::task;
use crate::types::{Commit, Issue, Metrics, PrSummary, RepoRef, ReviewSummary};

/// Open PRs, each enriched with its reviews one request at a time
pub type ReviewQueue = Pipeline<PrSummary, ReviewSummary>;

/// Rows taken by the header, tab bar, borders and status line
const CHROME_ROWS: u16 = 5;

/// Transient message on the status line, cleared by the next user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Diff,
}

pub struct App {
    pub repo: RepoRef,
    pub user: Option<String>,
    pub tab: Tab,
    pub view: View,

    pub issues: Screen<Vec<Issue>>,
    pub prs: Screen<Vec<PrSummary>>,
    pub queue: Screen<ReviewQueue>,
    pub commits: Screen<Vec<Commit>>,
    pub metrics: Screen<Metrics>,
    pub diff: Screen<DiffDocument>,
    pub diff_target: Option<DiffTarget>,

    pub page_rows: usize,
    pub status: Option<Status>,
    pub should_quit: bool,
    metrics_repos: Vec<RepoRef>,
    forge: Arc<dyn Forge>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        forge: Arc<dyn Forge>,
        repo: RepoRef,
        metrics_repos: Vec<RepoRef>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        let metrics_repos = if metrics_repos.is_empty() {
            vec![repo.clone()]
        } else {
            metrics_repos
        };

        Self {
            repo,
            user: None,
            tab: Tab::default(),
            view: View::List,

            issues: Screen::new(),
            prs: Screen::new(),
            queue: Screen::new(),
            commits: Screen::new(),
            metrics: Screen::new(),
            diff: Screen::new(),
            diff_target: None,

            page_rows: 20,
            status: None,
            should_quit: false,
            metrics_repos,
            forge,
            action_tx,
        }
    }

    pub fn forge_name(&self) -> &str {
        self.forge.name()
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::SwitchTab(self.tab),
            Event::Key(key) => self.handle_key(key),
            Event::Resize(width, height) => Action::Resize { width, height },
            Event::Tick | Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => match self.view {
                View::Diff => Action::Back,
                View::List => Action::Quit,
            },
            KeyCode::Char('d') if ctrl => Action::Navigate(Nav::PageDown),
            KeyCode::Char('u') if ctrl => Action::Navigate(Nav::PageUp),
            KeyCode::Char('j') | KeyCode::Down => Action::Navigate(Nav::Down),
            KeyCode::Char('k') | KeyCode::Up => Action::Navigate(Nav::Up),
            KeyCode::Char('g') | KeyCode::Home => Action::Navigate(Nav::Top),
            KeyCode::Char('G') | KeyCode::End => Action::Navigate(Nav::Bottom),
            KeyCode::PageDown => Action::Navigate(Nav::PageDown),
            KeyCode::PageUp => Action::Navigate(Nav::PageUp),
            KeyCode::Enter => Action::Select,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char('o') => Action::OpenInBrowser,
            KeyCode::Char('y') => Action::YankUrl,
            KeyCode::Char(']') if self.view == View::Diff => Action::NextFile,
            KeyCode::Char('[') if self.view == View::Diff => Action::PrevFile,
            KeyCode::Tab | KeyCode::Char('l') => Action::NextTab,
            KeyCode::BackTab | KeyCode::Char('h') => Action::PrevTab,
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                Action::SwitchTab(Tab::ALL[index])
            }
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.status.is_some()
            && matches!(
                action,
                Action::Navigate(_)
                    | Action::Select
                    | Action::Refresh
                    | Action::SwitchTab(_)
                    | Action::NextTab
                    | Action::PrevTab
                    | Action::Back
            )
        {
            self.status = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => {
                if self.view == View::Diff {
                    self.view = View::List;
                }
            }
            Action::Navigate(nav) => {
                let page = self.page_rows;
                match self.view {
                    View::Diff => self.diff.navigate(nav, page),
                    View::List => match self.tab {
                        Tab::Issues => self.issues.navigate(nav, page),
                        Tab::PullRequests => self.prs.navigate(nav, page),
                        Tab::ReviewQueue => self.queue.navigate(nav, page),
                        Tab::Commits => self.commits.navigate(nav, page),
                        Tab::Metrics => self.metrics.navigate(nav, page),
                    },
                }
            }
            Action::Select => self.select(),
            Action::Refresh => match self.view {
                View::Diff => self.reload_diff(),
                View::List => self.load_tab(self.tab),
            },
            Action::SwitchTab(tab) => {
                self.view = View::List;
                self.tab = tab;
                if self.screen_is_idle(tab) {
                    self.load_tab(tab);
                }
            }
            Action::NextTab => self.update(Action::SwitchTab(self.tab.next())),
            Action::PrevTab => self.update(Action::SwitchTab(self.tab.prev())),
            Action::NextFile => {
                if let Some(row) = self
                    .diff
                    .loaded()
                    .and_then(|doc| doc.next_file_row(self.diff.cursor))
                {
                    self.diff.cursor = row;
                }
            }
            Action::PrevFile => {
                if let Some(row) = self
                    .diff
                    .loaded()
                    .and_then(|doc| doc.prev_file_row(self.diff.cursor))
                {
                    self.diff.cursor = row;
                }
            }
            Action::OpenInBrowser => {
                if let Some(url) = self.selected_url() {
                    if let Err(e) = open::that(&url) {
                        self.report(DashError::from(e));
                    }
                }
            }
            Action::YankUrl => {
                if let Some(url) = self.selected_url() {
                    match copy_to_clipboard(&url) {
                        Ok(()) => self.status = Some(Status::Info(format!("Copied {}", url))),
                        Err(e) => self.report(e),
                    }
                }
            }
            Action::Resize { height, .. } => {
                self.page_rows = height.saturating_sub(CHROME_ROWS).max(1) as usize;
            }

            Action::IssuesLoaded { generation, result } => {
                self.issues.finish(generation, result);
            }
            Action::PrsLoaded { generation, result } => {
                self.prs.finish(generation, result);
            }
            Action::CommitsLoaded { generation, result } => {
                self.commits.finish(generation, result);
            }
            Action::DiffLoaded { generation, result } => {
                self.diff.finish(generation, result);
            }

            Action::QueueLoaded { generation, result } => {
                let result = result.map(|prs| Pipeline::new(prs, generation));
                if self.queue.finish(generation, result) {
                    self.advance_queue();
                }
            }
            Action::ReviewsLoaded {
                generation,
                index,
                result,
            } => {
                if !self.queue.is_current(generation) {
                    tracing::debug!(generation, index, "dropping reviews from a previous load");
                    return;
                }
                let resolved = self
                    .queue
                    .loaded_mut()
                    .is_some_and(|queue| queue.resolve(generation, index, result));
                if resolved {
                    self.advance_queue();
                }
            }

            Action::MetricsProgress {
                generation,
                snapshot,
                listener,
            } => {
                if self.metrics.record_progress(generation, snapshot) {
                    listener.listen(&self.action_tx, move |snapshot, listener| {
                        Action::MetricsProgress {
                            generation,
                            snapshot,
                            listener,
                        }
                    });
                }
            }
            Action::MetricsLoaded { generation, result } => {
                self.metrics.finish(generation, result);
            }

            Action::Error(msg) => {
                self.status = Some(Status::Error(msg));
            }
            Action::None => {}
        }
    }

    /// Queue a failure for the status line.
    fn report(&self, err: DashError) {
        tracing::warn!(error = %err, "action failed");
        self.action_tx.send(Action::from(err)).ok();
    }

    fn screen_is_idle(&self, tab: Tab) -> bool {
        match tab {
            Tab::Issues => self.issues.is_idle(),
            Tab::PullRequests => self.prs.is_idle(),
            Tab::ReviewQueue => self.queue.is_idle(),
            Tab::Commits => self.commits.is_idle(),
            Tab::Metrics => self.metrics.is_idle(),
        }
    }

    fn select(&mut self) {
        if self.view == View::Diff {
            return;
        }
        match self.tab {
            Tab::Issues | Tab::Metrics => self.update(Action::OpenInBrowser),
            Tab::PullRequests => {
                let number = self
                    .prs
                    .loaded()
                    .and_then(|prs| prs.get(self.prs.cursor))
                    .map(|pr| pr.number);
                if let Some(number) = number {
                    self.open_diff(DiffTarget::PullRequest(number));
                }
            }
            Tab::ReviewQueue => {
                let number = self
                    .queue
                    .loaded()
                    .and_then(|queue| queue.entries().get(self.queue.cursor))
                    .map(|entry| entry.item.number);
                if let Some(number) = number {
                    self.open_diff(DiffTarget::PullRequest(number));
                }
            }
            Tab::Commits => {
                let sha = self
                    .commits
                    .loaded()
                    .and_then(|commits| commits.get(self.commits.cursor))
                    .map(|commit| commit.sha.clone());
                if let Some(sha) = sha {
                    self.open_diff(DiffTarget::Commit(sha));
                }
            }
        }
    }

    fn selected_url(&self) -> Option<String> {
        let forge = &self.forge;
        let repo = &self.repo;
        if self.view == View::Diff {
            return self.diff_target.as_ref().map(|target| match target {
                DiffTarget::PullRequest(n) => forge.web_url(repo, WebKind::PullRequest, &n.to_string()),
                DiffTarget::Commit(sha) => forge.web_url(repo, WebKind::Commit, sha),
            });
        }
        match self.tab {
            Tab::Issues => {
                let issue = self.issues.loaded()?.get(self.issues.cursor)?;
                Some(forge.web_url(repo, WebKind::Issue, &issue.number.to_string()))
            }
            Tab::PullRequests => {
                let pr = self.prs.loaded()?.get(self.prs.cursor)?;
                Some(forge.web_url(repo, WebKind::PullRequest, &pr.number.to_string()))
            }
            Tab::ReviewQueue => {
                let entry = self.queue.loaded()?.entries().get(self.queue.cursor)?;
                Some(forge.web_url(repo, WebKind::PullRequest, &entry.item.number.to_string()))
            }
            Tab::Commits => {
                let commit = self.commits.loaded()?.get(self.commits.cursor)?;
                Some(forge.web_url(repo, WebKind::Commit, &commit.sha))
            }
            Tab::Metrics => {
                let stats = self.metrics.loaded()?.repos.get(self.metrics.cursor)?;
                Some(forge.web_url(&stats.repo, WebKind::Repo, ""))
            }
        }
    }

    /// Launch the primary fetch for `tab` unless one is already running.
    fn load_tab(&mut self, tab: Tab) {
        let tx = &self.action_tx;
        let forge = Arc::clone(&self.forge);
        let repo = self.repo.clone();

        match tab {
            Tab::Issues => {
                let Some(generation) = self.issues.begin_load() else {
                    return;
                };
                task::spawn(
                    tx,
                    async move { forge.list_issues(&repo).await },
                    move |result| Action::IssuesLoaded { generation, result },
                );
            }
            Tab::PullRequests => {
                let Some(generation) = self.prs.begin_load() else {
                    return;
                };
                task::spawn(
                    tx,
                    async move { forge.list_prs(&repo).await },
                    move |result| Action::PrsLoaded { generation, result },
                );
            }
            Tab::ReviewQueue => {
                // dropping the loaded pipeline discards its outstanding fetch
                let Some(generation) = self.queue.begin_load() else {
                    return;
                };
                task::spawn(
                    tx,
                    async move { forge.list_prs(&repo).await },
                    move |result| Action::QueueLoaded { generation, result },
                );
            }
            Tab::Commits => {
                let Some(generation) = self.commits.begin_load() else {
                    return;
                };
                task::spawn(
                    tx,
                    async move { forge.list_commits(&repo).await },
                    move |result| Action::CommitsLoaded { generation, result },
                );
            }
            Tab::Metrics => {
                let Some(generation) = self.metrics.begin_load() else {
                    return;
                };
                let repos = self.metrics_repos.clone();
                let listener = task::spawn_with_progress(
                    tx,
                    move |reporter| async move {
                        metrics::scan(forge.as_ref(), &repos, &reporter).await
                    },
                    move |result| Action::MetricsLoaded { generation, result },
                );
                listener.listen(tx, move |snapshot, listener| Action::MetricsProgress {
                    generation,
                    snapshot,
                    listener,
                });
            }
        }
        tracing::debug!(tab = tab.title(), "loading");
    }

    /// Issue the next review fetch of the queue, if any.
    fn advance_queue(&mut self) {
        let Some(queue) = self.queue.loaded_mut() else {
            return;
        };
        let Some(request) = queue.issue() else {
            if queue.is_complete() {
                tracing::debug!(entries = queue.len(), "review queue complete");
            }
            return;
        };
        let generation = request.generation;
        let index = request.index;
        let number = request.item.number;
        let created_at = request.item.created_at;

        let forge = Arc::clone(&self.forge);
        let repo = self.repo.clone();
        task::spawn(
            &self.action_tx,
            async move {
                let reviews = forge.get_pr_reviews(&repo, number).await?;
                Ok(ReviewSummary::derive(created_at, &reviews))
            },
            move |result| Action::ReviewsLoaded {
                generation,
                index,
                result,
            },
        );
    }

    fn open_diff(&mut self, target: DiffTarget) {
        let generation = self.diff.restart();
        self.diff.clear_anchor();
        self.diff_target = Some(target.clone());
        self.view = View::Diff;
        self.spawn_diff(generation, target);
    }

    fn reload_diff(&mut self) {
        let Some(target) = self.diff_target.clone() else {
            return;
        };
        if let Some(generation) = self.diff.begin_load() {
            self.spawn_diff(generation, target);
        }
    }

    fn spawn_diff(&self, generation: u64, target: DiffTarget) {
        let forge = Arc::clone(&self.forge);
        let repo = self.repo.clone();
        task::spawn(
            &self.action_tx,
            async move {
                let (title, text) = match &target {
                    DiffTarget::PullRequest(number) => (
                        format!("PR #{}", number),
                        forge.get_pr_diff(&repo, *number).await?,
                    ),
                    DiffTarget::Commit(sha) => (
                        format!("Commit {}", &sha[..7.min(sha.len())]),
                        forge.get_commit_diff(&repo, sha).await?,
                    ),
                };
                Ok(DiffDocument::from_text(title, &text))
            },
            move |result| Action::DiffLoaded { generation, result },
        );
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), DashError> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())?;
    Ok(())
}
