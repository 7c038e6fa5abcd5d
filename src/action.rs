use crate::diff::DiffDocument;
use crate::error::{DashError, FetchResult};
use crate::task::ProgressListener;
use crate::types::{Commit, Issue, Metrics, PrSummary, Progress, ReviewSummary};

/// Top-level tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Issues,
    PullRequests,
    ReviewQueue,
    Commits,
    Metrics,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Issues,
        Tab::PullRequests,
        Tab::ReviewQueue,
        Tab::Commits,
        Tab::Metrics,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Issues => "Issues",
            Tab::PullRequests => "Pull Requests",
            Tab::ReviewQueue => "Review Queue",
            Tab::Commits => "Commits",
            Tab::Metrics => "Metrics",
        }
    }

    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(&self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Cursor movement intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

/// What the diff screen is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    PullRequest(u64),
    Commit(String),
}

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Back,
    Navigate(Nav),
    Select,
    Refresh,
    SwitchTab(Tab),
    NextTab,
    PrevTab,
    NextFile,
    PrevFile,
    OpenInBrowser,
    YankUrl,
    Resize { width: u16, height: u16 },

    // Primary fetches
    IssuesLoaded {
        generation: u64,
        result: FetchResult<Vec<Issue>>,
    },
    PrsLoaded {
        generation: u64,
        result: FetchResult<Vec<PrSummary>>,
    },
    CommitsLoaded {
        generation: u64,
        result: FetchResult<Vec<Commit>>,
    },
    DiffLoaded {
        generation: u64,
        result: FetchResult<DiffDocument>,
    },

    // Review queue: primary list, then one review fetch per entry
    QueueLoaded {
        generation: u64,
        result: FetchResult<Vec<PrSummary>>,
    },
    ReviewsLoaded {
        generation: u64,
        index: usize,
        result: FetchResult<ReviewSummary>,
    },

    // Metrics scan
    MetricsProgress {
        generation: u64,
        snapshot: Progress,
        listener: ProgressListener,
    },
    MetricsLoaded {
        generation: u64,
        result: FetchResult<Metrics>,
    },

    Error(String),
    None,
}

impl From<DashError> for Action {
    fn from(err: DashError) -> Self {
        Action::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_cycle_both_ways() {
        assert_eq!(Tab::Issues.next(), Tab::PullRequests);
        assert_eq!(Tab::Metrics.next(), Tab::Issues);
        assert_eq!(Tab::Issues.prev(), Tab::Metrics);
        assert_eq!(Tab::ReviewQueue.prev(), Tab::PullRequests);
    }

    #[test]
    fn tab_index_matches_order() {
        for (i, tab) in Tab::ALL.iter().enumerate() {
            assert_eq!(tab.index(), i);
        }
    }
}
