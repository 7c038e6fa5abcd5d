//! Per-screen load state.
//!
//! Every tab owns a [`Screen`]. Launching a primary fetch bumps the screen's
//! generation; results and progress carry the generation they were launched
//! under and are dropped if a newer load has started since.

use crate::action::Nav;
use crate::diff::DiffDocument;
use crate::error::FetchResult;
use crate::pipeline::{Entry, Pipeline};
use crate::types::{Commit, Issue, Metrics, Progress, PrSummary, RepoStats};

#[derive(Debug, Clone, Default)]
pub enum ScreenState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

/// Stable identity of a row, used to keep the selection across reloads
pub trait Keyed {
    fn key(&self) -> String;
}

impl Keyed for Issue {
    fn key(&self) -> String {
        self.number.to_string()
    }
}

impl Keyed for PrSummary {
    fn key(&self) -> String {
        self.number.to_string()
    }
}

impl Keyed for Commit {
    fn key(&self) -> String {
        self.sha.clone()
    }
}

impl Keyed for RepoStats {
    fn key(&self) -> String {
        self.repo.to_string()
    }
}

impl<P: Keyed, D> Keyed for Entry<P, D> {
    fn key(&self) -> String {
        self.item.key()
    }
}

/// Navigable payload of a screen
pub trait Rows {
    fn row_count(&self) -> usize;

    fn row_key(&self, _index: usize) -> Option<String> {
        None
    }
}

impl<T: Keyed> Rows for Vec<T> {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row_key(&self, index: usize) -> Option<String> {
        self.get(index).map(Keyed::key)
    }
}

impl<P: Keyed, D> Rows for Pipeline<P, D> {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row_key(&self, index: usize) -> Option<String> {
        self.entries().get(index).map(Keyed::key)
    }
}

impl Rows for Metrics {
    fn row_count(&self) -> usize {
        self.repos.len()
    }

    fn row_key(&self, index: usize) -> Option<String> {
        self.repos.get(index).map(Keyed::key)
    }
}

impl Rows for DiffDocument {
    fn row_count(&self) -> usize {
        DiffDocument::row_count(self)
    }
}

#[derive(Debug, Clone)]
pub struct Screen<T> {
    state: ScreenState<T>,
    generation: u64,
    progress: Option<Progress>,
    anchor: Option<String>,
    pub cursor: usize,
}

impl<T: Rows> Screen<T> {
    pub fn new() -> Self {
        Self {
            state: ScreenState::Idle,
            generation: 0,
            progress: None,
            anchor: None,
            cursor: 0,
        }
    }

    pub fn state(&self) -> &ScreenState<T> {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ScreenState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ScreenState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ScreenState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match &self.state {
            ScreenState::Loaded(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match &mut self.state {
            ScreenState::Loaded(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.loaded().map_or(0, Rows::row_count)
    }

    /// Start a primary fetch. Returns the generation to tag it with, or `None`
    /// if one is already running.
    pub fn begin_load(&mut self) -> Option<u64> {
        if self.is_loading() {
            return None;
        }
        Some(self.restart())
    }

    /// Start a primary fetch for a new target, superseding any load in flight.
    pub fn restart(&mut self) -> u64 {
        self.anchor = self
            .loaded()
            .and_then(|payload| payload.row_key(self.cursor));
        self.generation += 1;
        self.state = ScreenState::Loading;
        self.progress = None;
        self.generation
    }

    /// Forget the anchor so the next load starts at the top.
    pub fn clear_anchor(&mut self) {
        self.anchor = None;
        self.cursor = 0;
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Apply the outcome of the primary fetch. Returns `false` if it was stale.
    pub fn finish(&mut self, generation: u64, result: FetchResult<T>) -> bool {
        if !self.is_current(generation) || !self.is_loading() {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding stale result"
            );
            return false;
        }
        match result {
            Ok(payload) => {
                self.cursor = self
                    .anchor
                    .take()
                    .and_then(|key| {
                        (0..payload.row_count())
                            .find(|&i| payload.row_key(i).as_deref() == Some(key.as_str()))
                    })
                    .unwrap_or(0);
                self.state = ScreenState::Loaded(payload);
            }
            Err(e) => {
                self.anchor = None;
                self.cursor = 0;
                self.state = ScreenState::Failed(e);
            }
        }
        true
    }

    /// Store a progress snapshot for the current generation.
    pub fn record_progress(&mut self, generation: u64, progress: Progress) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.progress = Some(progress);
        true
    }

    pub fn navigate(&mut self, nav: Nav, page: usize) {
        self.cursor = step(self.cursor, self.row_count(), nav, page);
    }
}

/// Cursor position after one navigation step over `total` rows.
pub fn step(cursor: usize, total: usize, nav: Nav, page: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let last = total - 1;
    let page = page.max(1);
    match nav {
        Nav::Up => cursor.saturating_sub(1),
        Nav::Down => (cursor + 1).min(last),
        Nav::PageUp => cursor.saturating_sub(page),
        Nav::PageDown => (cursor + page).min(last),
        Nav::Top => 0,
        Nav::Bottom => last,
    }
    .min(last)
}
