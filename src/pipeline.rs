//! Sequential per-item enrichment of a loaded list.
//!
//! A [`Pipeline`] owns the rows of a primary fetch and walks them in order,
//! handing out one dependent request at a time. The caller launches the
//! request, then feeds the outcome back through [`Pipeline::resolve`] before
//! asking for the next one.

use crate::error::FetchResult;

/// Dependent-fetch outcome for one row
#[derive(Debug, Clone, PartialEq)]
pub enum EntryState<D> {
    Pending,
    Loaded(D),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Entry<P, D> {
    pub item: P,
    pub state: EntryState<D>,
}

impl<P, D> Entry<P, D> {
    pub fn detail(&self) -> Option<&D> {
        match &self.state {
            EntryState::Loaded(d) => Some(d),
            _ => None,
        }
    }
}

/// A dependent fetch the caller should launch now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a, P> {
    pub generation: u64,
    pub index: usize,
    pub item: &'a P,
}

#[derive(Debug, Clone)]
pub struct Pipeline<P, D> {
    entries: Vec<Entry<P, D>>,
    cursor: usize,
    in_flight: bool,
    generation: u64,
}

impl<P, D> Pipeline<P, D> {
    pub fn new(items: Vec<P>, generation: u64) -> Self {
        Self {
            entries: items
                .into_iter()
                .map(|item| Entry {
                    item,
                    state: EntryState::Pending,
                })
                .collect(),
            cursor: 0,
            in_flight: false,
            generation,
        }
    }

    pub fn entries(&self) -> &[Entry<P, D>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the next entry whose fetch has not been issued or resolved.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    /// `(resolved, total)`
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.entries.len())
    }

    /// Claim the next request. Returns `None` while one is outstanding or
    /// once every entry has resolved.
    pub fn issue(&mut self) -> Option<Request<'_, P>> {
        if self.in_flight || self.is_complete() {
            return None;
        }
        self.in_flight = true;
        Some(Request {
            generation: self.generation,
            index: self.cursor,
            item: &self.entries[self.cursor].item,
        })
    }

    /// Record the outcome of the outstanding request and advance.
    ///
    /// Returns `false` and changes nothing when the message does not belong to
    /// the outstanding request of this pipeline.
    pub fn resolve(&mut self, generation: u64, index: usize, result: FetchResult<D>) -> bool {
        if generation != self.generation || !self.in_flight || index != self.cursor {
            tracing::debug!(
                generation,
                index,
                current = self.generation,
                cursor = self.cursor,
                "discarding stale dependent fetch"
            );
            return false;
        }
        self.entries[index].state = match result {
            Ok(detail) => EntryState::Loaded(detail),
            Err(e) => EntryState::Failed(e),
        };
        self.cursor += 1;
        self.in_flight = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(pipeline: &mut Pipeline<&'static str, usize>, fail: Option<usize>) -> Vec<usize> {
        let mut issued = Vec::new();
        while let Some(req) = pipeline.issue() {
            let (generation, index, len) = (req.generation, req.index, req.item.len());
            issued.push(index);
            // no second request while this one is outstanding
            assert!(pipeline.issue().is_none());
            let result = if fail == Some(index) {
                Err("boom".to_string())
            } else {
                Ok(len)
            };
            assert!(pipeline.resolve(generation, index, result));
        }
        issued
    }

    #[test]
    fn empty_pipeline_is_complete() {
        let mut pipeline: Pipeline<&str, usize> = Pipeline::new(vec![], 1);
        assert!(pipeline.is_complete());
        assert!(pipeline.issue().is_none());
    }

    #[test]
    fn issues_each_entry_in_order() {
        let mut pipeline = Pipeline::new(vec!["a", "bb", "ccc"], 4);
        assert_eq!(pipeline.cursor(), 0);
        assert_eq!(drive(&mut pipeline, None), vec![0, 1, 2]);
        assert_eq!(pipeline.cursor(), 3);
        assert!(pipeline.is_complete());
        let details: Vec<_> = pipeline.entries().iter().map(|e| e.detail().copied()).collect();
        assert_eq!(details, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn failure_is_isolated_to_its_entry() {
        let mut pipeline = Pipeline::new(vec!["a", "bb", "ccc", "dddd"], 1);
        assert_eq!(drive(&mut pipeline, Some(1)), vec![0, 1, 2, 3]);
        let entries = pipeline.entries();
        assert_eq!(entries[1].state, EntryState::Failed("boom".to_string()));
        assert_eq!(entries[2].state, EntryState::Loaded(3));
        assert_eq!(entries[3].state, EntryState::Loaded(4));
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut pipeline: Pipeline<&str, usize> = Pipeline::new(vec!["a", "b"], 2);
        let req = pipeline.issue().unwrap();
        assert_eq!((req.generation, req.index), (2, 0));
        assert!(!pipeline.resolve(1, 0, Ok(9)));
        assert_eq!(pipeline.entries()[0].state, EntryState::Pending);
        assert!(pipeline.in_flight());
        assert!(pipeline.resolve(2, 0, Ok(9)));
    }

    #[test]
    fn unexpected_index_is_discarded() {
        let mut pipeline: Pipeline<&str, usize> = Pipeline::new(vec!["a", "b"], 2);
        // nothing outstanding yet
        assert!(!pipeline.resolve(2, 0, Ok(1)));
        pipeline.issue();
        assert!(!pipeline.resolve(2, 1, Ok(1)));
        assert!(pipeline.resolve(2, 0, Ok(1)));
        // resolving the same index twice is ignored
        assert!(!pipeline.resolve(2, 0, Ok(1)));
        assert_eq!(pipeline.progress(), (1, 2));
    }
}
