//! Visited set: the crawl's only deduplication mechanism

use std::collections::HashSet;
use std::sync::Mutex;

/// Set of canonical URLs already scheduled or completed in one crawl run
///
/// Grows monotonically and is shared by reference between the coordinator
/// and all fetch workers. Every enqueue decision goes through [`try_mark`],
/// which checks and inserts under a single lock.
///
/// [`try_mark`]: VisitedSet::try_mark
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as visited
    ///
    /// Returns true iff this call performed the insertion, i.e. the URL had
    /// never been marked before in this crawl.
    pub fn try_mark(&self, url: &str) -> bool {
        let mut urls = self.urls.lock().unwrap_or_else(|e| e.into_inner());
        urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        let urls = self.urls.lock().unwrap_or_else(|e| e.into_inner());
        urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
