/// Work item state definitions for tracking crawl progress
///
/// Every work item moves strictly forward through these states.
use std::fmt;

/// Represents the current state of a work item in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkState {
    /// Link passed the filters and won the visited-set check
    Discovered,

    /// Queued in the frontier, waiting for a host slot
    Admitted,

    /// Handed to a fetch worker
    Dispatched,

    /// Fetch finished and its record was emitted
    Completed,
}

impl WorkState {
    /// Returns the only state this one may move to
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Discovered => Some(Self::Admitted),
            Self::Admitted => Some(Self::Dispatched),
            Self::Dispatched => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Checks whether moving to `to` is a legal transition
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Admitted => "admitted",
            Self::Dispatched => "dispatched",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
