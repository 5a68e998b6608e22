use std::time::{Duration, Instant};

/// Per-host politeness limits
#[derive(Debug, Clone, Copy)]
pub struct HostPolicy {
    /// Maximum dispatched-but-incomplete items for one host
    pub max_in_flight: u32,

    /// Minimum time between two dispatches to one host
    pub min_delay: Duration,
}

/// Tracks the state of a host during crawling
///
/// This structure maintains the per-host information needed to bound
/// concurrency and space out requests to a single origin.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of dispatched items not yet completed
    pub in_flight: u32,

    /// Timestamp of the last dispatch to this host
    pub last_dispatch: Option<Instant>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if an item can be dispatched to this host
    ///
    /// This method enforces:
    /// - The per-host in-flight limit
    /// - The minimum delay since the previous dispatch
    pub fn can_dispatch(&self, policy: &HostPolicy, now: Instant) -> bool {
        if self.in_flight >= policy.max_in_flight {
            return false;
        }

        self.time_until_next_dispatch(policy, now).is_none()
    }

    /// Calculates the time until the delay window opens
    ///
    /// Returns None if the delay has already elapsed. The in-flight limit is
    /// not time based and is not reflected here.
    pub fn time_until_next_dispatch(&self, policy: &HostPolicy, now: Instant) -> Option<Duration> {
        let last = self.last_dispatch?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < policy.min_delay {
            Some(policy.min_delay - elapsed)
        } else {
            None
        }
    }

    /// Records that an item was dispatched to this host
    pub fn record_dispatch(&mut self, now: Instant) {
        self.in_flight += 1;
        self.last_dispatch = Some(now);
    }

    /// Records that a dispatched item completed
    pub fn record_completion(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Returns true if nothing is in flight for this host
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }
}
