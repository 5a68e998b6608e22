//! Scheduler for managing the crawl frontier and per-host politeness
//!
//! This module handles:
//! - Priority queue of admitted work items (shallowest first)
//! - Global concurrency limiting via a semaphore
//! - Per-host in-flight caps and minimum dispatch spacing
//! - The Discovered -> Admitted -> Dispatched -> Completed lifecycle

use crate::state::{HostPolicy, HostState, WorkState};
use crate::url::netloc;
use crate::CrawlError;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

/// A canonical URL together with its link distance from a seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Canonical URL to fetch
    pub url: Url,

    /// Number of link hops from the seed (seeds are 0)
    pub depth: u32,
}

impl WorkItem {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }

    /// The `host[:port]` this item counts against for politeness
    pub fn host(&self) -> String {
        netloc(&self.url).unwrap_or_default().to_string()
    }
}

/// A work item waiting in the frontier
#[derive(Debug)]
struct Queued {
    item: WorkItem,
    host: String,
    seq: u64,
}

// BinaryHeap is a max-heap: reverse the comparison so the shallowest,
// earliest-admitted item is popped first.
impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .item
            .depth
            .cmp(&self.item.depth)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Queued {}

/// A dispatched work item holding its global concurrency permit
///
/// The permit is released when this value (or the task owning it) is dropped.
pub struct ScheduledFetch {
    /// The item to fetch
    pub item: WorkItem,

    /// Host key used for per-host accounting
    pub host: String,

    /// The semaphore permit for this fetch
    pub _permit: OwnedSemaphorePermit,
}

/// Result of asking the scheduler for more work
pub enum NextDispatch {
    /// An item is ready to fetch now
    Ready(ScheduledFetch),

    /// Nothing is ready; the earliest host opens after this delay
    Wait(Duration),

    /// Nothing can move until an in-flight fetch completes
    Blocked,

    /// The frontier is empty
    Empty,
}

/// Scheduler manages the frontier queue and per-host limits
///
/// The scheduler coordinates:
/// - Global concurrency (permits held by in-flight fetches)
/// - Per-host concurrency (dispatched-but-incomplete items per host)
/// - Per-host spacing (minimum time between dispatches)
/// - The lifecycle state of every item it has seen
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    global_semaphore: Arc<Semaphore>,

    /// Admitted items not yet dispatched
    frontier: BinaryHeap<Queued>,

    /// Per-host state tracking
    hosts: HashMap<String, HostState>,

    /// Lifecycle state keyed by canonical URL
    states: HashMap<String, WorkState>,

    /// Items dispatched and not yet completed
    dispatched: usize,

    /// Per-host limits
    policy: HostPolicy,

    /// Admission counter for FIFO order within a depth
    seq: u64,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `policy` - Per-host in-flight cap and dispatch spacing
    /// * `global_concurrency` - Maximum fetches in flight across all hosts
    pub fn new(policy: HostPolicy, global_concurrency: usize) -> Self {
        Self {
            global_semaphore: Arc::new(Semaphore::new(global_concurrency.max(1))),
            frontier: BinaryHeap::new(),
            hosts: HashMap::new(),
            states: HashMap::new(),
            dispatched: 0,
            policy,
            seq: 0,
        }
    }

    /// Queues a discovered item
    ///
    /// A URL the scheduler has no entry for is `Discovered`: it won the
    /// visited-set check and nothing else. Returns
    /// `CrawlError::InvalidTransition` if the URL was already admitted in
    /// this crawl; the visited set should make that impossible.
    pub fn admit(&mut self, item: WorkItem) -> Result<(), CrawlError> {
        let key = item.url.as_str().to_string();
        let from = self.state(&key);
        if !from.can_transition_to(WorkState::Admitted) {
            return Err(CrawlError::InvalidTransition {
                url: key,
                from,
                to: WorkState::Admitted,
            });
        }

        self.states.insert(key, WorkState::Admitted);

        let host = item.host();
        self.seq += 1;
        tracing::trace!("Admitted {} at depth {}", item.url, item.depth);
        self.frontier.push(Queued {
            item,
            host,
            seq: self.seq,
        });
        Ok(())
    }

    /// Hands out the next item whose host can accept a request at `now`
    ///
    /// Items are popped in priority order; those whose host is capped or
    /// still inside its delay window are put back.
    pub fn poll_dispatch(&mut self, now: Instant) -> NextDispatch {
        if self.frontier.is_empty() {
            return NextDispatch::Empty;
        }

        let permit = match self.global_semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::trace!("Global concurrency limit reached");
                return NextDispatch::Blocked;
            }
        };

        let mut not_ready = Vec::new();
        let mut found = None;
        let mut min_wait: Option<Duration> = None;

        while let Some(queued) = self.frontier.pop() {
            let state = self.hosts.entry(queued.host.clone()).or_default();

            if state.can_dispatch(&self.policy, now) {
                found = Some(queued);
                break;
            }

            // A capped host only opens on completion, not with time.
            if state.in_flight < self.policy.max_in_flight {
                if let Some(wait) = state.time_until_next_dispatch(&self.policy, now) {
                    min_wait = Some(min_wait.map_or(wait, |m| m.min(wait)));
                }
            }
            tracing::trace!(
                "Host {} not ready for {} (in flight: {})",
                queued.host,
                queued.item.url,
                state.in_flight
            );
            not_ready.push(queued);
        }

        for queued in not_ready {
            self.frontier.push(queued);
        }

        match found {
            Some(queued) => {
                if let Some(state) = self.hosts.get_mut(&queued.host) {
                    state.record_dispatch(now);
                }
                self.states
                    .insert(queued.item.url.as_str().to_string(), WorkState::Dispatched);
                self.dispatched += 1;
                tracing::debug!("Dispatching {} (depth {})", queued.item.url, queued.item.depth);
                NextDispatch::Ready(ScheduledFetch {
                    item: queued.item,
                    host: queued.host,
                    _permit: permit,
                })
            }
            None => match min_wait {
                Some(wait) => NextDispatch::Wait(wait),
                None => NextDispatch::Blocked,
            },
        }
    }

    /// Marks a dispatched item as completed and frees its host slot
    pub fn complete(&mut self, url: &str, host: &str) -> Result<(), CrawlError> {
        let from = self.state(url);
        if !from.can_transition_to(WorkState::Completed) {
            return Err(CrawlError::InvalidTransition {
                url: url.to_string(),
                from,
                to: WorkState::Completed,
            });
        }

        self.states.insert(url.to_string(), WorkState::Completed);
        self.dispatched -= 1;
        if let Some(state) = self.hosts.get_mut(host) {
            state.record_completion();
        }
        Ok(())
    }

    /// Returns the number of items waiting in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns the number of dispatched items not yet completed
    pub fn in_flight(&self) -> usize {
        self.dispatched
    }

    /// Returns true when no item is admitted or dispatched
    pub fn is_drained(&self) -> bool {
        self.frontier.is_empty() && self.dispatched == 0
    }

    fn state(&self, url: &str) -> WorkState {
        self.states.get(url).copied().unwrap_or(WorkState::Discovered)
    }
}
