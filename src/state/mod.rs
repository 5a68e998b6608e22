//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `WorkState`: Lifecycle of a single work item (discovered, admitted, dispatched, completed)
//! - `HostState`: Per-host in-flight count and dispatch timing for politeness
//! - `HostPolicy`: The per-host limits `HostState` is checked against

mod host_state;
mod work_state;

// Re-export main types
pub use host_state::{HostPolicy, HostState};
pub use work_state::WorkState;
