//! View synchronization: per-tick local views, admission priority, delta segments.
//!
//! # Invariants
//! - A local view never exceeds its configured capacity (at most 255) and never
//!   holds the same mob twice.
//! - Existing-member segments mirror the pre-eviction view order slot for slot;
//!   additions always follow them.
//! - A mob evicted in a tick is not re-admitted in that same tick.
//! - Synchronization never mutates a mob's canonical block set.

mod config;
mod message;
mod priority;
mod segment;
mod synchronizer;
mod task;
mod timer;
mod transport;
mod view;

pub use config::{ConfigError, SyncConfig};
pub use message::PlayerSynchronizationMessage;
pub use priority::{
    DEFAULT_PRIORITY, DefaultPriorityProvider, FRIEND_PRIORITY, IGNORED_PRIORITY,
    INTERACTING_PRIORITY, Priority, PriorityProvider, STAFF_PRIORITY,
};
pub use segment::{SegmentType, SynchronizationSegment};
pub use synchronizer::{ClientSynchronizer, TickReport};
pub use task::{PlayerSynchronizationTask, SyncOutcome, SyncStats};
pub use timer::TickTimer;
pub use transport::{ChannelSink, MessageSink};
pub use view::LocalView;

pub fn crate_info() -> &'static str {
    "worldsync-sync v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("sync"));
    }
}
