use serde::Serialize;
use worldsync_common::Position;

use crate::segment::{SegmentType, SynchronizationSegment};

/// Everything one observer's client needs to update its view for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSynchronizationMessage {
    pub last_known_region: Position,
    pub position: Position,
    pub region_changed: bool,
    /// The observer's own teleport or movement.
    pub segment: SynchronizationSegment,
    /// Size of the local view before this tick's evictions.
    pub local_mobs: usize,
    /// One segment per pre-eviction view slot, in slot order, then one `AddMob` per admission.
    pub segments: Vec<SynchronizationSegment>,
}

impl PlayerSynchronizationMessage {
    fn count(&self, kind: SegmentType) -> usize {
        self.segments
            .iter()
            .filter(|s| s.segment_type() == kind)
            .count()
    }

    pub fn added(&self) -> usize {
        self.count(SegmentType::AddMob)
    }

    pub fn removed(&self) -> usize {
        self.count(SegmentType::RemoveMob)
    }
}
