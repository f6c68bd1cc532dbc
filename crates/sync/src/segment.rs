use serde::Serialize;
use std::sync::Arc;
use worldsync_common::{Directions, EntityId, Position};
use worldsync_kernel::SynchronizationBlockSet;

/// One delta operation for a single view slot, or for the observer itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SynchronizationSegment {
    /// The observer was placed rather than walked; only ever the observer's own segment.
    Teleport {
        blocks: Arc<SynchronizationBlockSet>,
        destination: Position,
    },
    /// Steps taken this tick (possibly none) plus pending blocks.
    Movement {
        blocks: Arc<SynchronizationBlockSet>,
        directions: Directions,
    },
    /// The slot's mob left the view.
    RemoveMob,
    /// A mob entered the view in a newly appended slot.
    AddMob {
        blocks: Arc<SynchronizationBlockSet>,
        id: EntityId,
        position: Position,
    },
}

/// Wire-level classification of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SegmentType {
    AddMob,
    RemoveMob,
    NoMovement,
    Walk,
    Run,
    Teleport,
}

impl SynchronizationSegment {
    pub fn segment_type(&self) -> SegmentType {
        match self {
            Self::Teleport { .. } => SegmentType::Teleport,
            Self::Movement { directions, .. } if directions.is_running() => SegmentType::Run,
            Self::Movement { directions, .. } if directions.is_moving() => SegmentType::Walk,
            Self::Movement { .. } => SegmentType::NoMovement,
            Self::RemoveMob => SegmentType::RemoveMob,
            Self::AddMob { .. } => SegmentType::AddMob,
        }
    }

    /// Blocks carried by this segment. Removals carry none.
    pub fn blocks(&self) -> Option<&SynchronizationBlockSet> {
        match self {
            Self::Teleport { blocks, .. }
            | Self::Movement { blocks, .. }
            | Self::AddMob { blocks, .. } => Some(blocks),
            Self::RemoveMob => None,
        }
    }
}
