use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use worldsync_common::{EntityId, Position, PrivilegeLevel};

use crate::mob::Player;

/// Discriminant of a pending state block. A set holds at most one block per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockKind {
    Appearance,
    Chat,
    ForceChat,
    Animation,
    Graphic,
    InteractingMob,
    TurnToPosition,
}

/// How a player looks: body style and colours as the client indexes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub female: bool,
    pub style: [u8; 7],
    pub colors: [u8; 5],
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            female: false,
            style: [0, 10, 18, 26, 33, 36, 42],
            colors: [0; 5],
        }
    }
}

/// One pending state descriptor for a mob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SynchronizationBlock {
    Appearance {
        name: String,
        combat_level: u8,
        appearance: Appearance,
    },
    Chat {
        text: String,
        color: u8,
        effects: u8,
        privilege: PrivilegeLevel,
    },
    ForceChat(String),
    Animation {
        id: u16,
        delay: u8,
    },
    Graphic {
        id: u16,
        height: u16,
        delay: u16,
    },
    InteractingMob(Option<EntityId>),
    TurnToPosition(Position),
}

impl SynchronizationBlock {
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Appearance { .. } => BlockKind::Appearance,
            Self::Chat { .. } => BlockKind::Chat,
            Self::ForceChat(_) => BlockKind::ForceChat,
            Self::Animation { .. } => BlockKind::Animation,
            Self::Graphic { .. } => BlockKind::Graphic,
            Self::InteractingMob(_) => BlockKind::InteractingMob,
            Self::TurnToPosition(_) => BlockKind::TurnToPosition,
        }
    }

    /// Appearance block describing `player` as it currently looks.
    pub fn appearance_of(player: &Player) -> Self {
        Self::Appearance {
            name: player.username.clone(),
            combat_level: player.combat_level,
            appearance: player.appearance.clone(),
        }
    }

    /// Public chat spoken by `player`.
    pub fn chat(player: &Player, text: impl Into<String>) -> Self {
        Self::Chat {
            text: text.into(),
            color: 0,
            effects: 0,
            privilege: player.privilege,
        }
    }
}

/// The set of blocks a mob has pending for the current tick.
///
/// Mobs share their set behind an `Arc`; observer-specific variants are made
/// with `Arc::make_mut` so the canonical set is never touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynchronizationBlockSet {
    blocks: BTreeMap<BlockKind, SynchronizationBlock>,
}

impl SynchronizationBlockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block, replacing any block of the same kind.
    pub fn add(&mut self, block: SynchronizationBlock) {
        self.blocks.insert(block.kind(), block);
    }

    pub fn contains(&self, kind: BlockKind) -> bool {
        self.blocks.contains_key(&kind)
    }

    pub fn remove(&mut self, kind: BlockKind) -> Option<SynchronizationBlock> {
        self.blocks.remove(&kind)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn add_replaces_same_kind() {
        let mut set = SynchronizationBlockSet::new();
        set.add(SynchronizationBlock::ForceChat("a".into()));
        set.add(SynchronizationBlock::ForceChat("b".into()));
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.remove(BlockKind::ForceChat),
            Some(SynchronizationBlock::ForceChat("b".into()))
        );
    }

    #[test]
    fn remove_and_contains() {
        let mut set = SynchronizationBlockSet::new();
        set.add(SynchronizationBlock::Animation { id: 866, delay: 0 });
        assert!(set.contains(BlockKind::Animation));
        assert!(set.remove(BlockKind::Animation).is_some());
        assert!(!set.contains(BlockKind::Animation));
        assert!(set.is_empty());
    }

    #[test]
    fn make_mut_leaves_shared_original_untouched() {
        let mut set = SynchronizationBlockSet::new();
        set.add(SynchronizationBlock::ForceChat("hi".into()));
        let canonical = Arc::new(set);

        let mut copy = Arc::clone(&canonical);
        Arc::make_mut(&mut copy).remove(BlockKind::ForceChat);

        assert!(canonical.contains(BlockKind::ForceChat));
        assert!(!copy.contains(BlockKind::ForceChat));
    }

}
