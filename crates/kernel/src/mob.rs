use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use worldsync_common::position::MAX_DISTANCE;
use worldsync_common::{Direction, Directions, EntityId, Position, PrivilegeLevel};

use crate::block::{Appearance, SynchronizationBlock, SynchronizationBlockSet};

/// A player or non-player character registered in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mob {
    pub id: EntityId,
    /// Distinguishes successive mobs that were handed the same index.
    registration: u64,
    pub position: Position,
    /// Cleared while the mob is being unregistered; inactive mobs leave every view.
    pub active: bool,
    /// Set for the tick in which the mob was placed rather than walked.
    pub teleporting: bool,
    /// Steps taken this tick.
    pub directions: Directions,
    block_set: Arc<SynchronizationBlockSet>,
    pub kind: MobKind,
}

/// Capabilities that differ between players and non-player characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MobKind {
    Player(Player),
    Npc(Npc),
}

/// Player-only state: identity, social lists and the synchronization bookkeeping
/// the client relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub username: String,
    pub privilege: PrivilegeLevel,
    pub combat_level: u8,
    pub appearance: Appearance,
    pub friends: BTreeSet<String>,
    pub ignores: BTreeSet<String>,
    /// The mob this player is currently interacting with.
    pub interacting: Option<EntityId>,
    /// Position the client's map was last loaded around.
    pub last_known_region: Position,
    pub region_changed: bool,
    viewing_distance: i32,
    excessive_players: bool,
}

/// Non-player character state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    pub type_id: u16,
}

impl Player {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            privilege: PrivilegeLevel::Standard,
            combat_level: 3,
            appearance: Appearance::default(),
            friends: BTreeSet::new(),
            ignores: BTreeSet::new(),
            interacting: None,
            last_known_region: Position::default(),
            region_changed: false,
            viewing_distance: MAX_DISTANCE,
            excessive_players: false,
        }
    }

    pub fn with_privilege(mut self, privilege: PrivilegeLevel) -> Self {
        self.privilege = privilege;
        self
    }

    pub fn is_friend(&self, username: &str) -> bool {
        self.friends.contains(username)
    }

    pub fn is_ignored(&self, username: &str) -> bool {
        self.ignores.contains(username)
    }

    /// Radius, in tiles, within which other mobs are shown to this player.
    pub fn viewing_distance(&self) -> i32 {
        self.viewing_distance
    }

    /// Shrink the viewing distance by one tile, never below one.
    pub fn decrement_viewing_distance(&mut self) {
        if self.viewing_distance > 1 {
            self.viewing_distance -= 1;
        }
    }

    /// Grow the viewing distance by one tile, never beyond `limit`.
    pub fn increment_viewing_distance(&mut self, limit: i32) {
        if self.viewing_distance < limit {
            self.viewing_distance += 1;
        }
    }

    pub fn reset_viewing_distance(&mut self, distance: i32) {
        self.viewing_distance = distance.clamp(1, MAX_DISTANCE);
    }

    /// Record that the local view hit its capacity ceiling this tick.
    pub fn flag_excessive_players(&mut self) {
        self.excessive_players = true;
    }

    pub fn excessive_players(&self) -> bool {
        self.excessive_players
    }

    pub fn reset_excessive_players(&mut self) {
        self.excessive_players = false;
    }
}

impl Mob {
    pub(crate) fn new(
        id: EntityId,
        registration: u64,
        position: Position,
        kind: MobKind,
    ) -> Self {
        Self {
            id,
            registration,
            position,
            active: true,
            teleporting: true,
            directions: Directions::NONE,
            block_set: Arc::new(SynchronizationBlockSet::new()),
            kind,
        }
    }

    /// World-unique serial of this registration. Never reused, unlike `id`.
    pub fn registration(&self) -> u64 {
        self.registration
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            MobKind::Player(p) => Some(p),
            MobKind::Npc(_) => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            MobKind::Player(p) => Some(p),
            MobKind::Npc(_) => None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, MobKind::Player(_))
    }

    /// The canonical pending block set. Cloning the `Arc` is cheap; use
    /// `Arc::make_mut` on the clone to derive a modified copy.
    pub fn block_set(&self) -> &Arc<SynchronizationBlockSet> {
        &self.block_set
    }

    /// Queue a block for this tick.
    pub fn add_block(&mut self, block: SynchronizationBlock) {
        Arc::make_mut(&mut self.block_set).add(block);
    }

    /// Take up to two steps. The second is ignored unless the first moves.
    pub fn walk(&mut self, directions: Directions) {
        if !directions.is_moving() {
            return;
        }
        self.position = self.position.step(directions.first);
        self.position = self.position.step(directions.second);
        self.directions = directions;
    }

    pub fn walk_one(&mut self, direction: Direction) {
        self.walk(Directions::walking(direction));
    }

    /// Place the mob at `destination` without walking there.
    pub fn teleport(&mut self, destination: Position) {
        self.position = destination;
        self.directions = Directions::NONE;
        self.teleporting = true;
    }

    /// Clear per-tick transient state once every observer has been synchronized.
    pub fn reset(&mut self) {
        self.teleporting = false;
        self.directions = Directions::NONE;
        if !self.block_set.is_empty() {
            self.block_set = Arc::new(SynchronizationBlockSet::new());
        }
        if let MobKind::Player(player) = &mut self.kind {
            player.region_changed = false;
        }
    }
}
