use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use worldsync_common::{EntityId, Position};

use crate::mob::{Mob, MobKind, Npc, Player};

/// Default number of mob indices. Index 0 is never handed out.
pub const DEFAULT_CAPACITY: u16 = 2047;

/// Errors from world repository operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("world is full: all {capacity} mob indices are in use")]
    Full { capacity: u16 },
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
}

/// The authoritative mob repository.
///
/// Every tick the synchronizer reads it through a shared reference, so the view
/// a task sees is stable for the whole scan. Mutation happens between ticks.
///
/// Uses BTreeMap for deterministic iteration order across all platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    mobs: BTreeMap<EntityId, Mob>,
    capacity: u16,
    /// Registrations handed out so far.
    registrations: u64,
    tick: u64,
    /// Seed for deterministic RNG. Advanced each step for reproducibility.
    seed: u64,
}

impl Default for World {
    fn default() -> Self {
        Self {
            mobs: BTreeMap::new(),
            capacity: DEFAULT_CAPACITY,
            registrations: 0,
            tick: 0,
            seed: 0,
        }
    }
}

impl World {
    /// Create an empty world at tick 0 with seed 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world with a specific seed for deterministic runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Create a world with a reduced index space.
    pub fn with_capacity(capacity: u16) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of registered mobs, active or not.
    pub fn mob_count(&self) -> usize {
        self.mobs.len()
    }

    /// Read-only access to all mobs (BTreeMap for deterministic iteration).
    pub fn mobs(&self) -> &BTreeMap<EntityId, Mob> {
        &self.mobs
    }

    /// Mobs that may currently be seen by anyone, in index order.
    pub fn active_mobs(&self) -> impl Iterator<Item = &Mob> {
        self.mobs.values().filter(|m| m.active)
    }

    /// Indices of all active players, in index order.
    pub fn player_ids(&self) -> Vec<EntityId> {
        self.active_mobs()
            .filter(|m| m.is_player())
            .map(|m| m.id)
            .collect()
    }

    pub fn get(&self, id: EntityId) -> Option<&Mob> {
        self.mobs.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Mob> {
        self.mobs.get_mut(&id)
    }

    /// Mutable access to every mob, for between-tick phases.
    pub fn mobs_mut(&mut self) -> impl Iterator<Item = &mut Mob> {
        self.mobs.values_mut()
    }

    /// Register a player at `position`. The client map is anchored there.
    pub fn spawn_player(
        &mut self,
        mut player: Player,
        position: Position,
    ) -> Result<EntityId, WorldError> {
        player.last_known_region = position;
        player.region_changed = true;
        self.register(position, MobKind::Player(player))
    }

    /// Register a non-player character at `position`.
    pub fn spawn_npc(&mut self, npc: Npc, position: Position) -> Result<EntityId, WorldError> {
        self.register(position, MobKind::Npc(npc))
    }

    fn register(&mut self, position: Position, kind: MobKind) -> Result<EntityId, WorldError> {
        let id = (1..=self.capacity)
            .map(EntityId)
            .find(|id| !self.mobs.contains_key(id))
            .ok_or(WorldError::Full {
                capacity: self.capacity,
            })?;
        self.registrations += 1;
        let registration = self.registrations;
        tracing::debug!(%id, registration, %position, "mob registered");
        self.mobs.insert(id, Mob::new(id, registration, position, kind));
        Ok(id)
    }

    /// Mark a mob inactive. It stays registered so observers can evict it.
    pub fn deactivate(&mut self, id: EntityId) -> Result<(), WorldError> {
        let mob = self
            .mobs
            .get_mut(&id)
            .ok_or(WorldError::UnknownEntity(id))?;
        mob.active = false;
        Ok(())
    }

    /// Remove a mob, freeing its index. Returns the mob if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Mob> {
        let mob = self.mobs.remove(&id);
        if mob.is_some() {
            tracing::debug!(%id, "mob unregistered");
        }
        mob
    }

    /// Advance the world by one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        self.seed = splitmix64(self.seed);
    }

    /// Deterministic pseudo-random value for `salt` at the current seed.
    pub fn random(&self, salt: u64) -> u64 {
        splitmix64(self.seed ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

/// Splitmix64 ... a fast, high-quality deterministic PRNG step function.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
