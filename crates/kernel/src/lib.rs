//! World Kernel: the authoritative mob repository and per-mob pending state.
//!
//! # Invariants
//! - Mob indices are unique among registered mobs and reused after removal.
//! - Iteration order is deterministic (BTreeMap by index).
//! - A mob's block set is only replaced, never mutated in place while shared.

pub mod block;
pub mod mob;
pub mod world;

pub use block::{Appearance, BlockKind, SynchronizationBlock, SynchronizationBlockSet};
pub use mob::{Mob, MobKind, Npc, Player};
pub use world::{World, WorldError};
