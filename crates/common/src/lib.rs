//! Shared types: entity identifiers, tile positions, movement deltas, privileges.
//!
//! # Invariants
//! - `EntityId` is the wire index of a mob; it is unique while the mob is registered.
//! - Distance checks never consider two different height planes to be near.

pub mod position;
pub mod types;

pub use position::Position;
pub use types::{Direction, Directions, EntityId, PrivilegeLevel};
