use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// Tiles per region edge.
pub const REGION_SIZE: i32 = 8;

/// Largest viewing distance a client can render, in tiles.
pub const MAX_DISTANCE: i32 = 15;

/// Regions between the top-left of the loaded map and its centre region.
const MAP_REGION_OFFSET: i32 = 6;

/// Local coordinates outside `[LOCAL_MIN, LOCAL_MAX)` force the client to load a new map.
const LOCAL_MIN: i32 = 16;
const LOCAL_MAX: i32 = 88;

/// A tile position on one height plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub tile: IVec2,
    pub height: u8,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self::with_height(x, y, 0)
    }

    pub fn with_height(x: i32, y: i32, height: u8) -> Self {
        Self {
            tile: IVec2::new(x, y),
            height,
        }
    }

    pub fn x(&self) -> i32 {
        self.tile.x
    }

    pub fn y(&self) -> i32 {
        self.tile.y
    }

    /// Whether `other` lies inside the square of half-width `distance` around
    /// this position, on the same height plane.
    pub fn is_within_distance(&self, other: &Position, distance: i32) -> bool {
        if self.height != other.height {
            return false;
        }
        let delta = (self.tile - other.tile).abs();
        delta.x <= distance && delta.y <= distance
    }

    /// Largest per-axis distance between the two tiles, ignoring height.
    pub fn longest_delta(&self, other: &Position) -> i32 {
        (self.tile - other.tile).abs().max_element()
    }

    /// The position one step away in `direction`.
    pub fn step(&self, direction: Direction) -> Position {
        Position {
            tile: self.tile + direction.delta(),
            height: self.height,
        }
    }

    /// Region coordinates containing this tile.
    pub fn region(&self) -> IVec2 {
        IVec2::new(
            self.tile.x.div_euclid(REGION_SIZE),
            self.tile.y.div_euclid(REGION_SIZE),
        )
    }

    /// Region coordinates of the top-left corner of the map loaded around this tile.
    pub fn top_left_region(&self) -> IVec2 {
        self.region() - IVec2::splat(MAP_REGION_OFFSET)
    }

    /// Coordinates of this tile relative to the map loaded around `base`.
    pub fn local_to(&self, base: &Position) -> IVec2 {
        self.tile - base.top_left_region() * REGION_SIZE
    }

    /// Whether a client whose map was loaded around `last_known_region` must load
    /// a new one to display this position.
    pub fn region_change_needed(&self, last_known_region: &Position) -> bool {
        let local = self.local_to(last_known_region);
        local.x < LOCAL_MIN || local.x >= LOCAL_MAX || local.y < LOCAL_MIN || local.y >= LOCAL_MAX
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.tile.x, self.tile.y, self.height)
    }
}
