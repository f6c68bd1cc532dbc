use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Wire index of a mob in the world.
///
/// Indices are small, dense and reused after a mob leaves, which is what the
/// client-side slot protocol expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u16);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Staff classification of a player account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrivilegeLevel {
    #[default]
    Standard,
    Moderator,
    Administrator,
}

impl PrivilegeLevel {
    /// Moderators and administrators.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Moderator | Self::Administrator)
    }
}

/// A single-tile step, or no step at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None,
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Direction {
    /// Every real step, in wire-code order.
    pub const STEPS: [Direction; 8] = [
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
        Direction::West,
        Direction::East,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
    ];

    /// Tile delta of one step in this direction. North is +y.
    pub fn delta(self) -> IVec2 {
        match self {
            Self::None => IVec2::ZERO,
            Self::NorthWest => IVec2::new(-1, 1),
            Self::North => IVec2::new(0, 1),
            Self::NorthEast => IVec2::new(1, 1),
            Self::West => IVec2::new(-1, 0),
            Self::East => IVec2::new(1, 0),
            Self::SouthWest => IVec2::new(-1, -1),
            Self::South => IVec2::new(0, -1),
            Self::SouthEast => IVec2::new(1, -1),
        }
    }

}

/// Movement performed by a mob during one tick: a walking step, and a second
/// step when running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Directions {
    pub first: Direction,
    pub second: Direction,
}

impl Directions {
    pub const NONE: Directions = Directions {
        first: Direction::None,
        second: Direction::None,
    };

    pub fn walking(direction: Direction) -> Self {
        Self {
            first: direction,
            second: Direction::None,
        }
    }

    pub fn running(first: Direction, second: Direction) -> Self {
        Self { first, second }
    }

    pub fn is_moving(&self) -> bool {
        self.first != Direction::None
    }

    pub fn is_running(&self) -> bool {
        self.second != Direction::None
    }
}
