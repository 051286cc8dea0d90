use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid coordinate as `(row, col)`. Used as the stable identity of a node.
pub type Coord = (usize, usize);

/// A point in continuous space. Columns grow along `x`, rows along `y`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Position { x, y }
    }
}

impl std::ops::Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Neighbor topology of the grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Neighboring {
    #[default]
    Four,
    Eight,
}

impl Neighboring {
    /// Length of every node's neighbor list.
    pub const fn arity(self) -> usize {
        match self {
            Neighboring::Four => 4,
            Neighboring::Eight => 8,
        }
    }

    /// Builds a topology from its arity, rejecting anything but 4 or 8.
    pub fn from_arity(arity: usize) -> anyhow::Result<Self> {
        match arity {
            4 => Ok(Neighboring::Four),
            8 => Ok(Neighboring::Eight),
            _ => Err(anyhow::anyhow!(
                "unsupported neighbor topology {arity}, expected 4 or 8"
            )),
        }
    }
}

impl fmt::Display for Neighboring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Neighboring::Four => write!(f, "four"),
            Neighboring::Eight => write!(f, "eight"),
        }
    }
}

/// Fixed neighbor slots of an interior node under eight-connected topology.
///
/// Neighbors are baked by scanning rows bottom to top and columns left to
/// right, so these indices are stable for every node that has all eight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    SouthWest = 0,
    South = 1,
    SouthEast = 2,
    West = 3,
    East = 4,
    NorthWest = 5,
    North = 6,
    NorthEast = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
        Direction::West,
        Direction::East,
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
    ];

    pub const fn slot(self) -> usize {
        self as usize
    }

    /// Row and column offset of the neighbor in this direction.
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::SouthWest => (-1, -1),
            Direction::South => (-1, 0),
            Direction::SouthEast => (-1, 1),
            Direction::West => (0, -1),
            Direction::East => (0, 1),
            Direction::NorthWest => (1, -1),
            Direction::North => (1, 0),
            Direction::NorthEast => (1, 1),
        }
    }
}
