pub mod common;
pub mod config;
pub mod grid;
pub mod heap;
pub mod node;
pub mod obstacle;
pub mod pathfinder;
pub mod stat;

pub use common::{Coord, Direction, Neighboring, Position};
pub use grid::{Grid, GridConfig};
pub use heap::{Heapable, PriorityQueue};
pub use node::{Node, SearchNode};
pub use pathfinder::{Pathfinder, SearchOutcome, SearchParams, DIAGONAL_COST, STRAIGHT_COST};
