use crate::common::{Coord, Position};
use crate::heap::Heapable;

/// Static data of one grid cell. Owned exclusively by [`crate::grid::Grid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    row: usize,
    col: usize,
    position: Position,
    pub(crate) walkable: bool,
    // Fixed arity; unused slots on edges and corners stay `None`.
    pub(crate) neighbors: Vec<Option<Coord>>,
}

impl Node {
    pub(crate) fn new(row: usize, col: usize, position: Position, arity: usize) -> Self {
        Node {
            row,
            col,
            position,
            walkable: true,
            neighbors: vec![None; arity],
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn coord(&self) -> Coord {
        (self.row, self.col)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_walkable(&self) -> bool {
        self.walkable
    }

    /// Neighbor slots in bake order, including empty ones.
    pub fn neighbors(&self) -> &[Option<Coord>] {
        &self.neighbors
    }

    pub fn neighbor_coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.neighbors.iter().flatten().copied()
    }
}

/// Per-search bookkeeping for one grid cell.
///
/// Lives in the searcher's scratch arena at the same index as the cell in
/// the grid. Costs and parent are overwritten before they are read in a new
/// search; the heap fields are reset by [`crate::heap::PriorityQueue::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchNode {
    pub coord: Coord,
    pub g_cost: i64,
    pub h_cost: i64,
    pub parent: Option<Coord>,
    heap_index: Option<usize>,
    insertion_sequence: u64,
}

impl SearchNode {
    pub fn new(coord: Coord) -> Self {
        SearchNode {
            coord,
            ..Default::default()
        }
    }

    pub fn f_cost(&self) -> i64 {
        self.g_cost + self.h_cost
    }

    pub fn in_open_set(&self) -> bool {
        self.heap_index.is_some()
    }

    // `None` when both (f, h) pairs are equal and the tie-break decides.
    fn cost_priority(&self, other: &Self) -> Option<bool> {
        let (f, other_f) = (self.f_cost(), other.f_cost());
        if f == other_f && self.h_cost == other.h_cost {
            return None;
        }
        Some(f < other_f || (f == other_f && self.h_cost < other.h_cost))
    }
}

impl Heapable for SearchNode {
    fn heap_index(&self) -> Option<usize> {
        self.heap_index
    }

    fn set_heap_index(&mut self, index: Option<usize>) {
        self.heap_index = index;
    }

    fn insertion_sequence(&self) -> u64 {
        self.insertion_sequence
    }

    fn set_insertion_sequence(&mut self, sequence: u64) {
        self.insertion_sequence = sequence;
    }

    // Newest wins ties on the way up.
    fn has_priority_to_shift_up(&self, other: &Self) -> bool {
        self.cost_priority(other)
            .unwrap_or(self.insertion_sequence > other.insertion_sequence)
    }

    // Oldest wins ties on the way down.
    fn has_priority_to_shift_down(&self, other: &Self) -> bool {
        self.cost_priority(other)
            .unwrap_or(self.insertion_sequence < other.insertion_sequence)
    }
}
