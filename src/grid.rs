use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{Coord, Neighboring, Position};
use crate::node::Node;

pub const MIN_CELL_RADIUS: f32 = 0.1;
pub const MAX_CELL_RADIUS: f32 = 5.0;

/// Static shape of a grid, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub cell_radius: f32,
    pub neighboring: Neighboring,
    /// Center of the grid in world space.
    pub origin: Position,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            rows: 50,
            cols: 50,
            cell_radius: 0.5,
            neighboring: Neighboring::Four,
            origin: Position::default(),
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            bail!(
                "grid dimensions must be positive, got {} x {}",
                self.rows,
                self.cols
            );
        }
        if self.rows.checked_mul(self.cols).is_none() {
            bail!("grid of {} x {} cells is too large", self.rows, self.cols);
        }
        if !self.cell_radius.is_finite()
            || !(MIN_CELL_RADIUS..=MAX_CELL_RADIUS).contains(&self.cell_radius)
        {
            bail!(
                "cell radius must be within [{MIN_CELL_RADIUS}, {MAX_CELL_RADIUS}], got {}",
                self.cell_radius
            );
        }
        if !self.origin.x.is_finite() || !self.origin.y.is_finite() {
            bail!("grid origin must be finite, got {}", self.origin);
        }
        Ok(())
    }
}

/// Rectangular lattice of nodes with baked neighbor adjacency.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cell_radius: f32,
    neighboring: Neighboring,
    origin: Position,
    nodes: Vec<Node>,
}

impl Grid {
    pub fn new(config: &GridConfig) -> Result<Self> {
        config.validate()?;

        let mut grid = Grid {
            rows: config.rows,
            cols: config.cols,
            cell_radius: config.cell_radius,
            neighboring: config.neighboring,
            origin: config.origin,
            nodes: Vec::with_capacity(config.rows * config.cols),
        };
        grid.build();
        grid.bake_neighbors();

        debug!(
            "built {}x{} grid, {} neighbors, corner {}",
            grid.rows,
            grid.cols,
            grid.neighboring.arity(),
            grid.bottom_left_corner()
        );
        Ok(grid)
    }

    fn build(&mut self) {
        let start = self.bottom_left_corner() + Position::new(self.cell_radius, self.cell_radius);
        let diameter = self.cell_diameter();
        let arity = self.neighboring.arity();

        for row in 0..self.rows {
            for col in 0..self.cols {
                let position = Position::new(
                    start.x + diameter * col as f32,
                    start.y + diameter * row as f32,
                );
                self.nodes.push(Node::new(row, col, position, arity));
            }
        }
    }

    // Scan order is fixed: rows bottom to top, then columns left to right.
    fn bake_neighbors(&mut self) {
        let four = self.neighboring == Neighboring::Four;

        for index in 0..self.nodes.len() {
            let (row, col) = self.coord_of(index);
            let mut counter = 0;

            for r in row as isize - 1..=row as isize + 1 {
                for c in col as isize - 1..=col as isize + 1 {
                    let Some(neighbor) = self.checked_coord(r, c) else {
                        continue;
                    };
                    if neighbor == (row, col) {
                        continue;
                    }
                    if four && neighbor.0 != row && neighbor.1 != col {
                        continue;
                    }
                    self.nodes[index].neighbors[counter] = Some(neighbor);
                    counter += 1;
                }
            }
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn cell_radius(&self) -> f32 {
        self.cell_radius
    }

    pub fn cell_diameter(&self) -> f32 {
        self.cell_radius * 2.0
    }

    pub fn neighboring(&self) -> Neighboring {
        self.neighboring
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    /// Bottom-left corner of the grid area (not the first node's center).
    ///
    /// Odd counts add half a cell so the grid stays centered on the origin.
    pub fn bottom_left_corner(&self) -> Position {
        let half_extent = |count: usize| {
            let offset = self.cell_diameter() * (count / 2) as f32;
            if count % 2 == 0 {
                offset
            } else {
                offset + self.cell_radius
            }
        };
        self.origin - Position::new(half_extent(self.cols), half_extent(self.rows))
    }

    pub fn index_of(&self, (row, col): Coord) -> Option<usize> {
        if row < self.rows && col < self.cols {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn coord_of(&self, index: usize) -> Coord {
        (index / self.cols, index % self.cols)
    }

    fn checked_coord(&self, row: isize, col: isize) -> Option<Coord> {
        if row < 0 || col < 0 {
            return None;
        }
        let coord = (row as usize, col as usize);
        self.index_of(coord).map(|_| coord)
    }

    /// Node at `(row, col)`, or `None` outside the grid.
    pub fn node_at(&self, row: usize, col: usize) -> Option<&Node> {
        self.index_of((row, col)).map(|index| &self.nodes[index])
    }

    pub fn node(&self, coord: Coord) -> Option<&Node> {
        self.node_at(coord.0, coord.1)
    }

    // Panics on an index outside the arena.
    pub(crate) fn node_by_index(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn position_to_coord(&self, position: Position) -> Option<Coord> {
        let offset = position - self.bottom_left_corner();
        let row = (offset.y / self.cell_diameter()).floor();
        let col = (offset.x / self.cell_diameter()).floor();
        if !row.is_finite() || !col.is_finite() {
            return None;
        }
        self.checked_coord(row as isize, col as isize)
    }

    /// Node whose cell contains `position`, or `None` outside the grid.
    pub fn position_to_node(&self, position: Position) -> Option<&Node> {
        self.position_to_coord(position)
            .and_then(|coord| self.node(coord))
    }

    pub fn is_walkable(&self, coord: Coord) -> bool {
        self.node(coord).is_some_and(Node::is_walkable)
    }

    /// Marks a cell blocked or open. Must not run while a search over this
    /// grid is in flight.
    pub fn set_walkable(&mut self, coord: Coord, walkable: bool) -> Result<()> {
        let Some(index) = self.index_of(coord) else {
            bail!(
                "cell {coord:?} is outside the {}x{} grid",
                self.rows,
                self.cols
            );
        };
        self.nodes[index].walkable = walkable;
        Ok(())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn walkable_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_walkable()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Direction;

    fn grid(rows: usize, cols: usize, radius: f32, neighboring: Neighboring) -> Grid {
        Grid::new(&GridConfig {
            rows,
            cols,
            cell_radius: radius,
            neighboring,
            origin: Position::default(),
        })
        .unwrap()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_rejects_bad_config() {
        let mut config = GridConfig {
            rows: 0,
            ..GridConfig::default()
        };
        assert!(Grid::new(&config).is_err());
        config.rows = 5;
        config.cols = 0;
        assert!(Grid::new(&config).is_err());
        config.cols = 5;
        config.cell_radius = 0.0;
        assert!(Grid::new(&config).is_err());
        config.cell_radius = f32::NAN;
        assert!(Grid::new(&config).is_err());
        config.cell_radius = 0.5;
        assert!(Grid::new(&config).is_ok());
    }

    #[test]
    fn test_grid_is_centered_for_odd_and_even_counts() {
        for (rows, cols) in [(5, 5), (4, 6), (3, 8), (1, 1)] {
            let grid = grid(rows, cols, 0.5, Neighboring::Four);
            let first = grid.node_at(0, 0).unwrap().position();
            let last = grid.node_at(rows - 1, cols - 1).unwrap().position();
            assert!(approx(first.x, -last.x), "{rows}x{cols}");
            assert!(approx(first.y, -last.y), "{rows}x{cols}");
            assert!(approx(grid.bottom_left_corner().x, -(cols as f32) * 0.5));
            assert!(approx(grid.bottom_left_corner().y, -(rows as f32) * 0.5));
        }
    }

    #[test]
    fn test_positions_step_by_diameter() {
        let grid = grid(3, 4, 1.0, Neighboring::Four);
        let a = grid.node_at(1, 1).unwrap().position();
        let b = grid.node_at(1, 2).unwrap().position();
        let c = grid.node_at(2, 1).unwrap().position();
        assert!(approx(b.x - a.x, 2.0) && approx(b.y, a.y));
        assert!(approx(c.y - a.y, 2.0) && approx(c.x, a.x));
    }

    #[test]
    fn test_node_at_out_of_bounds() {
        let grid = grid(5, 5, 0.5, Neighboring::Four);
        assert!(grid.node_at(4, 4).is_some());
        assert!(grid.node_at(5, 0).is_none());
        assert!(grid.node_at(0, 5).is_none());
        assert!(grid.node_at(usize::MAX, 0).is_none());
    }

    #[test]
    fn test_position_to_node_round_trips_centers() {
        let grid = grid(7, 4, 0.5, Neighboring::Eight);
        for node in grid.nodes() {
            let found = grid.position_to_node(node.position()).unwrap();
            assert_eq!(found.coord(), node.coord());
        }
        let corner = grid.bottom_left_corner();
        assert!(grid
            .position_to_node(corner - Position::new(0.01, 0.0))
            .is_none());
        assert!(grid
            .position_to_node(Position::new(0.0, 100.0))
            .is_none());
        assert!(grid
            .position_to_node(Position::new(f32::NAN, 0.0))
            .is_none());
        assert_eq!(
            grid.position_to_node(corner + Position::new(0.01, 0.01))
                .unwrap()
                .coord(),
            (0, 0)
        );
    }

    #[test]
    fn test_position_to_node_respects_offset_origin() {
        let grid = Grid::new(&GridConfig {
            rows: 2,
            cols: 2,
            cell_radius: 1.0,
            neighboring: Neighboring::Four,
            origin: Position::new(10.0, -10.0),
        })
        .unwrap();
        assert_eq!(
            grid.position_to_coord(Position::new(10.5, -9.5)),
            Some((1, 1))
        );
        assert_eq!(
            grid.position_to_coord(Position::new(9.5, -10.5)),
            Some((0, 0))
        );
        assert_eq!(grid.position_to_coord(Position::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_four_neighbors() {
        let grid = grid(3, 3, 0.5, Neighboring::Four);
        let center = grid.node_at(1, 1).unwrap();
        assert_eq!(center.neighbors().len(), 4);
        assert_eq!(
            center.neighbors(),
            &[Some((0, 1)), Some((1, 0)), Some((1, 2)), Some((2, 1))]
        );

        let corner = grid.node_at(0, 0).unwrap();
        assert_eq!(corner.neighbors(), &[Some((0, 1)), Some((1, 0)), None, None]);
    }

    #[test]
    fn test_eight_neighbors_follow_direction_slots() {
        let grid = grid(3, 3, 0.5, Neighboring::Eight);
        let center = grid.node_at(1, 1).unwrap();
        assert_eq!(center.neighbor_coords().count(), 8);
        for direction in Direction::ALL {
            let (dr, dc) = direction.offset();
            let expected = ((1 + dr) as usize, (1 + dc) as usize);
            assert_eq!(center.neighbors()[direction.slot()], Some(expected));
        }

        let corner = grid.node_at(2, 2).unwrap();
        assert_eq!(corner.neighbor_coords().count(), 3);
        assert!(corner.neighbors()[3..].iter().all(Option::is_none));
    }

    #[test]
    fn test_neighbors_are_symmetric() {
        for neighboring in [Neighboring::Four, Neighboring::Eight] {
            let grid = grid(4, 6, 0.5, neighboring);
            for node in grid.nodes() {
                for neighbor in node.neighbor_coords() {
                    let back = grid.node(neighbor).unwrap();
                    assert!(back.neighbor_coords().any(|c| c == node.coord()));
                }
            }
        }
    }

    #[test]
    fn test_set_walkable() {
        let mut grid = grid(2, 2, 0.5, Neighboring::Four);
        assert_eq!(grid.walkable_count(), 4);
        grid.set_walkable((1, 0), false).unwrap();
        assert!(!grid.is_walkable((1, 0)));
        assert!(!grid.is_walkable((9, 9)));
        assert_eq!(grid.walkable_count(), 3);
        assert!(grid.set_walkable((2, 0), false).is_err());
    }
}
