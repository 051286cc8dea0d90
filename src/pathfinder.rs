use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, instrument, trace, warn};

use crate::common::{Coord, Neighboring, Position};
use crate::grid::Grid;
use crate::heap::PriorityQueue;
use crate::node::SearchNode;
use crate::stat::Stats;

pub const STRAIGHT_COST: i64 = 10;
// 10 * sqrt(2), kept integral so the heap never compares floats.
pub const DIAGONAL_COST: i64 = 14;

pub const DEFAULT_OPEN_SET_CAPACITY: usize = 512;
pub const DEFAULT_MAX_OPEN_SET_CAPACITY: usize = 1 << 20;

/// Tunables read at the start of every search.
///
/// Lowering `h_cost_multiplier` relative to `g_cost_multiplier` moves the
/// search toward uniform-cost (optimal, slower); raising it makes it greedier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub h_cost_multiplier: i64,
    pub g_cost_multiplier: i64,
    pub open_set_capacity: usize,
    pub max_open_set_capacity: usize,
    /// Give up after expanding this many nodes.
    pub max_expansions: Option<usize>,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            h_cost_multiplier: 1,
            g_cost_multiplier: 1,
            open_set_capacity: DEFAULT_OPEN_SET_CAPACITY,
            max_open_set_capacity: DEFAULT_MAX_OPEN_SET_CAPACITY,
            max_expansions: None,
        }
    }
}

impl SearchParams {
    /// Rejects multipliers that would make step costs non-positive or the
    /// heuristic negative, and open-set sizing the heap cannot honor.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.h_cost_multiplier < 0 {
            bail!(
                "Heuristic multiplier must not be negative, got {}",
                self.h_cost_multiplier
            );
        }
        if self.g_cost_multiplier < 1 {
            bail!(
                "Ground cost multiplier must be at least 1, got {}",
                self.g_cost_multiplier
            );
        }
        if self.open_set_capacity == 0 || self.open_set_capacity > self.max_open_set_capacity {
            bail!(
                "Open set capacity must be within [1, {}], got {}",
                self.max_open_set_capacity,
                self.open_set_capacity
            );
        }
        Ok(())
    }

    /// Diagonal distance under eight neighbors, Manhattan under four.
    pub fn heuristic(&self, neighboring: Neighboring, from: Coord, to: Coord) -> i64 {
        let row_offset = from.0.abs_diff(to.0) as i64;
        let col_offset = from.1.abs_diff(to.1) as i64;

        let h = match neighboring {
            Neighboring::Eight => {
                let max = row_offset.max(col_offset);
                let min = row_offset.min(col_offset);
                (max - min) * STRAIGHT_COST + min * DIAGONAL_COST
            }
            Neighboring::Four => (row_offset + col_offset) * STRAIGHT_COST,
        };
        h * self.h_cost_multiplier
    }

    pub fn step_cost(&self, from: Coord, to: Coord) -> i64 {
        let cost = if from.0 == to.0 || from.1 == to.1 {
            STRAIGHT_COST
        } else {
            DIAGONAL_COST
        };
        cost * self.g_cost_multiplier
    }

    /// Sum of step costs along `path`.
    pub fn path_cost(&self, path: &[Coord]) -> i64 {
        path.windows(2)
            .map(|step| self.step_cost(step[0], step[1]))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchOutcome {
    Found { cost: i64 },
    NoPath,
    OutsideGrid,
    Unwalkable,
    BudgetExhausted,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found { .. })
    }
}

/// A* searcher owning its open set, closed set and per-cell scratch state.
///
/// Searches never mutate the grid, so several searchers can share one
/// `&Grid`. A single searcher must not be re-entered.
#[derive(Debug)]
pub struct Pathfinder {
    params: SearchParams,
    open_set: PriorityQueue,
    closed_set: HashSet<Coord>,
    nodes: Vec<SearchNode>,
    cols: usize,
    stats: Stats,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Pathfinder::with_params(SearchParams::default())
    }
}

impl Pathfinder {
    pub fn new(params: SearchParams) -> anyhow::Result<Self> {
        params.validate()?;
        Ok(Pathfinder::with_params(params))
    }

    fn with_params(params: SearchParams) -> Self {
        Pathfinder {
            open_set: PriorityQueue::with_capacity(
                params.open_set_capacity,
                params.max_open_set_capacity,
            ),
            params,
            closed_set: HashSet::new(),
            nodes: Vec::new(),
            cols: 0,
            stats: Stats::default(),
        }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Replaces the tunables. The open set is rebuilt when its sizing changes.
    /// Invalid tunables are rejected and the current ones kept.
    pub fn set_params(&mut self, params: SearchParams) -> anyhow::Result<()> {
        params.validate()?;
        if params.open_set_capacity != self.params.open_set_capacity
            || params.max_open_set_capacity != self.params.max_open_set_capacity
        {
            self.open_set.clear(&mut self.nodes);
            self.open_set = PriorityQueue::with_capacity(
                params.open_set_capacity,
                params.max_open_set_capacity,
            );
        }
        self.params = params;
        Ok(())
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Cells currently in the open set, in heap array order.
    pub fn open_set(&self) -> impl Iterator<Item = Coord> + '_ {
        self.open_set.iter().map(|id| self.nodes[id].coord)
    }

    pub fn open_set_len(&self) -> usize {
        self.open_set.len()
    }

    /// Cells expanded by the last search.
    pub fn closed_set(&self) -> impl Iterator<Item = Coord> + '_ {
        self.closed_set.iter().copied()
    }

    pub fn closed_set_len(&self) -> usize {
        self.closed_set.len()
    }

    pub fn is_closed(&self, coord: Coord) -> bool {
        self.closed_set.contains(&coord)
    }

    /// Search bookkeeping for `coord` as left by the last search.
    pub fn node_state(&self, coord: Coord) -> Option<&SearchNode> {
        if coord.1 >= self.cols {
            return None;
        }
        let index = coord.0.checked_mul(self.cols)?.checked_add(coord.1)?;
        self.nodes.get(index)
    }

    /// Resolves both positions to cells and searches between them.
    pub fn find_path(
        &mut self,
        grid: &Grid,
        start: Position,
        end: Position,
        into: &mut Vec<Coord>,
    ) -> anyhow::Result<SearchOutcome> {
        match (grid.position_to_coord(start), grid.position_to_coord(end)) {
            (Some(start), Some(end)) => self.find_path_between(grid, start, end, into),
            _ => {
                into.clear();
                self.reset(grid);
                debug!("start {start} or end {end} is outside the grid");
                Ok(SearchOutcome::OutsideGrid)
            }
        }
    }

    /// Runs A* from `start` to `end`, writing the path (both endpoints
    /// included) into `into`. Every non-`Found` outcome leaves `into` empty.
    #[instrument(skip_all, name = "a_star", fields(start = ?start, goal = ?end), level = "debug")]
    pub fn find_path_between(
        &mut self,
        grid: &Grid,
        start: Coord,
        end: Coord,
        into: &mut Vec<Coord>,
    ) -> anyhow::Result<SearchOutcome> {
        into.clear();
        self.reset(grid);
        let timer = Instant::now();

        let (Some(start_id), Some(goal_id)) = (grid.index_of(start), grid.index_of(end)) else {
            debug!("endpoint outside the grid");
            return Ok(SearchOutcome::OutsideGrid);
        };
        if !grid.is_walkable(start) || !grid.is_walkable(end) {
            debug!("endpoint is not walkable");
            return Ok(SearchOutcome::Unwalkable);
        }

        let outcome = self.search(grid, start_id, goal_id, into)?;

        self.stats.time_us = timer.elapsed().as_micros() as u64;
        self.stats.path_len = into.len();
        if let SearchOutcome::Found { cost } = outcome {
            self.stats.cost = cost;
        }
        debug!("{outcome:?} after {} expansions", self.stats.expanded_nodes);
        Ok(outcome)
    }

    fn search(
        &mut self,
        grid: &Grid,
        start_id: usize,
        goal_id: usize,
        into: &mut Vec<Coord>,
    ) -> anyhow::Result<SearchOutcome> {
        let neighboring = grid.neighboring();
        let goal = self.nodes[goal_id].coord;
        let start = self.nodes[start_id].coord;

        {
            let start_h = self.params.heuristic(neighboring, start, goal);
            let start_node = &mut self.nodes[start_id];
            start_node.g_cost = 0;
            start_node.h_cost = start_h;
            start_node.parent = None;
        }
        self.open_set.add(&mut self.nodes, start_id)?;
        self.stats.inserted_nodes += 1;

        while let Some(current_id) = self.open_set.extract_root(&mut self.nodes) {
            let current = self.nodes[current_id].coord;

            if current_id == goal_id {
                let cost = self.nodes[goal_id].g_cost;
                self.build_path(start, goal, into);
                return Ok(SearchOutcome::Found { cost });
            }

            if let Some(limit) = self.params.max_expansions {
                if self.stats.expanded_nodes >= limit {
                    warn!("search gave up after {limit} expansions");
                    return Ok(SearchOutcome::BudgetExhausted);
                }
            }
            self.stats.expanded_nodes += 1;
            trace!("expand node: {current:?}");

            let current_g = self.nodes[current_id].g_cost;
            for neighbor in grid.node_by_index(current_id).neighbor_coords() {
                let Some(neighbor_id) = grid.index_of(neighbor) else {
                    continue;
                };
                if !grid.node_by_index(neighbor_id).is_walkable()
                    || self.closed_set.contains(&neighbor)
                {
                    continue;
                }

                let tentative_g = current_g + self.params.step_cost(current, neighbor);
                let not_in_open_set = !self.nodes[neighbor_id].in_open_set();
                if !not_in_open_set && tentative_g >= self.nodes[neighbor_id].g_cost {
                    continue;
                }

                let h = self.params.heuristic(neighboring, neighbor, goal);
                let entry = &mut self.nodes[neighbor_id];
                entry.g_cost = tentative_g;
                entry.h_cost = h;
                entry.parent = Some(current);

                if not_in_open_set {
                    self.open_set.add(&mut self.nodes, neighbor_id)?;
                    self.stats.inserted_nodes += 1;
                } else {
                    // Lower g means lower f; reposition in place.
                    self.open_set
                        .update_element_with_changed_val(&mut self.nodes, neighbor_id);
                    self.stats.updated_nodes += 1;
                }
            }

            self.closed_set.insert(current);
        }

        Ok(SearchOutcome::NoPath)
    }

    fn build_path(&self, start: Coord, goal: Coord, into: &mut Vec<Coord>) {
        let mut current = goal;
        into.push(current);
        while current != start {
            assert!(
                into.len() <= self.nodes.len(),
                "parent chain from {goal:?} does not reach {start:?}"
            );
            let parent = self.nodes[current.0 * self.cols + current.1]
                .parent
                .unwrap_or_else(|| panic!("node {current:?} on the path has no parent"));
            into.push(parent);
            current = parent;
        }
        // Built from the goal back to the start.
        into.reverse();
    }

    // Clears both sets and sizes the scratch arena to `grid`.
    fn reset(&mut self, grid: &Grid) {
        self.open_set.clear(&mut self.nodes);
        self.closed_set.clear();
        self.stats = Stats::default();

        if self.nodes.len() != grid.len() || self.cols != grid.cols() {
            debug!("resize search arena to {} nodes", grid.len());
            self.cols = grid.cols();
            self.nodes = (0..grid.len())
                .map(|index| SearchNode::new(grid.coord_of(index)))
                .collect();
        }
    }
}
