use anyhow::{anyhow, bail, Context};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::common::{Coord, Neighboring};
use crate::grid::GridConfig;
use crate::pathfinder::SearchParams;

/// Upper bound of the random obstacle density, as the grid editor exposes it.
pub const MAX_OBSTACLE_PROBABILITY: f64 = 0.4;

#[derive(Parser, Debug, Default)]
#[command(
    name = "Grid A*",
    about = "Shortest paths on a rectangular grid with A*.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Number of grid rows")]
    pub rows: Option<usize>,

    #[arg(long, help = "Number of grid columns")]
    pub cols: Option<usize>,

    #[arg(long, help = "Half the side length of one cell")]
    pub cell_radius: Option<f32>,

    #[arg(long, value_enum, help = "Neighbor topology")]
    pub neighboring: Option<Neighboring>,

    #[arg(long, help = "Probability that a cell is blocked")]
    pub obstacle_probability: Option<f64>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Octile .map file with the obstacle layout")]
    pub map_file: Option<String>,

    #[arg(long, help = "Start row")]
    pub start_row: Option<usize>,

    #[arg(long, help = "Start column")]
    pub start_col: Option<usize>,

    #[arg(long, help = "Goal row, defaults to the last row")]
    pub goal_row: Option<usize>,

    #[arg(long, help = "Goal column, defaults to the last column")]
    pub goal_col: Option<usize>,

    #[arg(long, help = "Heuristic cost multiplier")]
    pub h_cost_multiplier: Option<i64>,

    #[arg(long, help = "Ground cost multiplier")]
    pub g_cost_multiplier: Option<i64>,

    #[arg(long, help = "Give up after this many expansions")]
    pub max_expansions: Option<usize>,

    #[arg(long, help = "Path to the JSON report")]
    pub output_path: Option<String>,

    #[arg(long, help = "Log filter, overridden by RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub obstacle_probability: f64,
    pub seed: u64,
    pub map_file: Option<String>,
    pub start: Coord,
    pub goal: Option<Coord>,
    pub search: SearchParams,
    pub output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            grid: GridConfig::default(),
            obstacle_probability: 0.2,
            seed: 0,
            map_file: None,
            start: (0, 0),
            goal: None,
            search: SearchParams::default(),
            output_path: None,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("cannot parse YAML config")
    }

    pub fn from_yaml_file(path: &str) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {path}"))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("error with config file: {path}"))
    }

    /// Applies every flag given on the command line, then validates.
    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(rows) = cli.rows {
            self.grid.rows = rows;
        }
        if let Some(cols) = cli.cols {
            self.grid.cols = cols;
        }
        if let Some(cell_radius) = cli.cell_radius {
            self.grid.cell_radius = cell_radius;
        }
        if let Some(neighboring) = cli.neighboring {
            self.grid.neighboring = neighboring;
        }
        if let Some(probability) = cli.obstacle_probability {
            self.obstacle_probability = probability;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(map_file) = &cli.map_file {
            self.map_file = Some(map_file.clone());
        }
        if let Some(row) = cli.start_row {
            self.start.0 = row;
        }
        if let Some(col) = cli.start_col {
            self.start.1 = col;
        }
        match (cli.goal_row, cli.goal_col) {
            (None, None) => {}
            (row, col) => {
                let (default_row, default_col) = self.goal();
                self.goal = Some((row.unwrap_or(default_row), col.unwrap_or(default_col)));
            }
        }
        if let Some(multiplier) = cli.h_cost_multiplier {
            self.search.h_cost_multiplier = multiplier;
        }
        if let Some(multiplier) = cli.g_cost_multiplier {
            self.search.g_cost_multiplier = multiplier;
        }
        if let Some(limit) = cli.max_expansions {
            self.search.max_expansions = Some(limit);
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }

        self.validate()?;
        Ok(self)
    }

    /// The configured goal, or the top-right cell.
    pub fn goal(&self) -> Coord {
        self.goal.unwrap_or((
            self.grid.rows.saturating_sub(1),
            self.grid.cols.saturating_sub(1),
        ))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.grid.validate()?;

        if !(0.0..=MAX_OBSTACLE_PROBABILITY).contains(&self.obstacle_probability) {
            bail!(
                "Obstacle probability must be within [0, {MAX_OBSTACLE_PROBABILITY}], got {}",
                self.obstacle_probability
            );
        }
        self.search.validate()?;

        for (name, (row, col)) in [("Start", self.start), ("Goal", self.goal())] {
            if row >= self.grid.rows || col >= self.grid.cols {
                return Err(anyhow!(
                    "{name} ({row}, {col}) is outside the {}x{} grid",
                    self.grid.rows,
                    self.grid.cols
                ));
            }
        }
        Ok(())
    }
}
