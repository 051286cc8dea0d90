use grid_astar::config::{Cli, Config};
use grid_astar::grid::Grid;
use grid_astar::obstacle::{bake_random, ObstacleMap};
use grid_astar::pathfinder::Pathfinder;
use grid_astar::stat::SearchReport;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = if let Some(config_file) = cli.config.as_ref() {
        Config::from_yaml_file(config_file)?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let mut grid = Grid::new(&config.grid)?;
    let blocked = if let Some(map_file) = config.map_file.as_ref() {
        ObstacleMap::from_file(map_file)?.apply(&mut grid)?
    } else {
        let mut rng = StdRng::seed_from_u64(config.seed);
        bake_random(&mut grid, config.obstacle_probability, &mut rng)?
    };
    info!(
        "grid {}x{} ({} neighbors), {blocked} blocked cells",
        grid.rows(),
        grid.cols(),
        grid.neighboring()
    );

    let start = config.start;
    let goal = config.goal();
    let mut pathfinder = Pathfinder::new(config.search.clone())?;
    let mut path = Vec::with_capacity(grid.rows() + grid.cols());
    let outcome = pathfinder.find_path_between(&grid, start, goal, &mut path)?;

    if outcome.is_found() {
        info!("path {start:?} -> {goal:?}: {path:?}");
    } else {
        warn!("no path {start:?} -> {goal:?}: {outcome:?}");
    }
    pathfinder.stats().print();

    if let Some(output_path) = config.output_path.as_ref() {
        SearchReport {
            outcome,
            start,
            goal,
            path,
            stats: pathfinder.stats().clone(),
            open_set: pathfinder.open_set_len(),
            closed_set: pathfinder.closed_set_len(),
        }
        .write_json(output_path)?;
    }

    Ok(())
}
