use grid_astar::config::Config;
use grid_astar::obstacle::ObstacleMap;
use grid_astar::{
    Grid, GridConfig, Neighboring, Pathfinder, Position, SearchOutcome, DIAGONAL_COST,
    STRAIGHT_COST,
};

fn unit_grid(neighboring: Neighboring) -> Grid {
    Grid::new(&GridConfig {
        rows: 5,
        cols: 5,
        cell_radius: 0.5,
        neighboring,
        origin: Position::default(),
    })
    .unwrap()
}

#[test]
fn test_corner_to_corner_by_position() {
    let mut pathfinder = Pathfinder::default();
    let mut path = Vec::new();

    let grid = unit_grid(Neighboring::Four);
    // Centers of (0, 0) and (4, 4) on a unit grid centered on the origin.
    let outcome = pathfinder
        .find_path(&grid, Position::new(-2.0, -2.0), Position::new(2.0, 2.0), &mut path)
        .unwrap();
    assert_eq!(outcome, SearchOutcome::Found { cost: 8 * STRAIGHT_COST });
    assert_eq!(path.len(), 9);
    assert_eq!(path.first(), Some(&(0, 0)));
    assert_eq!(path.last(), Some(&(4, 4)));

    let grid = unit_grid(Neighboring::Eight);
    let outcome = pathfinder
        .find_path(&grid, Position::new(-2.0, -2.0), Position::new(2.0, 2.0), &mut path)
        .unwrap();
    assert_eq!(outcome, SearchOutcome::Found { cost: 4 * DIAGONAL_COST });
    assert_eq!(path.len(), 5);
}

#[test]
fn test_open_and_closed_sets_are_visible_after_search() {
    let grid = unit_grid(Neighboring::Eight);
    let mut pathfinder = Pathfinder::default();
    let mut path = Vec::new();
    pathfinder
        .find_path_between(&grid, (0, 0), (4, 4), &mut path)
        .unwrap();

    assert!(pathfinder.closed_set().all(|coord| grid.is_walkable(coord)));
    assert!(pathfinder.is_closed((0, 0)));
    assert!(!pathfinder.is_closed((4, 4)));
    for coord in pathfinder.open_set() {
        assert!(!pathfinder.is_closed(coord));
        assert!(pathfinder.node_state(coord).unwrap().in_open_set());
    }
}

#[test]
fn test_map_file_drives_walkability() {
    let map = "type octile\nheight 4\nwidth 5\nmap\n.....\n@@@@.\n.....\n.@@@@\n";
    let path = std::env::temp_dir().join(format!("grid_astar_{}.map", std::process::id()));
    std::fs::write(&path, map).unwrap();

    let obstacles = ObstacleMap::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut grid = Grid::new(&GridConfig {
        rows: 4,
        cols: 5,
        neighboring: Neighboring::Four,
        ..GridConfig::default()
    })
    .unwrap();
    assert_eq!(obstacles.apply(&mut grid).unwrap(), 8);

    let mut pathfinder = Pathfinder::default();
    let mut route = Vec::new();
    let outcome = pathfinder
        .find_path_between(&grid, (0, 0), (3, 0), &mut route)
        .unwrap();
    // Up to row 1, right to column 4, up past the wall, left along row 3.
    assert_eq!(route.first(), Some(&(0, 0)));
    assert_eq!(route.last(), Some(&(3, 0)));
    assert!(route.contains(&(1, 0)));
    assert!(route.contains(&(2, 4)));
    assert_eq!(outcome, SearchOutcome::Found { cost: 11 * STRAIGHT_COST });
}

#[test]
fn test_missing_map_file_is_an_error() {
    let err = ObstacleMap::from_file("definitely/not/here.map").unwrap_err();
    assert!(format!("{err:#}").contains("cannot open map file"));
}

#[test]
fn test_config_builds_a_searchable_grid() {
    let config = Config::from_yaml_str(
        "grid:\n  rows: 6\n  cols: 4\n  neighboring: eight\nobstacle_probability: 0.0\nstart: [0, 3]\n",
    )
    .unwrap();
    config.validate().unwrap();

    let grid = Grid::new(&config.grid).unwrap();
    let mut pathfinder = Pathfinder::new(config.search.clone()).unwrap();
    let mut path = Vec::new();
    let outcome = pathfinder
        .find_path_between(&grid, config.start, config.goal(), &mut path)
        .unwrap();
    // Five rows up and no columns across.
    assert_eq!(outcome, SearchOutcome::Found { cost: 5 * STRAIGHT_COST });
}
