use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::grid::Grid;

/// Blocks each cell independently with `probability`.
///
/// Returns the number of blocked cells. Runs once after grid construction,
/// never during a search.
pub fn bake_random<R: Rng + ?Sized>(
    grid: &mut Grid,
    probability: f64,
    rng: &mut R,
) -> Result<usize> {
    if !(0.0..=1.0).contains(&probability) {
        bail!("obstacle probability must be within [0, 1], got {probability}");
    }

    let keep = 1.0 - probability;
    let mut blocked = 0;
    for node in grid.nodes_mut() {
        node.walkable = rng.gen::<f64>() < keep;
        if !node.walkable {
            blocked += 1;
        }
    }

    debug!("baked {blocked} random obstacles with probability {probability}");
    Ok(blocked)
}

/// Walkability layout read from an octile `.map` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleMap {
    pub height: usize,
    pub width: usize,
    // Indexed `[row][col]` with row 0 at the bottom of the grid.
    passable: Vec<Vec<bool>>,
}

impl ObstacleMap {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("cannot open map file {}", path.display()))?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("cannot read map file {}", path.display()))?;
        let map = Self::parse(lines.iter().map(String::as_str))
            .with_context(|| format!("invalid map file {}", path.display()))?;
        info!(
            "loaded {}x{} obstacle map from {}",
            map.height,
            map.width,
            path.display()
        );
        Ok(map)
    }

    pub fn parse<'a, I: IntoIterator<Item = &'a str>>(lines: I) -> Result<Self> {
        let mut lines = lines.into_iter();

        let _type = lines.next().ok_or_else(|| anyhow!("missing type line"))?;
        let height = header_value(lines.next(), "height")?;
        let width = header_value(lines.next(), "width")?;
        match lines.next().map(str::trim) {
            Some("map") => {}
            other => bail!("expected `map` line, got {other:?}"),
        }

        let mut passable = Vec::with_capacity(height);
        for (line_no, line) in lines.take(height).enumerate() {
            let row: Vec<bool> = line
                .trim_end()
                .chars()
                .map(|ch| ch == '.' || ch == 'G')
                .collect();
            if row.len() != width {
                bail!(
                    "map row {line_no} has {} cells, expected {width}",
                    row.len()
                );
            }
            passable.push(row);
        }
        if passable.len() != height {
            bail!("map has {} rows, expected {height}", passable.len());
        }
        // The file lists the top row first.
        passable.reverse();

        Ok(ObstacleMap {
            height,
            width,
            passable,
        })
    }

    pub fn is_passable(&self, row: usize, col: usize) -> bool {
        self.passable
            .get(row)
            .and_then(|cells| cells.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Copies the layout onto `grid`; dimensions must match.
    pub fn apply(&self, grid: &mut Grid) -> Result<usize> {
        if grid.rows() != self.height || grid.cols() != self.width {
            bail!(
                "map is {}x{} but the grid is {}x{}",
                self.height,
                self.width,
                grid.rows(),
                grid.cols()
            );
        }

        let mut blocked = 0;
        for node in grid.nodes_mut() {
            node.walkable = self.passable[node.row()][node.col()];
            if !node.walkable {
                blocked += 1;
            }
        }
        Ok(blocked)
    }
}

fn header_value(line: Option<&str>, key: &str) -> Result<usize> {
    let line = line.ok_or_else(|| anyhow!("missing `{key}` line"))?;
    let mut parts = line.split_whitespace();
    if parts.next() != Some(key) {
        bail!("expected `{key} <n>`, got {line:?}");
    }
    parts
        .next()
        .ok_or_else(|| anyhow!("missing value in {line:?}"))?
        .parse::<usize>()
        .with_context(|| format!("invalid {key} in {line:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Neighboring;
    use crate::grid::GridConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const MAP: &str = "type octile\nheight 3\nwidth 4\nmap\n..@.\n.@..\n....\n";

    fn grid(rows: usize, cols: usize) -> Grid {
        Grid::new(&GridConfig {
            rows,
            cols,
            cell_radius: 0.5,
            neighboring: Neighboring::Four,
            ..GridConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_read_map() {
        let map = ObstacleMap::parse(MAP.lines()).unwrap();
        assert_eq!(map.height, 3);
        assert_eq!(map.width, 4);

        // Bottom row is the last line of the file.
        assert!((0..4).all(|col| map.is_passable(0, col)));
        assert!(!map.is_passable(1, 1));
        assert!(!map.is_passable(2, 2));
        assert!(map.is_passable(2, 3));
        assert!(!map.is_passable(3, 0));
    }

    #[test]
    fn test_apply_map() {
        let map = ObstacleMap::parse(MAP.lines()).unwrap();
        let mut target = grid(3, 4);
        assert_eq!(map.apply(&mut target).unwrap(), 2);
        assert!(!target.is_walkable((1, 1)));
        assert!(!target.is_walkable((2, 2)));
        assert_eq!(target.walkable_count(), 10);

        let mut wrong = grid(4, 3);
        assert!(map.apply(&mut wrong).is_err());
    }

    #[test]
    fn test_reject_malformed_map() {
        assert!(ObstacleMap::parse("type octile\nheight x\nwidth 1\nmap\n.".lines()).is_err());
        assert!(ObstacleMap::parse("type octile\nheight 2\nwidth 2\nmap\n..\n".lines()).is_err());
        assert!(ObstacleMap::parse("type octile\nheight 1\nwidth 2\nmap\n...\n".lines()).is_err());
        assert!(ObstacleMap::parse("type octile\nwidth 1\nheight 1\nmap\n.\n".lines()).is_err());
    }

    #[test]
    fn test_bake_random_is_reproducible() {
        let mut a = grid(20, 20);
        let mut b = grid(20, 20);
        let blocked_a = bake_random(&mut a, 0.2, &mut StdRng::seed_from_u64(3)).unwrap();
        let blocked_b = bake_random(&mut b, 0.2, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(blocked_a, blocked_b);
        assert!(a
            .nodes()
            .zip(b.nodes())
            .all(|(x, y)| x.is_walkable() == y.is_walkable()));
        assert_eq!(a.walkable_count(), 400 - blocked_a);
    }

    #[test]
    fn test_bake_random_extremes() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut g = grid(5, 5);
        assert_eq!(bake_random(&mut g, 0.0, &mut rng).unwrap(), 0);
        assert_eq!(bake_random(&mut g, 1.0, &mut rng).unwrap(), 25);
        assert!(bake_random(&mut g, 1.5, &mut rng).is_err());
    }
}
