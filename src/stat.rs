use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;

use crate::common::Coord;
use crate::pathfinder::SearchOutcome;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub cost: i64,
    pub time_us: u64,
    pub expanded_nodes: usize,
    pub inserted_nodes: usize,
    pub updated_nodes: usize,
    pub path_len: usize,
}

impl Stats {
    pub fn print(&self) {
        info!(
            "Cost {:?} Time(microseconds) {:?} Path length {:?} Expanded nodes {:?} Inserted nodes {:?} Updated nodes {:?}",
            self.cost,
            self.time_us,
            self.path_len,
            self.expanded_nodes,
            self.inserted_nodes,
            self.updated_nodes
        );
    }
}

/// Summary of one CLI query, written as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub start: Coord,
    pub goal: Coord,
    pub path: Vec<Coord>,
    pub stats: Stats,
    pub open_set: usize,
    pub closed_set: usize,
}

impl SearchReport {
    pub fn write_json(&self, path: &str) -> Result<()> {
        let file = File::create(path).with_context(|| format!("cannot create report {path}"))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!("wrote report to {path}");
        Ok(())
    }
}
