// LogTrace - GPL-3.0-or-later
// This file is part of LogTrace.
//
// Copyright (C) 2026 Daniel Freiermuth
//
// LogTrace is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// LogTrace is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with LogTrace.  If not, see <https://www.gnu.org/licenses/>.

use super::drain::LogCluster;
use crate::error::{Result, TraceError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Serialized template store of a [`super::DrainMiner`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinerSnapshot {
    /// Why the snapshot was taken
    pub label: String,
    pub next_id: u64,
    pub clusters: Vec<LogCluster>,
}

/// Where miner snapshots go
pub trait Persistence {
    fn save(&mut self, snapshot: &MinerSnapshot) -> Result<()>;

    /// The most recent snapshot, if any was saved
    fn load(&self) -> Result<Option<MinerSnapshot>>;
}

/// Snapshot stored as JSON in a file, overwritten on every save
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Persistence for FilePersistence {
    fn save(&mut self, snapshot: &MinerSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| TraceError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json).map_err(|e| TraceError::io(&self.path, e))?;

        log::info!(
            "Saved template state '{}' ({} clusters) to {:?}",
            snapshot.label,
            snapshot.clusters.len(),
            self.path
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<MinerSnapshot>> {
        if !self.path.exists() {
            log::info!("No template state at {:?}, starting empty", self.path);
            return Ok(None);
        }

        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| TraceError::io(&self.path, e))?;
        let snapshot: MinerSnapshot = serde_json::from_str(&contents)?;
        log::info!(
            "Loaded template state '{}' with {} clusters from {:?}",
            snapshot.label,
            snapshot.clusters.len(),
            self.path
        );
        Ok(Some(snapshot))
    }
}

/// Keeps every snapshot in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    pub snapshots: Vec<MinerSnapshot>,
}

impl Persistence for MemoryPersistence {
    fn save(&mut self, snapshot: &MinerSnapshot) -> Result<()> {
        self.snapshots.push(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<MinerSnapshot>> {
        Ok(self.snapshots.last().cloned())
    }
}
