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

use crate::error::{Result, TraceError};
use crate::parser::readiness::{self, ReadinessRule};
use crate::parser::ParseOptions;
use crate::template::MinerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pipeline configuration, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Substring identifying lines emitted by the system under test
    pub sut_marker: String,

    /// Keyword sets announcing that the application is up
    pub readiness_rules: Vec<ReadinessRule>,

    /// Leading token of every trace line
    pub trace_prefix: String,

    /// Log parse progress every this many lines (0 disables)
    pub progress_interval: usize,

    pub miner: MinerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sut_marker: "SUT: ".to_string(),
            readiness_rules: readiness::default_rules(),
            trace_prefix: "0".to_string(),
            progress_interval: 500,
            miner: MinerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Get the path to the per-user config file
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("logtrace").join("config.json"))
    }

    /// Load config from `path`, or from the per-user file, falling back to defaults.
    ///
    /// An explicitly given file must exist and parse; a broken per-user file
    /// is reported and ignored.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        let Some(path) = Self::default_path().filter(|path| path.exists()) else {
            log::info!("No config found, using defaults");
            return Ok(Self::default());
        };

        Self::load_from(&path).or_else(|e| {
            log::warn!("Ignoring user config: {e}");
            Ok(Self::default())
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Loading config from {path:?}");
        let contents = std::fs::read_to_string(path).map_err(|e| TraceError::io(path, e))?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| TraceError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        log::info!(
            "Loaded {} readiness rules, SUT marker {:?}",
            config.readiness_rules.len(),
            config.sut_marker
        );
        Ok(config)
    }

    /// Save config to `path` as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TraceError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| TraceError::io(path, e))?;

        log::info!("Saved config to {path:?}");
        Ok(())
    }

    /// Parser settings derived from this config
    #[must_use]
    pub fn parse_options(&self, start_line: Option<usize>) -> ParseOptions {
        ParseOptions {
            sut_marker: self.sut_marker.clone(),
            readiness_rules: self.readiness_rules.clone(),
            start_line,
            progress_interval: self.progress_interval,
            ..ParseOptions::default()
        }
    }
}
