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

use super::aligner::{align, AlignedLog};
use super::ledger::load_execution_windows;
use super::trace::{assemble_traces, write_aligned_rows, write_trace_file, Trace};
use crate::config::PipelineConfig;
use crate::error::{Result, TraceError};
use crate::parser::parse_log_file;
use crate::template::TemplateClassifier;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Label of the classifier snapshot taken between learning and classification
pub const INTERMEDIATE_STATE: &str = "intermediate state";

/// Files a run reads and writes
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    pub log_file: PathBuf,
    pub execution_stats_file: PathBuf,
    pub output_file: PathBuf,
    /// Optional CSV dump of the aligned rows
    pub aligned_output: Option<PathBuf>,
}

/// Counts reported after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub parsed_lines: usize,
    pub windows: usize,
    pub aligned_rows: usize,
    pub unmatched_lines: usize,
    pub traces: usize,
}

/// Turns a test-run log and its execution ledger into per-test traces
pub struct Pipeline<'c> {
    config: PipelineConfig,
    start_line: Option<usize>,
    classifier: &'c mut dyn TemplateClassifier,
}

impl<'c> Pipeline<'c> {
    #[must_use]
    pub const fn new(config: PipelineConfig, classifier: &'c mut dyn TemplateClassifier) -> Self {
        Self {
            config,
            start_line: None,
            classifier,
        }
    }

    /// Read the log from this 0-based line on instead of after the readiness line
    #[must_use]
    pub const fn with_start_line(mut self, start_line: Option<usize>) -> Self {
        self.start_line = start_line;
        self
    }

    /// Feed every aligned message to the classifier, then snapshot it
    pub fn learn_templates(&mut self, aligned: &AlignedLog) -> Result<()> {
        let learn_start = Instant::now();
        for (index, row) in aligned.rows().enumerate() {
            if self.config.progress_interval > 0 && index % self.config.progress_interval == 0 {
                log::debug!("Learning templates... ({index}/{})", aligned.row_count());
            }
            self.classifier.observe(&row.entry.message);
        }
        log::info!(
            "Learning templates from {} messages took {:?}",
            aligned.row_count(),
            learn_start.elapsed()
        );

        self.classifier.persist(INTERMEDIATE_STATE)
    }

    pub fn traces(&mut self, aligned: &AlignedLog) -> Vec<Trace> {
        assemble_traces(aligned, &mut *self.classifier)
    }

    /// Run all stages and write the trace file
    pub fn run(&mut self, paths: &PipelinePaths) -> Result<RunSummary> {
        let start_time = Instant::now();
        log::info!(
            "Generating traces from {:?} and {:?}",
            paths.log_file,
            paths.execution_stats_file
        );

        let options = self.config.parse_options(self.start_line);
        let entries = parse_log_file(&paths.log_file, &options)?;
        let windows = load_execution_windows(&paths.execution_stats_file)?;
        let aligned = align(&entries, &windows);

        if let Some(csv_path) = &paths.aligned_output {
            write_aligned_file(csv_path, &aligned)?;
        }

        self.learn_templates(&aligned)?;
        let traces = self.traces(&aligned);
        write_trace_file(&paths.output_file, &traces, &self.config.trace_prefix)?;

        let summary = RunSummary {
            parsed_lines: entries.len(),
            windows: windows.len(),
            aligned_rows: aligned.row_count(),
            unmatched_lines: aligned.unmatched(),
            traces: traces.len(),
        };
        log::info!("Total processing time: {:?} ({summary:?})", start_time.elapsed());
        Ok(summary)
    }
}

fn write_aligned_file(path: &Path, aligned: &AlignedLog) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| TraceError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_aligned_rows(&mut writer, aligned)
        .and_then(|()| writer.flush())
        .map_err(|e| TraceError::io(path, e))?;
    log::info!("Wrote {} aligned rows to {path:?}", aligned.row_count());
    Ok(())
}
