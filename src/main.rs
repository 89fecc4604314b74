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

use anyhow::Context;
use clap::Parser;
use logtrace::core::{Pipeline, PipelinePaths};
use logtrace::template::{DrainMiner, FilePersistence};
use logtrace::PipelineConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "logtrace")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Process logs produced by test cases and convert them to traces for model learning", long_about = None)]
struct Args {
    /// Path to the log file of the system under test
    #[arg(long, value_name = "FILE")]
    log_file: PathBuf,

    /// Path to the execution stats file (test id, start, end per line)
    #[arg(long, value_name = "FILE")]
    execution_stats_file: PathBuf,

    /// Line (0-based) to start reading the log from, skipping the readiness scan
    #[arg(long, value_name = "LINE")]
    read_from: Option<usize>,

    /// Path of the trace output
    #[arg(long, value_name = "FILE", default_value = "traces.txt")]
    output_file: PathBuf,

    /// Template miner state, loaded if present and rewritten after learning
    #[arg(long, value_name = "FILE", default_value = "drain_state.json")]
    state_file: PathBuf,

    /// Also write the aligned log rows as CSV
    #[arg(long, value_name = "CSV")]
    aligned_output: Option<PathBuf>,

    /// Config file (defaults to the per-user config if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG to override (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "LogTrace starting up (version {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let args = Args::parse();
    let config = PipelineConfig::load(args.config.as_deref()).context("Failed to load config")?;

    let persistence = FilePersistence::new(&args.state_file);
    let mut miner = DrainMiner::with_persistence(config.miner.clone(), Box::new(persistence))
        .with_context(|| format!("Failed to load template state {}", args.state_file.display()))?;

    let paths = PipelinePaths {
        log_file: args.log_file,
        execution_stats_file: args.execution_stats_file,
        output_file: args.output_file,
        aligned_output: args.aligned_output,
    };

    let summary = Pipeline::new(config, &mut miner)
        .with_start_line(args.read_from)
        .run(&paths)
        .context("Trace generation failed")?;

    tracing::info!(
        "Wrote {} traces ({} aligned rows, {} templates) to {}",
        summary.traces,
        summary.aligned_rows,
        miner.cluster_count(),
        paths.output_file.display()
    );
    Ok(())
}
