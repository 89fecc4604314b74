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

use crate::parser::dialect::TimestampDialect;
use std::path::{Path, PathBuf};

/// Fatal failures of a trace run.
///
/// Per-line problems (unknown timestamp format, no extractable message, no
/// containing window) are not errors: those lines are counted and dropped.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// A line matched a dialect but its timestamp could not be built from it.
    #[error(
        "{}:{line_number}: matched {dialect} timestamp but construction failed: {raw:?}",
        .path.display()
    )]
    MalformedDialect {
        /// Log file the line came from, empty when parsing in-memory text
        path: PathBuf,
        line_number: usize,
        dialect: TimestampDialect,
        raw: String,
    },

    #[error("cannot construct a timestamp for a line without a recognized dialect: {raw:?}")]
    UnrecognizedDialect { raw: String },

    #[error("invalid time of day {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("{}:{line_number}: malformed execution record: {reason}", .path.display())]
    LedgerParse {
        path: PathBuf,
        line_number: usize,
        reason: String,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template state serialization error: {0}")]
    Persistence(#[from] serde_json::Error),

    #[error("invalid config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },
}

impl TraceError {
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the log file a per-line error came from
    #[must_use]
    pub fn in_file(mut self, file: &Path) -> Self {
        if let Self::MalformedDialect { path, .. } = &mut self {
            *path = file.to_path_buf();
        }
        self
    }
}

/// Result type for trace pipeline operations.
pub type Result<T> = std::result::Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_names_file_and_line() {
        let err = TraceError::LedgerParse {
            path: PathBuf::from("stats.csv"),
            line_number: 7,
            reason: "expected at least 3 fields, found 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("stats.csv:7"), "got: {msg}");
        assert!(msg.contains("3 fields"));
    }

    #[test]
    fn test_malformed_dialect_display() {
        let err = TraceError::MalformedDialect {
            path: PathBuf::new(),
            line_number: 12,
            dialect: TimestampDialect::Short,
            raw: "SUT: 99:99:99.999 oops".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with(":12:"), "got: {msg}");
        assert!(msg.contains("short"));
    }

    #[test]
    fn test_malformed_dialect_names_log_file() {
        let err = TraceError::MalformedDialect {
            path: PathBuf::new(),
            line_number: 3,
            dialect: TimestampDialect::Long,
            raw: "SUT: [x] 2024-01-23 10:00:00.000".to_string(),
        }
        .in_file(Path::new("sut.log"));
        let msg = err.to_string();
        assert!(msg.starts_with("sut.log:3:"), "got: {msg}");
    }

    #[test]
    fn test_in_file_keeps_other_errors() {
        let err = TraceError::UnrecognizedDialect {
            raw: "plain".to_string(),
        }
        .in_file(Path::new("sut.log"));
        assert!(matches!(err, TraceError::UnrecognizedDialect { .. }));
    }
}
