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
use crate::parser::line::WallClockTime;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;

/// Identifier of a test case as written in the execution ledger.
///
/// Ordered by its raw text, so `"10"` sorts before `"9"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TestId(String);

impl TestId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time span during which one test case ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionWindow {
    pub test_id: TestId,
    pub start: WallClockTime,
    pub end: WallClockTime,
}

impl ExecutionWindow {
    #[must_use]
    pub const fn new(test_id: TestId, start: WallClockTime, end: WallClockTime) -> Self {
        Self {
            test_id,
            start,
            end,
        }
    }

    /// Inclusive on both ends
    #[must_use]
    pub fn contains(&self, time: WallClockTime) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Parse an execution ledger.
///
/// Each record is `test_id,start_marker,end_marker[,...]`; the time of day
/// is the second whitespace-separated token of each marker. A test id seen
/// again replaces its earlier window. Windows come back in first-seen order.
pub fn parse_ledger(content: &str, path: &Path) -> Result<Vec<ExecutionWindow>> {
    let mut windows: IndexMap<TestId, ExecutionWindow> = IndexMap::new();

    for (index, record) in content.lines().enumerate() {
        let line_number = index + 1;
        if record.trim().is_empty() {
            continue;
        }

        let window = parse_record(record).map_err(|reason| TraceError::LedgerParse {
            path: path.to_path_buf(),
            line_number,
            reason,
        })?;

        if let Some(previous) = windows.insert(window.test_id.clone(), window) {
            log::warn!(
                "{}:{line_number}: test {} executed again, replacing window {}-{}",
                path.display(),
                previous.test_id,
                previous.start,
                previous.end
            );
        }
    }

    Ok(windows.into_values().collect())
}

fn parse_record(record: &str) -> std::result::Result<ExecutionWindow, String> {
    let fields: Vec<&str> = record.split(',').collect();
    let [test_id, start, end, ..] = fields.as_slice() else {
        return Err(format!(
            "expected at least 3 fields (test id, start, end), found {}",
            fields.len()
        ));
    };

    let test_id = test_id.trim();
    if test_id.is_empty() {
        return Err("empty test id".to_string());
    }

    Ok(ExecutionWindow {
        test_id: TestId::new(test_id),
        start: marker_time(start, "start")?,
        end: marker_time(end, "end")?,
    })
}

fn marker_time(marker: &str, which: &str) -> std::result::Result<WallClockTime, String> {
    let time = marker
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| format!("{which} marker {marker:?} has no time token"))?;
    WallClockTime::parse(time).map_err(|e| format!("{which} marker: {e}"))
}

/// Read and parse the execution ledger at `path`
pub fn load_execution_windows(path: &Path) -> Result<Vec<ExecutionWindow>> {
    let content = std::fs::read_to_string(path).map_err(|e| TraceError::io(path, e))?;
    let windows = parse_ledger(&content, path)?;
    log::info!("Loaded {} execution windows from {path:?}", windows.len());
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Vec<ExecutionWindow>> {
        parse_ledger(content, Path::new("stats.csv"))
    }

    #[test]
    fn test_parse_records() {
        let content = "\
3,2024-01-23 10:00:00.000,2024-01-23 10:05:00.000,12,GET /a
1,2024-01-23 10:06:00.000,2024-01-23 10:07:30.250
";
        let windows = parse(content).expect("ledger parses");
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].test_id.as_str(), "3");
        assert_eq!(windows[0].start.to_string(), "10:00:00.000");
        assert_eq!(windows[0].end.to_string(), "10:05:00.000");
        assert_eq!(windows[1].end.to_string(), "10:07:30.250");
    }

    #[test]
    fn test_duplicate_test_id_last_write_wins() {
        let content = "\
7,d 10:00:00.000,d 10:01:00.000
8,d 10:02:00.000,d 10:03:00.000
7,d 11:00:00.000,d 11:01:00.000
";
        let windows = parse(content).expect("ledger parses");
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].test_id.as_str(), "7");
        assert_eq!(windows[0].start.to_string(), "11:00:00.000");
    }

    #[test]
    fn test_too_few_fields() {
        let err = parse("1,d 10:00:00.000\n").expect_err("record is short");
        assert!(matches!(err, TraceError::LedgerParse { line_number: 1, .. }));
    }

    #[test]
    fn test_marker_without_time_token() {
        let content = "1,d 10:00:00.000,d 10:01:00.000\n2,10:02:00.000,d 10:03:00.000\n";
        let err = parse(content).expect_err("start marker lacks a second token");
        assert!(
            matches!(err, TraceError::LedgerParse { line_number: 2, ref reason, .. } if reason.contains("start")),
            "got {err}"
        );
    }

    #[test]
    fn test_unparseable_time() {
        let err = parse("1,d 10:00:00.000,d later\n").expect_err("bad end time");
        assert!(err.to_string().contains("end marker"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let windows = parse("\n1,d 10:00:00.000,d 10:01:00.000\n\n").expect("ledger parses");
        assert_eq!(windows.len(), 1);
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let window = ExecutionWindow::new(
            TestId::new("1"),
            WallClockTime::parse("10:00:00.000").expect("time"),
            WallClockTime::parse("10:05:00.000").expect("time"),
        );
        assert!(window.contains(window.start));
        assert!(window.contains(window.end));
        assert!(!window.contains(WallClockTime::parse("10:05:00.001").expect("time")));
    }

    #[test]
    fn test_test_id_ordering() {
        let mut ids: Vec<TestId> = ["10", "9", "b", "a", "100"].into_iter().map(TestId::new).collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(TestId::as_str).collect();
        assert_eq!(sorted, vec!["10", "100", "9", "a", "b"]);
    }
}
