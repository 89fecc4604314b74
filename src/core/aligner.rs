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

//! Attribution of parsed log entries to the test executions they happened in.
//!
//! Log sources writing long timestamps may run on a clock that is whole
//! hours away from the harness (another machine or timezone). For those the
//! hour is corrected against the window end before comparing. Minutes and
//! seconds are never corrected.

use super::ledger::{ExecutionWindow, TestId};
use crate::parser::line::{ParsedLogEntry, WallClockTime};

/// Log entries attributed to one test execution, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedTest {
    pub window: ExecutionWindow,
    pub entries: Vec<ParsedLogEntry>,
}

impl AlignedTest {
    #[must_use]
    pub const fn test_id(&self) -> &TestId {
        &self.window.test_id
    }
}

/// A log entry together with the window it was attributed to
#[derive(Debug, Clone, Copy)]
pub struct AlignedEntry<'a> {
    pub window: &'a ExecutionWindow,
    pub entry: &'a ParsedLogEntry,
}

/// Result of alignment: one [`AlignedTest`] per window, sorted by test id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignedLog {
    tests: Vec<AlignedTest>,
    unmatched: usize,
}

impl AlignedLog {
    #[must_use]
    pub fn tests(&self) -> &[AlignedTest] {
        &self.tests
    }

    #[must_use]
    pub fn get(&self, test_id: &TestId) -> Option<&AlignedTest> {
        self.tests
            .binary_search_by(|test| test.test_id().cmp(test_id))
            .ok()
            .map(|index| &self.tests[index])
    }

    /// All (window, entry) pairs, by test id and then file order
    #[must_use]
    pub fn rows(&self) -> impl Iterator<Item = AlignedEntry<'_>> {
        self.tests.iter().flat_map(|test| {
            test.entries.iter().map(move |entry| AlignedEntry {
                window: &test.window,
                entry,
            })
        })
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.tests.iter().map(|test| test.entries.len()).sum()
    }

    /// Entries that fell into no window
    #[must_use]
    pub const fn unmatched(&self) -> usize {
        self.unmatched
    }
}

/// Time of `entry` as seen from the harness clock for `window`
#[must_use]
pub fn harness_time(entry: &ParsedLogEntry, window: &ExecutionWindow) -> WallClockTime {
    let time = entry.time();
    if entry.dialect().shares_harness_clock() {
        return time;
    }

    let hours_diff = i64::from(window.end.hour()) - i64::from(time.hour());
    time.shift_hours(hours_diff)
}

/// Attribute every entry to every window containing it.
///
/// An entry inside overlapping windows lands in each of them; an entry
/// inside none is dropped. Every window yields an [`AlignedTest`], possibly
/// empty.
#[must_use]
pub fn align(entries: &[ParsedLogEntry], windows: &[ExecutionWindow]) -> AlignedLog {
    let align_start = std::time::Instant::now();
    let mut matched = vec![false; entries.len()];

    let mut tests: Vec<AlignedTest> = windows
        .iter()
        .map(|window| {
            let aligned = entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| window.contains(harness_time(entry, window)))
                .map(|(index, entry)| {
                    matched[index] = true;
                    entry.clone()
                })
                .collect();
            AlignedTest {
                window: window.clone(),
                entries: aligned,
            }
        })
        .collect();

    tests.sort_by(|a, b| a.test_id().cmp(b.test_id()));

    let unmatched = matched.iter().filter(|hit| !**hit).count();
    let aligned = AlignedLog { tests, unmatched };

    log::info!(
        "Alignment took {:?}: {} rows over {} tests, {} entries outside every window",
        align_start.elapsed(),
        aligned.row_count(),
        aligned.tests.len(),
        unmatched
    );

    aligned
}
