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

use super::dialect::TimestampDialect;
use crate::error::{Result, TraceError};
use chrono::{NaiveTime, Timelike};
use std::fmt;

/// Time of day without a date, millisecond display precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallClockTime(NaiveTime);

impl WallClockTime {
    /// Parse `HH:MM:SS[.fff]`
    pub fn parse(s: &str) -> Result<Self> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
            .map(Self)
            .map_err(|source| TraceError::InvalidTimestamp {
                value: s.to_string(),
                source,
            })
    }

    #[must_use]
    pub fn from_hms_milli(hour: u32, min: u32, sec: u32, milli: u32) -> Option<Self> {
        NaiveTime::from_hms_milli_opt(hour, min, sec, milli).map(Self)
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    /// Move the hour component by `hours`, wrapping around midnight.
    /// Minutes, seconds and fractions stay untouched.
    #[must_use]
    pub fn shift_hours(self, hours: i64) -> Self {
        let hour = (i64::from(self.0.hour()) + hours).rem_euclid(24) as u32;
        // rem_euclid keeps the hour in 0..24, which with_hour always accepts
        Self(self.0.with_hour(hour).unwrap_or(self.0))
    }
}

impl fmt::Display for WallClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S%.3f"))
    }
}

/// Timestamp as cut out of a log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTimestamp {
    /// Timestamp text as constructed from the line's tokens
    pub text: String,
    pub time: WallClockTime,
    pub dialect: TimestampDialect,
}

/// One SUT log line that carried a usable timestamp and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLogEntry {
    /// 1-based line number in the source file
    pub line_number: usize,
    pub timestamp: LogTimestamp,
    pub message: String,
}

impl ParsedLogEntry {
    #[must_use]
    pub const fn time(&self) -> WallClockTime {
        self.timestamp.time
    }

    #[must_use]
    pub const fn dialect(&self) -> TimestampDialect {
        self.timestamp.dialect
    }
}
