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

use super::line::{LogTimestamp, WallClockTime};
use crate::error::{Result, TraceError};
use fancy_regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

// INFO [2024-01-23 12:34:56.789] ...
static LONG_INFO_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" \[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}[.,]\d{3}\]").expect("valid regex literal")
});

// 2024-01-23 12:34:56 +0000 INFO ...
static LONG_WITH_TIMEZONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} [+-]\d{4}").expect("valid regex literal")
});

// 2024-01-23 12:34:56.789 [main] INFO ...
static LONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}").expect("valid regex literal")
});

// 12:34:56.789 [main] INFO ...
static SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}:\d{2}:\d{2}\.\d{3}").expect("valid regex literal"));

/// Textual timestamp convention of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampDialect {
    /// `HH:MM:SS.mmm`, time of day only
    Short,
    /// `YYYY-MM-DD HH:MM:SS.mmm`
    Long,
    /// Log level first, then `[YYYY-MM-DD HH:MM:SS.mmm]`
    LongInfoFirst,
    /// `YYYY-MM-DD HH:MM:SS +ZZZZ`
    LongWithTimezone,
    Unrecognized,
}

impl TimestampDialect {
    #[must_use]
    pub const fn is_recognized(self) -> bool {
        !matches!(self, Self::Unrecognized)
    }

    /// Whether the time of day can be compared against the harness clock as is.
    ///
    /// The other dialects come from sources whose clock may sit whole hours
    /// away from the harness and go through hour drift correction first.
    #[must_use]
    pub const fn shares_harness_clock(self) -> bool {
        matches!(self, Self::Short | Self::LongWithTimezone)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
            Self::LongInfoFirst => "long-info-first",
            Self::LongWithTimezone => "long-with-timezone",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for TimestampDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify the timestamp dialect of a raw line.
///
/// The more specific patterns are tried first: every long variant contains a
/// substring that also matches the short pattern.
#[must_use]
pub fn detect_dialect(line: &str) -> TimestampDialect {
    let checks: [(&Regex, TimestampDialect); 4] = [
        (&*LONG_INFO_FIRST, TimestampDialect::LongInfoFirst),
        (&*LONG_WITH_TIMEZONE, TimestampDialect::LongWithTimezone),
        (&*LONG, TimestampDialect::Long),
        (&*SHORT, TimestampDialect::Short),
    ];

    checks
        .into_iter()
        .find(|(pattern, _)| pattern.is_match(line).unwrap_or(false))
        .map_or(TimestampDialect::Unrecognized, |(_, dialect)| dialect)
}

/// Build the timestamp of a line whose dialect is already known.
///
/// The timestamp is cut out by token position, so a line that matched a
/// dialect but does not carry the timestamp at the expected position is a
/// [`TraceError::MalformedDialect`].
pub fn construct_timestamp(
    line: &str,
    dialect: TimestampDialect,
    line_number: usize,
) -> Result<LogTimestamp> {
    let malformed = || TraceError::MalformedDialect {
        path: PathBuf::new(),
        line_number,
        dialect,
        raw: line.to_string(),
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let text = match dialect {
        TimestampDialect::Short => tokens.get(1).map(|t| (*t).to_string()),
        TimestampDialect::Long => tokens.get(1..3).map(|t| t.join(" ")),
        TimestampDialect::LongWithTimezone => tokens.get(1..4).map(|t| t.join(" ")),
        TimestampDialect::LongInfoFirst => line
            .split_once(" [")
            .and_then(|(_, rest)| rest.split_once(']'))
            .map(|(inner, _)| inner.replace(',', ".")),
        TimestampDialect::Unrecognized => {
            return Err(TraceError::UnrecognizedDialect {
                raw: line.to_string(),
            })
        }
    }
    .ok_or_else(malformed)?;

    let time_of_day = time_of_day_text(&text, dialect).ok_or_else(malformed)?;
    let time = WallClockTime::parse(&time_of_day).map_err(|_| malformed())?;

    Ok(LogTimestamp {
        text,
        time,
        dialect,
    })
}

/// Locate the time-of-day part of a constructed timestamp.
fn time_of_day_text(text: &str, dialect: TimestampDialect) -> Option<String> {
    match dialect {
        TimestampDialect::Short => Some(text.to_string()),
        TimestampDialect::Long | TimestampDialect::LongInfoFirst => {
            text.split(' ').nth(1).map(str::to_string)
        }
        // Second resolution only; the zone offset is not applied
        TimestampDialect::LongWithTimezone => {
            text.split(' ').nth(1).map(|t| format!("{t}.000"))
        }
        TimestampDialect::Unrecognized => None,
    }
}
