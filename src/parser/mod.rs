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

pub mod dialect;
pub mod line;
pub mod message;
pub mod readiness;

use crate::error::{Result, TraceError};
use dialect::{construct_timestamp, detect_dialect};
use line::ParsedLogEntry;
use message::{extract_with_rules, Extraction, ExtractionRule, DEFAULT_RULES};
use readiness::{find_starting_point, ReadinessRule};
use std::path::Path;

/// How a log file is scanned
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Substring that marks a line as emitted by the system under test
    pub sut_marker: String,
    pub readiness_rules: Vec<ReadinessRule>,
    /// 0-based index of the first line to consider; bypasses the readiness scan
    pub start_line: Option<usize>,
    pub extraction_rules: &'static [ExtractionRule],
    pub progress_interval: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            sut_marker: "SUT: ".to_string(),
            readiness_rules: readiness::default_rules(),
            start_line: None,
            extraction_rules: DEFAULT_RULES,
            progress_interval: 500,
        }
    }
}

/// Counters of lines the parser passed over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub preamble: usize,
    pub without_marker: usize,
    pub without_timestamp: usize,
    pub without_message: usize,
    pub parsed: usize,
}

/// Forward-only parser over the lines of one log file.
///
/// Yields one [`ParsedLogEntry`] per SUT line with a recognized timestamp and
/// an extractable message. Any other line is skipped. A line whose dialect
/// was detected but whose timestamp cannot be built ends the iteration with
/// an error.
pub struct LogLineParser<'a> {
    lines: std::iter::Skip<std::iter::Enumerate<std::str::Lines<'a>>>,
    options: &'a ParseOptions,
    source: &'a Path,
    stats: ParseStats,
    failed: bool,
}

impl<'a> LogLineParser<'a> {
    #[must_use]
    pub fn new(content: &'a str, options: &'a ParseOptions) -> Self {
        let starting_point = options.start_line.unwrap_or_else(|| {
            let point = find_starting_point(content.lines(), &options.readiness_rules);
            if point == 0 {
                log::warn!("No application readiness line found, reading from the top");
            } else {
                log::info!("Application ready at line {point}, reading SUT output after it");
            }
            point
        });

        Self {
            lines: content.lines().enumerate().skip(starting_point),
            options,
            source: Path::new(""),
            stats: ParseStats {
                preamble: starting_point,
                ..ParseStats::default()
            },
            failed: false,
        }
    }

    /// Name the file the content was read from in errors
    #[must_use]
    pub const fn with_source(mut self, path: &'a Path) -> Self {
        self.source = path;
        self
    }

    #[must_use]
    pub const fn stats(&self) -> ParseStats {
        self.stats
    }

    fn parse_line(
        options: &ParseOptions,
        stats: &mut ParseStats,
        raw: &str,
        line_number: usize,
    ) -> Option<Result<ParsedLogEntry>> {
        if raw.is_empty() || !raw.contains(options.sut_marker.as_str()) {
            stats.without_marker += 1;
            return None;
        }

        let dialect = detect_dialect(raw);
        if !dialect.is_recognized() {
            log::trace!("Line {line_number}: no timestamp dialect recognized");
            stats.without_timestamp += 1;
            return None;
        }

        let timestamp = match construct_timestamp(raw, dialect, line_number) {
            Ok(timestamp) => timestamp,
            Err(e) => return Some(Err(e)),
        };

        match extract_with_rules(raw, options.extraction_rules) {
            Extraction::Payload { message, .. } => {
                stats.parsed += 1;
                Some(Ok(ParsedLogEntry {
                    line_number,
                    timestamp,
                    message,
                }))
            }
            Extraction::NoRuleMatched => {
                log::debug!("Line {line_number}: no message extraction rule matched");
                stats.without_message += 1;
                None
            }
        }
    }
}

impl Iterator for LogLineParser<'_> {
    type Item = Result<ParsedLogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        for (index, raw) in self.lines.by_ref() {
            let line_number = index + 1;
            if self.options.progress_interval > 0 && line_number % self.options.progress_interval == 0
            {
                log::debug!(
                    "Parsing log... ({line_number} lines, {} entries)",
                    self.stats.parsed
                );
            }

            if let Some(result) = Self::parse_line(self.options, &mut self.stats, raw, line_number) {
                self.failed = result.is_err();
                let source = self.source;
                return Some(result.map_err(|e| e.in_file(source)));
            }
        }

        None
    }
}

/// Read and parse a whole log file.
///
/// The file is decoded lossily so stray non-UTF-8 bytes do not abort a run.
pub fn parse_log_file(path: &Path, options: &ParseOptions) -> Result<Vec<ParsedLogEntry>> {
    let parse_start = std::time::Instant::now();
    let buffer = std::fs::read(path).map_err(|e| TraceError::io(path, e))?;
    let content = String::from_utf8_lossy(&buffer);

    let mut parser = LogLineParser::new(&content, options).with_source(path);
    let entries = parser.by_ref().collect::<Result<Vec<_>>>()?;
    let stats = parser.stats();

    log::info!(
        "Parsing took {:?}: {} entries from {:?} (skipped {} preamble, {} non-SUT, {} without timestamp, {} without message)",
        parse_start.elapsed(),
        entries.len(),
        path,
        stats.preamble,
        stats.without_marker,
        stats.without_timestamp,
        stats.without_message
    );

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialect::TimestampDialect;
    use std::io::Write;

    const LOG: &str = "\
SUT: 09:59:58.000 [main] INFO c.e.App - Starting App
SUT: 09:59:59.000 [main] INFO c.e.App - Started App in 3.2 seconds (JVM running for 4.1)
SUT: 10:00:01.000 [http-1] INFO c.e.Api - GET /users 200
10:00:01.500 [harness] INFO driver step without marker
SUT: no timestamp here INFO still skipped
SUT: 10:00:02.000 [http-1] DEBUG nothing to extract
SUT: INFO [2024-01-23 10:00:03,250] request handled
";

    #[test]
    fn test_parses_after_readiness() {
        let options = ParseOptions::default();
        let entries: Vec<_> = LogLineParser::new(LOG, &options)
            .collect::<Result<_>>()
            .expect("log should parse");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line_number, 3);
        assert_eq!(entries[0].message, "c.e.Api - GET /users 200");
        assert_eq!(entries[0].dialect(), TimestampDialect::Short);
        assert_eq!(entries[1].line_number, 7);
        assert_eq!(entries[1].dialect(), TimestampDialect::LongInfoFirst);
        assert_eq!(entries[1].time().to_string(), "10:00:03.250");
    }

    #[test]
    fn test_stats_count_skips() {
        let options = ParseOptions::default();
        let mut parser = LogLineParser::new(LOG, &options);
        let count = parser.by_ref().filter(Result::is_ok).count();
        let stats = parser.stats();
        assert_eq!(count, 2);
        assert_eq!(stats.preamble, 2);
        assert_eq!(stats.without_marker, 1);
        assert_eq!(stats.without_timestamp, 1);
        assert_eq!(stats.without_message, 1);
        assert_eq!(stats.parsed, 2);
    }

    #[test]
    fn test_start_line_override() {
        let options = ParseOptions {
            start_line: Some(0),
            ..ParseOptions::default()
        };
        let entries: Vec<_> = LogLineParser::new(LOG, &options)
            .collect::<Result<_>>()
            .expect("log should parse");
        // The startup lines themselves are now included
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].line_number, 1);
    }

    #[test]
    fn test_start_line_past_end() {
        let options = ParseOptions {
            start_line: Some(100),
            ..ParseOptions::default()
        };
        assert_eq!(LogLineParser::new(LOG, &options).count(), 0);
    }

    #[test]
    fn test_marker_required_even_with_timestamp() {
        let options = ParseOptions {
            start_line: Some(0),
            ..ParseOptions::default()
        };
        let log = "12:00:00.000 [main] INFO c.e.Foo - not from the SUT\n";
        assert_eq!(LogLineParser::new(log, &options).count(), 0);
    }

    #[test]
    fn test_malformed_dialect_stops_iteration() {
        let options = ParseOptions {
            start_line: Some(0),
            ..ParseOptions::default()
        };
        let log = "\
SUT: 12:00:00.000 [main] INFO c.e.Foo - ok
SUT: [main] 12:00:01.000 INFO c.e.Foo - timestamp not at token 1
SUT: 12:00:02.000 [main] INFO c.e.Foo - never reached
";
        let results: Vec<_> = LogLineParser::new(log, &options).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(TraceError::MalformedDialect { line_number: 2, .. })
        ));
    }

    #[test]
    fn test_parse_log_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(LOG.as_bytes()).expect("write log");
        let entries =
            parse_log_file(file.path(), &ParseOptions::default()).expect("file should parse");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parse_log_file_names_file_on_malformed_line() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"SUT: [main] 10:00:00.000 INFO c.e.Api - timestamp out of place\n")
            .expect("write log");
        let options = ParseOptions {
            start_line: Some(0),
            ..ParseOptions::default()
        };
        let err = parse_log_file(file.path(), &options).expect_err("malformed line is fatal");
        assert!(
            matches!(&err, TraceError::MalformedDialect { path, line_number: 1, .. } if path == file.path()),
            "got {err:?}"
        );
        assert!(err.to_string().starts_with(&format!("{}:1:", file.path().display())));
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse_log_file(Path::new("/nonexistent/app.log"), &ParseOptions::default());
        assert!(matches!(result, Err(TraceError::Io { .. })));
    }
}
