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

use super::aligner::AlignedLog;
use super::ledger::TestId;
use crate::error::{Result, TraceError};
use crate::template::{ClassificationId, TemplateClassifier};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Template ids observed during one test, in log order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub test_id: TestId,
    pub sequence: Vec<ClassificationId>,
}

impl Trace {
    /// `<prefix> <length> <id> <id> ...`, without the newline
    #[must_use]
    pub fn to_line(&self, prefix: &str) -> String {
        let head = [prefix.to_string(), self.sequence.len().to_string()];
        head.into_iter()
            .chain(self.sequence.iter().map(ToString::to_string))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Classify the entries of every aligned test, in test id order
pub fn assemble_traces(aligned: &AlignedLog, classifier: &mut dyn TemplateClassifier) -> Vec<Trace> {
    aligned
        .tests()
        .iter()
        .map(|test| Trace {
            test_id: test.test_id().clone(),
            sequence: test
                .entries
                .iter()
                .map(|entry| classifier.classify(&entry.message))
                .collect(),
        })
        .collect()
}

pub fn write_traces<W: Write>(writer: &mut W, traces: &[Trace], prefix: &str) -> std::io::Result<()> {
    for trace in traces {
        writeln!(writer, "{}", trace.to_line(prefix))?;
    }
    Ok(())
}

/// Write one line per trace to `path`, replacing the file
pub fn write_trace_file(path: &Path, traces: &[Trace], prefix: &str) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| TraceError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_traces(&mut writer, traces, prefix)
        .and_then(|()| writer.flush())
        .map_err(|e| TraceError::io(path, e))?;

    log::info!("Wrote {} traces to {path:?}", traces.len());
    Ok(())
}

/// Dump the aligned rows as `test_id,start,end,log_timestamp,message`.
///
/// Tests without any entry get a single row with `None` placeholders.
pub fn write_aligned_rows<W: Write>(writer: &mut W, aligned: &AlignedLog) -> std::io::Result<()> {
    writeln!(writer, "test_id,start,end,log_timestamp,message")?;
    for test in aligned.tests() {
        let window = &test.window;
        if test.entries.is_empty() {
            writeln!(writer, "{},{},{},None,None", window.test_id, window.start, window.end)?;
            continue;
        }
        for entry in &test.entries {
            writeln!(
                writer,
                "{},{},{},{},{}",
                window.test_id,
                window.start,
                window.end,
                entry.timestamp.text,
                csv_field(&entry.message)
            )?;
        }
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
