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

//! Recovery of the semantic payload of a log line.
//!
//! Logger prefixes (timestamp, thread, level) vary per framework, so the
//! payload start is found heuristically by an ordered list of rules. Tokens
//! are scanned left to right and, for each token, the rules are tried in
//! list order; the first rule that fires decides where the payload starts.

/// A heuristic locating the start of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Payload starts at a token with at least `min_dots` dots, which is
    /// what a fully qualified logger/class name looks like.
    QualifiedName { min_dots: usize },
    /// Payload starts right after a token containing one of the markers.
    AfterSeverity { markers: &'static [&'static str] },
}

pub const SEVERITY_MARKERS: &[&str] = &["WARN", "INFO", "ERROR"];

pub const DEFAULT_RULES: &[ExtractionRule] = &[
    ExtractionRule::QualifiedName { min_dots: 2 },
    ExtractionRule::AfterSeverity {
        markers: SEVERITY_MARKERS,
    },
];

impl ExtractionRule {
    /// Index of the first payload token if this rule fires on `tokens[index]`
    fn payload_start(&self, token: &str, index: usize) -> Option<usize> {
        match self {
            Self::QualifiedName { min_dots } => {
                (token.matches('.').count() >= *min_dots).then_some(index)
            }
            Self::AfterSeverity { markers } => markers
                .iter()
                .any(|marker| token.contains(marker))
                .then_some(index + 1),
        }
    }
}

/// Outcome of running the rule list over a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Payload {
        rule: ExtractionRule,
        message: String,
    },
    NoRuleMatched,
}

impl Extraction {
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        match self {
            Self::Payload { message, .. } => Some(message),
            Self::NoRuleMatched => None,
        }
    }
}

/// Extract the payload of `line` with [`DEFAULT_RULES`]
#[must_use]
pub fn extract_message(line: &str) -> Extraction {
    extract_with_rules(line, DEFAULT_RULES)
}

#[must_use]
pub fn extract_with_rules(line: &str, rules: &[ExtractionRule]) -> Extraction {
    // Only the first physical line counts
    let first_line = line.lines().next().unwrap_or_default();
    let tokens: Vec<&str> = first_line.split_whitespace().collect();

    for (index, token) in tokens.iter().enumerate() {
        for rule in rules {
            if let Some(start) = rule.payload_start(token, index) {
                let message = tokens.get(start..).unwrap_or_default().join(" ");
                return Extraction::Payload {
                    rule: *rule,
                    message,
                };
            }
        }
    }

    Extraction::NoRuleMatched
}
