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

use serde::{Deserialize, Serialize};

/// Set of keywords that must all occur in one line to signal that the
/// application finished starting up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadinessRule {
    pub keywords: Vec<String>,
}

impl ReadinessRule {
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn fires(&self, line: &str) -> bool {
        self.keywords.iter().all(|keyword| line.contains(keyword.as_str()))
    }
}

/// Startup banners of the frameworks commonly seen under test
#[must_use]
pub fn default_rules() -> Vec<ReadinessRule> {
    vec![
        // Spring Boot: "Started App in 3.2 seconds (JVM running for 4.1)"
        ReadinessRule::new(["Started ", " in ", " seconds (JVM running for ", "INFO"]),
        // Jetty: "INFO ... Started @1234ms"
        ReadinessRule::new(["INFO", "Started @", "ms"]),
        ReadinessRule::new(["+0000", "Server started"]),
    ]
}

/// Index of the first line after the readiness line, or 0 when no rule fires
#[must_use]
pub fn find_starting_point<'a, I>(lines: I, rules: &[ReadinessRule]) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .position(|line| !line.is_empty() && rules.iter().any(|rule| rule.fires(line)))
        .map_or(0, |index| index + 1)
}
