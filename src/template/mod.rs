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

pub mod drain;
pub mod masking;
pub mod persistence;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub use drain::{DrainMiner, MinerConfig};
pub use persistence::{FilePersistence, MemoryPersistence, Persistence};

/// Identifier of a message template, stable for a given template store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationId(pub u64);

impl fmt::Display for ClassificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stateful service grouping log messages into templates.
///
/// Calls happen strictly one after another. The store may evolve while
/// messages are observed; with an unchanged store, `classify` answers the
/// same message with the same id.
pub trait TemplateClassifier {
    /// Learn from a message, possibly creating or widening a template
    fn observe(&mut self, message: &str);

    /// Template id of a message
    fn classify(&mut self, message: &str) -> ClassificationId;

    /// Snapshot the current store under `label`
    fn persist(&mut self, label: &str) -> Result<()>;
}

/// Exact-match classifier: every distinct message is its own template.
///
/// Ids are handed out in first-seen order starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryClassifier {
    ids: HashMap<String, ClassificationId>,
    pub persisted_labels: Vec<String>,
}

impl InMemoryClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn id_for(&mut self, message: &str) -> ClassificationId {
        let next = ClassificationId(self.ids.len() as u64 + 1);
        *self.ids.entry(message.to_string()).or_insert(next)
    }

    #[must_use]
    pub fn template_count(&self) -> usize {
        self.ids.len()
    }
}

impl TemplateClassifier for InMemoryClassifier {
    fn observe(&mut self, message: &str) {
        self.id_for(message);
    }

    fn classify(&mut self, message: &str) -> ClassificationId {
        self.id_for(message)
    }

    fn persist(&mut self, label: &str) -> Result<()> {
        self.persisted_labels.push(label.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_ids_follow_first_sighting() {
        let mut classifier = InMemoryClassifier::new();
        classifier.observe("b");
        classifier.observe("a");
        classifier.observe("b");
        assert_eq!(classifier.classify("b"), ClassificationId(1));
        assert_eq!(classifier.classify("a"), ClassificationId(2));
        assert_eq!(classifier.classify("c"), ClassificationId(3));
        assert_eq!(classifier.template_count(), 3);
    }

    #[test]
    fn test_in_memory_persist_records_label() {
        let mut classifier = InMemoryClassifier::new();
        classifier.persist("intermediate state").expect("persist");
        assert_eq!(classifier.persisted_labels, vec!["intermediate state"]);
    }

    #[test]
    fn test_classification_id_display() {
        assert_eq!(ClassificationId(42).to_string(), "42");
    }
}
