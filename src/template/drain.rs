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

//! Online template miner with a fixed-depth prefix tree.
//!
//! Messages are routed by token count, then by their leading tokens, to a
//! leaf holding candidate clusters. Within the leaf the most similar
//! template absorbs the message (differing positions become `<*>`) or a new
//! cluster is opened.

use super::masking::mask_message;
use super::persistence::{MinerSnapshot, Persistence};
use super::{ClassificationId, TemplateClassifier};
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const PARAM: &str = "<*>";

/// Tuning of the template miner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Minimum share of equal tokens for a message to join a cluster
    pub similarity_threshold: f64,
    /// Tree depth including the root and token-count levels (minimum 3)
    pub depth: usize,
    pub max_children: usize,
    /// Least recently used clusters are dropped beyond this count
    pub max_clusters: Option<usize>,
    /// Route tokens containing digits through the wildcard child
    pub parametrize_numeric_tokens: bool,
    pub extra_delimiters: Vec<String>,
    /// Mask numbers, hex values, UUIDs, URLs and IPs before mining
    pub masking: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.4,
            depth: 4,
            max_children: 100,
            max_clusters: None,
            parametrize_numeric_tokens: true,
            extra_delimiters: Vec::new(),
            masking: true,
        }
    }
}

/// One template and its bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogCluster {
    pub id: u64,
    pub template: Vec<String>,
    /// Child keys from the root to the leaf holding this cluster
    pub path: Vec<String>,
    pub size: u64,
    pub last_used: u64,
}

impl LogCluster {
    #[must_use]
    pub fn template_text(&self) -> String {
        self.template.join(" ")
    }
}

/// What observing a message did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterUpdate {
    Created,
    TemplateChanged,
    Unchanged,
}

#[derive(Debug, Default)]
struct Node {
    children: IndexMap<String, Node>,
    cluster_ids: Vec<u64>,
}

pub struct DrainMiner {
    config: MinerConfig,
    root: Node,
    clusters: IndexMap<u64, LogCluster>,
    next_id: u64,
    tick: u64,
    persistence: Option<Box<dyn Persistence>>,
}

impl DrainMiner {
    #[must_use]
    pub fn new(config: MinerConfig) -> Self {
        Self {
            config: MinerConfig {
                depth: config.depth.max(3),
                ..config
            },
            root: Node::default(),
            clusters: IndexMap::new(),
            next_id: 1,
            tick: 0,
            persistence: None,
        }
    }

    /// Create a miner backed by `persistence`, resuming from its last snapshot
    pub fn with_persistence(config: MinerConfig, persistence: Box<dyn Persistence>) -> Result<Self> {
        let snapshot = persistence.load()?;
        let mut miner = Self::new(config);
        if let Some(snapshot) = snapshot {
            miner.restore(snapshot);
        }
        miner.persistence = Some(persistence);
        Ok(miner)
    }

    fn restore(&mut self, snapshot: MinerSnapshot) {
        self.next_id = snapshot.next_id;
        for cluster in snapshot.clusters {
            self.tick = self.tick.max(cluster.last_used);
            let mut node = &mut self.root;
            for key in &cluster.path {
                node = node.children.entry(key.clone()).or_default();
            }
            node.cluster_ids.push(cluster.id);
            self.next_id = self.next_id.max(cluster.id + 1);
            self.clusters.insert(cluster.id, cluster);
        }
    }

    #[must_use]
    pub fn snapshot(&self, label: &str) -> MinerSnapshot {
        MinerSnapshot {
            label: label.to_string(),
            next_id: self.next_id,
            clusters: self.clusters.values().cloned().collect(),
        }
    }

    #[must_use]
    pub fn clusters(&self) -> impl Iterator<Item = &LogCluster> {
        self.clusters.values()
    }

    #[must_use]
    pub fn cluster(&self, id: u64) -> Option<&LogCluster> {
        self.clusters.get(&id)
    }

    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    fn tokenize(&self, message: &str) -> Vec<String> {
        let mut content = if self.config.masking {
            mask_message(message.trim())
        } else {
            message.trim().to_string()
        };
        for delimiter in &self.config.extra_delimiters {
            content = content.replace(delimiter.as_str(), " ");
        }
        content.split_whitespace().map(str::to_string).collect()
    }

    /// Learn from `message`, returning its cluster id and what changed
    pub fn add_log_message(&mut self, message: &str) -> (u64, ClusterUpdate) {
        let tokens = self.tokenize(message);
        self.tick += 1;

        let matched = self.tree_search(&tokens, self.config.similarity_threshold, false);
        let Some(id) = matched else {
            let id = self.create_cluster(tokens);
            log::trace!("New template {id}: {message}");
            return (id, ClusterUpdate::Created);
        };

        let tick = self.tick;
        let Some(cluster) = self.clusters.get_mut(&id) else {
            return (id, ClusterUpdate::Unchanged);
        };
        cluster.size += 1;
        cluster.last_used = tick;

        let merged = merge_template(&tokens, &cluster.template);
        if merged == cluster.template {
            (id, ClusterUpdate::Unchanged)
        } else {
            cluster.template = merged;
            (id, ClusterUpdate::TemplateChanged)
        }
    }

    /// Look up the cluster of `message` without learning from it.
    ///
    /// Only templates matching every non-wildcard token qualify.
    #[must_use]
    pub fn match_message(&self, message: &str) -> Option<u64> {
        let tokens = self.tokenize(message);
        self.tree_search(&tokens, 1.0, true)
    }

    const fn max_node_depth(&self) -> usize {
        self.config.depth - 2
    }

    fn tree_search(&self, tokens: &[String], threshold: f64, include_params: bool) -> Option<u64> {
        let mut node = self.root.children.get(&tokens.len().to_string())?;

        if tokens.is_empty() {
            return node
                .cluster_ids
                .iter()
                .copied()
                .find(|id| self.clusters.contains_key(id));
        }

        let mut depth = 1;
        for token in tokens {
            if depth >= self.max_node_depth() || depth == tokens.len() {
                break;
            }
            node = node
                .children
                .get(token.as_str())
                .or_else(|| node.children.get(PARAM))?;
            depth += 1;
        }

        self.fast_match(&node.cluster_ids, tokens, threshold, include_params)
    }

    fn fast_match(
        &self,
        candidates: &[u64],
        tokens: &[String],
        threshold: f64,
        include_params: bool,
    ) -> Option<u64> {
        let mut best: Option<(u64, f64, usize)> = None;

        for cluster in candidates.iter().filter_map(|id| self.clusters.get(id)) {
            let (similarity, params) = sequence_similarity(&cluster.template, tokens, include_params);
            let better = best.is_none_or(|(_, best_sim, best_params)| {
                similarity > best_sim || (similarity == best_sim && params > best_params)
            });
            if better {
                best = Some((cluster.id, similarity, params));
            }
        }

        best.filter(|(_, similarity, _)| *similarity >= threshold)
            .map(|(id, _, _)| id)
    }

    fn create_cluster(&mut self, tokens: Vec<String>) -> u64 {
        if let Some(limit) = self.config.max_clusters {
            while limit > 0 && self.clusters.len() >= limit {
                self.evict_least_recently_used();
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        let path = self.insert_into_tree(id, &tokens);
        self.clusters.insert(
            id,
            LogCluster {
                id,
                template: tokens,
                path,
                size: 1,
                last_used: self.tick,
            },
        );
        id
    }

    fn evict_least_recently_used(&mut self) {
        let victim = self
            .clusters
            .values()
            .min_by_key(|cluster| (cluster.last_used, cluster.id))
            .map(|cluster| cluster.id);
        if let Some(id) = victim {
            log::debug!("Evicting template {id}, cluster limit reached");
            self.clusters.shift_remove(&id);
        }
    }

    /// Place a new cluster in the prefix tree and return the keys it went through
    fn insert_into_tree(&mut self, id: u64, tokens: &[String]) -> Vec<String> {
        let max_node_depth = self.max_node_depth();
        let max_children = self.config.max_children;
        let parametrize = self.config.parametrize_numeric_tokens;
        let live = &self.clusters;

        let length_key = tokens.len().to_string();
        let mut path = vec![length_key.clone()];
        let mut node = self.root.children.entry(length_key).or_default();

        let mut depth = 1;
        for token in tokens {
            if depth >= max_node_depth || depth >= tokens.len() {
                break;
            }

            let key = if node.children.contains_key(token.as_str()) {
                token.clone()
            } else if parametrize && token.chars().any(|c| c.is_ascii_digit()) {
                PARAM.to_string()
            } else if node.children.contains_key(PARAM) {
                if node.children.len() < max_children {
                    token.clone()
                } else {
                    PARAM.to_string()
                }
            } else if node.children.len() + 1 < max_children {
                token.clone()
            } else {
                PARAM.to_string()
            };

            node = node.children.entry(key.clone()).or_default();
            path.push(key);
            depth += 1;
        }

        // Drop ids of evicted clusters while we are here
        node.cluster_ids.retain(|existing| live.contains_key(existing));
        node.cluster_ids.push(id);
        path
    }
}

impl TemplateClassifier for DrainMiner {
    fn observe(&mut self, message: &str) {
        let (id, update) = self.add_log_message(message);
        if update == ClusterUpdate::TemplateChanged {
            if let Some(cluster) = self.clusters.get(&id) {
                log::trace!("Template {id} widened to: {}", cluster.template_text());
            }
        }
    }

    fn classify(&mut self, message: &str) -> ClassificationId {
        if let Some(id) = self.match_message(message) {
            return ClassificationId(id);
        }
        // Never observed: learn it so every message gets an id
        log::debug!("No template matches {message:?}, learning it");
        ClassificationId(self.add_log_message(message).0)
    }

    fn persist(&mut self, label: &str) -> Result<()> {
        let snapshot = self.snapshot(label);
        self.persistence.as_mut().map_or_else(
            || {
                log::debug!("No persistence configured, state '{label}' kept in memory only");
                Ok(())
            },
            |persistence| persistence.save(&snapshot),
        )
    }
}

/// Share of equal positions between a template and a token sequence, and
/// the number of wildcards in the template
fn sequence_similarity(template: &[String], tokens: &[String], include_params: bool) -> (f64, usize) {
    if template.is_empty() {
        return (1.0, 0);
    }

    let mut equal = 0;
    let mut params = 0;
    for (expected, token) in template.iter().zip(tokens) {
        if expected == PARAM {
            params += 1;
        } else if expected == token {
            equal += 1;
        }
    }
    if include_params {
        equal += params;
    }

    (equal as f64 / template.len() as f64, params)
}

fn merge_template(tokens: &[String], template: &[String]) -> Vec<String> {
    tokens
        .iter()
        .zip(template)
        .map(|(token, expected)| {
            if token == expected {
                token.clone()
            } else {
                PARAM.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MemoryPersistence;

    fn miner() -> DrainMiner {
        DrainMiner::new(MinerConfig::default())
    }

    #[test]
    fn test_similar_messages_share_cluster() {
        let mut miner = miner();
        let (a, update_a) = miner.add_log_message("Dispatching request to handler users");
        let (b, update_b) = miner.add_log_message("Dispatching request to handler orders");
        assert_eq!(update_a, ClusterUpdate::Created);
        assert_eq!(update_b, ClusterUpdate::TemplateChanged);
        assert_eq!(a, b);
        assert_eq!(
            miner.cluster(a).map(LogCluster::template_text).as_deref(),
            Some("Dispatching request to handler <*>")
        );
    }

    #[test]
    fn test_masked_values_do_not_split_templates() {
        let mut miner = miner();
        let (a, _) = miner.add_log_message("GET /users/12 answered in 15 ms");
        let (b, update) = miner.add_log_message("GET /users/12 answered in 230 ms");
        assert_eq!(a, b);
        assert_eq!(update, ClusterUpdate::Unchanged);
    }

    #[test]
    fn test_different_lengths_never_merge() {
        let mut miner = miner();
        let (a, _) = miner.add_log_message("connection opened");
        let (b, _) = miner.add_log_message("connection opened twice");
        assert_ne!(a, b);
        assert_eq!(miner.cluster_count(), 2);
    }

    #[test]
    fn test_dissimilar_messages_split() {
        let mut miner = miner();
        let (a, _) = miner.add_log_message("alpha beta gamma delta epsilon");
        let (b, _) = miner.add_log_message("alpha one two three four");
        assert_ne!(a, b, "only 1 of 5 tokens equal, below threshold");
    }

    #[test]
    fn test_classify_is_stable_without_mutation() {
        let mut miner = miner();
        miner.observe("Saved entity Order with id 7");
        miner.observe("Saved entity Order with id 8");
        let first = miner.classify("Saved entity Order with id 9");
        let count = miner.cluster_count();
        let second = miner.classify("Saved entity Order with id 9");
        assert_eq!(first, second);
        assert_eq!(miner.cluster_count(), count);
    }

    #[test]
    fn test_classify_unknown_learns_it() {
        let mut miner = miner();
        miner.observe("known message here");
        let id = miner.classify("completely novel text");
        assert_eq!(id, ClassificationId(2));
        assert_eq!(miner.cluster_count(), 2);
    }

    #[test]
    fn test_empty_message() {
        let mut miner = miner();
        let (a, _) = miner.add_log_message("");
        let (b, _) = miner.add_log_message("   ");
        assert_eq!(a, b);
        assert_eq!(miner.match_message(""), Some(a));
    }

    #[test]
    fn test_max_clusters_evicts_least_recent() {
        let mut miner = DrainMiner::new(MinerConfig {
            max_clusters: Some(2),
            ..MinerConfig::default()
        });
        let (first, _) = miner.add_log_message("one");
        let (second, _) = miner.add_log_message("two words");
        miner.add_log_message("one");
        let (third, _) = miner.add_log_message("three whole words");
        assert_eq!(miner.cluster_count(), 2);
        assert!(miner.cluster(first).is_some());
        assert!(miner.cluster(second).is_none());
        assert!(miner.cluster(third).is_some());
    }

    #[test]
    fn test_persist_and_resume() {
        let mut persistence = MemoryPersistence::default();
        let mut miner = miner();
        miner.observe("Started order service on port 8080");
        miner.observe("Order 5 created");
        persistence
            .save(&miner.snapshot("intermediate state"))
            .expect("save");

        let mut resumed = DrainMiner::with_persistence(MinerConfig::default(), Box::new(persistence))
            .expect("resume");
        assert_eq!(resumed.cluster_count(), 2);
        assert_eq!(resumed.classify("Order 6 created"), ClassificationId(2));
        // New templates continue after the restored ids
        assert_eq!(resumed.classify("brand new template"), ClassificationId(3));
    }

    #[test]
    fn test_max_children_routes_to_wildcard() {
        let mut miner = DrainMiner::new(MinerConfig {
            max_children: 2,
            depth: 5,
            ..MinerConfig::default()
        });
        miner.add_log_message("alpha x y z");
        miner.add_log_message("beta x y z");
        miner.add_log_message("gamma x y z");
        let length_node = miner.root.children.get("4").expect("length node");
        assert!(length_node.children.contains_key(PARAM));
        assert!(length_node.children.len() <= 2);
    }

    #[test]
    fn test_sequence_similarity() {
        let template: Vec<String> = ["a", "<*>", "c"].iter().map(|s| (*s).to_string()).collect();
        let tokens: Vec<String> = ["a", "b", "d"].iter().map(|s| (*s).to_string()).collect();
        let (sim, params) = sequence_similarity(&template, &tokens, false);
        assert!((sim - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(params, 1);
        let (sim, _) = sequence_similarity(&template, &tokens, true);
        assert!((sim - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_persist_without_backend_is_noop() {
        let mut miner = miner();
        miner.observe("user alice logged in");
        miner.persist("intermediate state").expect("persist succeeds");
        assert_eq!(miner.cluster_count(), 1);
    }

    #[test]
    fn test_best_candidate_then_lower_id_on_ties() {
        let mut miner = miner();
        let (first, _) = miner.add_log_message("alpha one done");
        let (second, _) = miner.add_log_message("beta two done");
        assert_ne!(first, second);
        let candidates = [first, second];
        let tokens: Vec<String> = ["gamma", "two", "done"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(miner.fast_match(&candidates, &tokens, 0.0, false), Some(second));
        let tokens: Vec<String> = ["gamma", "six", "done"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(miner.fast_match(&candidates, &tokens, 0.0, false), Some(first));
    }
}
