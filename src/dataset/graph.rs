use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::mode::EdgeMode;
use super::parse::{parse_edges, parse_nodes, parse_topics};

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub title: String,
    pub cluster: i64,
    pub external: bool,
    pub doi: Option<String>,
    pub has_doi: bool,
    pub degree: u32,
    pub pagerank: Option<f32>,
    pub topic: bool,
    pub terms: Vec<String>,
    pub year: Option<i32>,
}

impl Node {
    /// Case-insensitive substring match over title and terms. `query` must
    /// already be lowercase.
    pub fn contains_lowercase(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(query)
            || self
                .terms
                .iter()
                .any(|term| term.to_lowercase().contains(query))
    }

    pub fn search_text(&self) -> String {
        let mut text = self.title.clone();
        for term in &self.terms {
            text.push(' ');
            text.push_str(term);
        }
        text
    }
}

/// Endpoints are node indices into [`Dataset::nodes`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Topic {
    pub cluster: i64,
    pub top_terms: Vec<String>,
    pub size: usize,
    pub label: Option<String>,
}

impl Topic {
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None if self.top_terms.is_empty() => format!("Cluster {}", self.cluster),
            None => self
                .top_terms
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Structural graph data; immutable once loaded.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub nodes: Vec<Node>,
    pub topics: Vec<Topic>,
    index_by_id: HashMap<String, usize>,
    edge_sets: Vec<(EdgeMode, Vec<Edge>)>,
    has_edge_set_map: bool,
    raw_mode: Option<String>,
}

impl Dataset {
    /// Normalizes a raw dataset document. Never fails: anything missing or
    /// malformed is treated as empty.
    pub fn load(raw: &Value) -> Self {
        let Some(object) = raw.as_object() else {
            warn!("dataset root is not a JSON object; loading an empty graph");
            return Self::default();
        };

        let (nodes, needs_degree) = parse_nodes(object.get("nodes"));
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            index_by_id.insert(node.id.clone(), index);
        }

        let mut edge_sets = Vec::new();
        let edge_set_map = object.get("edgesets").and_then(Value::as_object);
        if let Some(map) = edge_set_map {
            for (key, value) in map {
                edge_sets.push((
                    EdgeMode::from_key(key),
                    parse_edges(Some(value), &index_by_id),
                ));
            }
        } else {
            edge_sets.push((
                EdgeMode::Edges,
                parse_edges(object.get("edges"), &index_by_id),
            ));
        }

        let mut dataset = Self {
            nodes,
            topics: parse_topics(object.get("topics")),
            index_by_id,
            edge_sets,
            has_edge_set_map: edge_set_map.is_some(),
            raw_mode: object
                .get("mode")
                .and_then(Value::as_str)
                .map(str::to_owned),
        };
        dataset.derive_missing_degrees(&needs_degree);

        debug!(
            nodes = dataset.nodes.len(),
            edge_sets = dataset.edge_sets.len(),
            topics = dataset.topics.len(),
            "dataset loaded"
        );
        dataset
    }

    pub fn from_json_str(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::load(&value),
            Err(error) => {
                warn!(%error, "dataset is not valid JSON; loading an empty graph");
                Self::default()
            }
        }
    }

    fn derive_missing_degrees(&mut self, needs_degree: &[bool]) {
        if !needs_degree.iter().any(|needed| *needed) {
            return;
        }

        let mut counts = vec![0u32; self.nodes.len()];
        for (_mode, edges) in &self.edge_sets {
            for edge in edges {
                counts[edge.source] += 1;
                if edge.target != edge.source {
                    counts[edge.target] += 1;
                }
            }
        }

        for (index, node) in self.nodes.iter_mut().enumerate() {
            if needs_degree.get(index).copied().unwrap_or(false) {
                node.degree = counts[index];
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.node_index(id).map(|index| &self.nodes[index])
    }

    pub fn edges(&self, mode: &EdgeMode) -> &[Edge] {
        self.edge_sets
            .iter()
            .find(|(key, _)| key == mode)
            .map(|(_, edges)| edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_mode(&self, mode: &EdgeMode) -> bool {
        self.edge_sets.iter().any(|(key, _)| key == mode)
    }

    /// Edge modes in display priority: known citation-like relations first,
    /// then remaining keys in input order.
    pub fn available_edge_keys(&self) -> Vec<EdgeMode> {
        if !self.has_edge_set_map {
            return vec![EdgeMode::Edges];
        }

        let mut keys = EdgeMode::PRIORITY
            .iter()
            .filter(|mode| self.has_mode(mode))
            .cloned()
            .collect::<Vec<_>>();
        keys.extend(
            self.edge_sets
                .iter()
                .map(|(mode, _)| mode)
                .filter(|mode| !mode.is_priority())
                .cloned(),
        );
        keys
    }

    /// The mode named by the dataset when available, else the first key.
    pub fn default_mode(&self) -> Option<EdgeMode> {
        let keys = self.available_edge_keys();
        self.raw_mode
            .as_deref()
            .map(EdgeMode::from_key)
            .filter(|mode| keys.contains(mode))
            .or_else(|| keys.into_iter().next())
    }

    pub fn topic(&self, cluster: i64) -> Option<&Topic> {
        self.topics.iter().find(|topic| topic.cluster == cluster)
    }

    /// Distinct cluster ids of non-external nodes, ascending.
    pub fn clusters(&self) -> Vec<i64> {
        let mut clusters = self
            .nodes
            .iter()
            .filter(|node| !node.external)
            .map(|node| node.cluster)
            .collect::<Vec<_>>();
        clusters.sort_unstable();
        clusters.dedup();
        clusters
    }

    /// Storage key for this dataset's saved layout, stable across runs for
    /// the same ordered id sequence.
    pub fn layout_key(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if index > 0 {
                hasher.update(b"\n");
            }
            hasher.update(node.id.as_bytes());
        }
        let hash = hasher.finalize();
        format!("layout:{}", &hash.to_hex()[..16])
    }
}
