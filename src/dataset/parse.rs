use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::graph::{Edge, Node, Topic};

#[derive(Clone, Debug, Deserialize)]
struct RawNode {
    id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    cluster: Option<Value>,
    #[serde(default)]
    external: Option<bool>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default, rename = "hasDoi")]
    has_doi: Option<bool>,
    #[serde(default)]
    degree: Option<f64>,
    #[serde(default)]
    pagerank: Option<f64>,
    #[serde(default)]
    topic: Option<bool>,
    #[serde(default)]
    terms: Vec<String>,
    #[serde(default)]
    year: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawEdge {
    source: Value,
    target: Value,
    #[serde(default)]
    weight: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawTopic {
    cluster: Value,
    #[serde(default, alias = "topTerms")]
    top_terms: Vec<String>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    label: Option<String>,
}

pub(super) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Parses node records, skipping malformed entries and duplicate ids.
/// The second element flags nodes whose degree must be derived from edges.
pub(super) fn parse_nodes(value: Option<&Value>) -> (Vec<Node>, Vec<bool>) {
    let Some(entries) = value.and_then(Value::as_array) else {
        return (Vec::new(), Vec::new());
    };

    let mut nodes = Vec::with_capacity(entries.len());
    let mut needs_degree = Vec::with_capacity(entries.len());
    let mut seen = HashSet::with_capacity(entries.len());
    let mut skipped = 0usize;

    for entry in entries {
        let Ok(raw) = RawNode::deserialize(entry) else {
            skipped += 1;
            continue;
        };
        let Some(id) = id_from_value(&raw.id) else {
            skipped += 1;
            continue;
        };
        if !seen.insert(id.clone()) {
            skipped += 1;
            continue;
        }

        let doi = raw
            .doi
            .map(|doi| doi.trim().to_owned())
            .filter(|doi| !doi.is_empty());
        let has_doi = raw.has_doi.unwrap_or(doi.is_some());
        let degree = raw
            .degree
            .filter(|degree| degree.is_finite() && *degree >= 0.0)
            .map(|degree| degree.round() as u32);

        needs_degree.push(degree.is_none());
        nodes.push(Node {
            title: raw
                .title
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| id.clone()),
            id,
            cluster: raw.cluster.as_ref().and_then(int_from_value).unwrap_or(0),
            external: raw.external.unwrap_or(false),
            doi,
            has_doi,
            degree: degree.unwrap_or(0),
            pagerank: raw
                .pagerank
                .filter(|rank| rank.is_finite())
                .map(|rank| rank as f32),
            topic: raw.topic.unwrap_or(false),
            terms: raw.terms,
            year: raw
                .year
                .as_ref()
                .and_then(int_from_value)
                .and_then(|year| i32::try_from(year).ok()),
        });
    }

    if skipped > 0 {
        debug!(skipped, "skipped malformed or duplicate nodes");
    }

    (nodes, needs_degree)
}

/// Parses one edge list, dropping entries whose endpoints are unknown.
pub(super) fn parse_edges(value: Option<&Value>, index_by_id: &HashMap<String, usize>) -> Vec<Edge> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut dropped = 0usize;
    let edges = entries
        .iter()
        .filter_map(|entry| {
            let resolved = RawEdge::deserialize(entry).ok().and_then(|raw| {
                let source = index_by_id.get(&id_from_value(&raw.source)?).copied()?;
                let target = index_by_id.get(&id_from_value(&raw.target)?).copied()?;
                let weight = raw
                    .weight
                    .filter(|weight| weight.is_finite())
                    .unwrap_or(1.0)
                    .max(1.0) as f32;
                Some(Edge {
                    source,
                    target,
                    weight,
                })
            });
            if resolved.is_none() {
                dropped += 1;
            }
            resolved
        })
        .collect::<Vec<_>>();

    if dropped > 0 {
        debug!(dropped, "dropped edges with unknown endpoints");
    }

    edges
}

pub(super) fn parse_topics(value: Option<&Value>) -> Vec<Topic> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let raw = RawTopic::deserialize(entry).ok()?;
            Some(Topic {
                cluster: int_from_value(&raw.cluster)?,
                top_terms: raw.top_terms,
                size: raw
                    .size
                    .filter(|size| size.is_finite() && *size >= 0.0)
                    .map(|size| size as usize)
                    .unwrap_or(0),
                label: raw.label.filter(|label| !label.trim().is_empty()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nodes_accept_numeric_ids_and_skip_garbage() {
        let raw = json!([
            { "id": 7, "title": "Seven", "cluster": 2 },
            { "id": "a", "doi": "  10.1/x " },
            { "title": "no id" },
            "not an object",
            { "id": "a", "title": "duplicate" }
        ]);
        let (nodes, needs_degree) = parse_nodes(Some(&raw));
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, "7");
        assert_eq!(nodes[0].cluster, 2);
        assert_eq!(nodes[1].title, "a");
        assert_eq!(nodes[1].doi.as_deref(), Some("10.1/x"));
        assert!(nodes[1].has_doi);
        assert_eq!(needs_degree, vec![true, true]);
    }

    #[test]
    fn explicit_has_doi_flag_wins() {
        let raw = json!([{ "id": "a", "hasDoi": true, "degree": 4, "year": "2019" }]);
        let (nodes, needs_degree) = parse_nodes(Some(&raw));
        assert!(nodes[0].has_doi);
        assert_eq!(nodes[0].degree, 4);
        assert_eq!(nodes[0].year, Some(2019));
        assert_eq!(needs_degree, vec![false]);
    }

    #[test]
    fn edges_clamp_weight_and_drop_unknown_endpoints() {
        let index = HashMap::from([("a".to_owned(), 0), ("b".to_owned(), 1)]);
        let raw = json!([
            { "source": "a", "target": "b", "weight": 0.2 },
            { "source": "a", "target": "missing" },
            { "source": "b", "target": "a", "weight": 5 },
            { "target": "a" }
        ]);
        let edges = parse_edges(Some(&raw), &index);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].weight, 1.0);
        assert_eq!(edges[1].weight, 5.0);
        assert_eq!((edges[1].source, edges[1].target), (1, 0));
    }

    #[test]
    fn topics_read_either_term_spelling() {
        let raw = json!([
            { "cluster": 1, "top_terms": ["graph"], "size": 3, "label": "Graphs" },
            { "cluster": 2, "topTerms": ["rust"], "size": 1 },
            { "top_terms": [] }
        ]);
        let topics = parse_topics(Some(&raw));
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[1].top_terms, vec!["rust".to_owned()]);
        assert_eq!(topics[0].label.as_deref(), Some("Graphs"));
    }
}
