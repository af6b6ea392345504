use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

pub const MIN_NODE_RADIUS: f32 = 4.0;
pub const MAX_NODE_RADIUS: f32 = 18.0;
const CONSTANT_NODE_RADIUS: f32 = 7.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMetric {
    #[default]
    Auto,
    Pagerank,
    Degree,
    Constant,
}

impl SizeMetric {
    pub const ALL: [SizeMetric; 4] = [
        SizeMetric::Auto,
        SizeMetric::Pagerank,
        SizeMetric::Degree,
        SizeMetric::Constant,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Pagerank => "pagerank",
            Self::Degree => "degree",
            Self::Constant => "constant",
        }
    }

    /// `Auto` becomes `Pagerank` when any node carries one, else `Degree`.
    pub fn resolve(self, dataset: &Dataset) -> Self {
        match self {
            Self::Auto if dataset.nodes.iter().any(|node| node.pagerank.is_some()) => {
                Self::Pagerank
            }
            Self::Auto => Self::Degree,
            other => other,
        }
    }
}

fn normalize_sqrt(value: f32, min: f32, max: f32) -> f32 {
    let (value, min, max) = (value.max(0.0).sqrt(), min.max(0.0).sqrt(), max.max(0.0).sqrt());
    if (max - min).abs() < f32::EPSILON {
        return 0.5;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Visual radius per node: square-root scaled metric mapped into the pixel
/// range, multiplied by `scale`.
pub fn node_radii(dataset: &Dataset, metric: SizeMetric, scale: f32) -> Vec<f32> {
    let scale = scale.clamp(0.25, 4.0);
    let values = match metric.resolve(dataset) {
        SizeMetric::Constant | SizeMetric::Auto => {
            return vec![CONSTANT_NODE_RADIUS * scale; dataset.node_count()];
        }
        SizeMetric::Pagerank => dataset
            .nodes
            .iter()
            .map(|node| node.pagerank.unwrap_or(0.0))
            .collect::<Vec<_>>(),
        SizeMetric::Degree => dataset
            .nodes
            .iter()
            .map(|node| node.degree as f32)
            .collect::<Vec<_>>(),
    };

    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    values
        .iter()
        .map(|value| {
            let t = normalize_sqrt(*value, min, max);
            (MIN_NODE_RADIUS + t * (MAX_NODE_RADIUS - MIN_NODE_RADIUS)) * scale
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn auto_prefers_pagerank_when_present() {
        let with_rank = Dataset::load(&json!({
            "nodes": [{ "id": "a", "pagerank": 0.2 }, { "id": "b" }]
        }));
        let without = Dataset::load(&json!({ "nodes": [{ "id": "a", "degree": 3 }] }));
        assert_eq!(SizeMetric::Auto.resolve(&with_rank), SizeMetric::Pagerank);
        assert_eq!(SizeMetric::Auto.resolve(&without), SizeMetric::Degree);
    }

    #[test]
    fn radii_stay_in_bounds_and_grow_with_metric() {
        let dataset = Dataset::load(&json!({
            "nodes": [
                { "id": "a", "degree": 0 },
                { "id": "b", "degree": 4 },
                { "id": "c", "degree": 100 }
            ]
        }));
        let radii = node_radii(&dataset, SizeMetric::Degree, 1.0);
        assert_eq!(radii[0], MIN_NODE_RADIUS);
        assert_eq!(radii[2], MAX_NODE_RADIUS);
        assert!(radii[1] > radii[0] && radii[1] < radii[2]);

        let doubled = node_radii(&dataset, SizeMetric::Degree, 2.0);
        assert_eq!(doubled[2], MAX_NODE_RADIUS * 2.0);
    }

    #[test]
    fn uniform_metric_gives_mid_radius() {
        let dataset = Dataset::load(&json!({
            "nodes": [{ "id": "a", "degree": 2 }, { "id": "b", "degree": 2 }]
        }));
        let radii = node_radii(&dataset, SizeMetric::Degree, 1.0);
        assert_eq!(radii[0], radii[1]);
        assert!(radii[0] > MIN_NODE_RADIUS);
        assert!(node_radii(&dataset, SizeMetric::Constant, 1.0)
            .iter()
            .all(|r| *r == CONSTANT_NODE_RADIUS));
    }
}
