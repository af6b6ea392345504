use std::collections::BTreeMap;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

const CLUSTER_RING_RADIUS: f32 = 420.0;
const MEMBER_RING_BASE: f32 = 36.0;
const MEMBER_RING_PER_SQRT: f32 = 22.0;

/// One entry of a persisted layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

/// Clusters on a large circle, members on a small circle around each
/// cluster centroid.
pub(super) fn ring_positions(dataset: &Dataset) -> Vec<Vec2> {
    let mut members: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (index, node) in dataset.nodes.iter().enumerate() {
        members.entry(node.cluster).or_default().push(index);
    }

    let mut positions = vec![Vec2::ZERO; dataset.node_count()];
    let cluster_count = members.len();

    for (slot, indices) in members.values().enumerate() {
        let centroid = if cluster_count <= 1 {
            Vec2::ZERO
        } else {
            let angle = (slot as f32 / cluster_count as f32) * TAU;
            vec2(angle.cos(), angle.sin()) * CLUSTER_RING_RADIUS
        };

        let count = indices.len();
        if count == 1 {
            positions[indices[0]] = centroid;
            continue;
        }

        let radius = MEMBER_RING_BASE + MEMBER_RING_PER_SQRT * (count as f32).sqrt();
        for (member, &index) in indices.iter().enumerate() {
            let angle = (member as f32 / count as f32) * TAU;
            let wobble = 1.0 + 0.08 * ((member % 3) as f32 - 1.0);
            positions[index] = centroid + vec2(angle.cos(), angle.sin()) * radius * wobble;
        }
    }

    positions
}

pub(super) fn random_positions(dataset: &Dataset, rng: &mut impl Rng) -> Vec<Vec2> {
    let half_extent = 100.0 + 40.0 * (dataset.node_count() as f32).sqrt();
    dataset
        .nodes
        .iter()
        .map(|_| {
            vec2(
                rng.random_range(-half_extent..=half_extent),
                rng.random_range(-half_extent..=half_extent),
            )
        })
        .collect()
}
