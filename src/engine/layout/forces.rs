use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::dataset::{Dataset, Edge};

use super::NodeState;

const REPULSION_SOFTENING: f32 = 0.01;

/// Visual stroke factor for an edge weight, also used as spring stiffness
/// multiplier.
pub fn stroke_weight(weight: f32) -> f32 {
    (1.0 + weight.max(0.0)).log2().clamp(1.0, 3.0)
}

fn separation_direction(delta: Vec2, distance: f32, i: usize, j: usize) -> Vec2 {
    if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

/// Inverse-square repulsion over every pair of `active` nodes where at least
/// one side is free to move.
pub(super) fn accumulate_repulsion(
    states: &[NodeState],
    active: &[usize],
    strength: f32,
    forces: &mut [Vec2],
) {
    for (offset, &i) in active.iter().enumerate() {
        for &j in &active[offset + 1..] {
            if states[i].fixed && states[j].fixed {
                continue;
            }

            let delta = states[i].pos - states[j].pos;
            let distance_sq = delta.length_sq();
            let direction = separation_direction(delta, distance_sq.sqrt(), i, j);
            let push = direction * (strength / (distance_sq + REPULSION_SOFTENING));

            forces[i] += push;
            forces[j] -= push;
        }
    }
}

pub(super) fn accumulate_springs(
    states: &[NodeState],
    edges: &[Edge],
    stiffness: f32,
    rest_length: f32,
    forces: &mut [Vec2],
) {
    let node_count = states.len();
    for edge in edges {
        let (from, to) = (edge.source, edge.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = states[to].pos - states[from].pos;
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }

        let direction = delta / distance;
        let pull = direction * ((distance - rest_length) * stiffness * stroke_weight(edge.weight));

        forces[from] += pull;
        forces[to] -= pull;
    }
}

/// Mean position of the displayable, non-external members of each cluster.
pub fn cluster_centroids(
    dataset: &Dataset,
    states: &[NodeState],
    displayable: &[bool],
) -> HashMap<i64, Vec2> {
    let mut sums: HashMap<i64, (Vec2, usize)> = HashMap::new();
    for (index, node) in dataset.nodes.iter().enumerate() {
        if node.external || !displayable.get(index).copied().unwrap_or(false) {
            continue;
        }
        let Some(state) = states.get(index) else {
            continue;
        };
        let entry = sums.entry(node.cluster).or_insert((Vec2::ZERO, 0));
        entry.0 += state.pos;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(cluster, (sum, count))| (cluster, sum / count as f32))
        .collect()
}

pub(super) fn accumulate_gravity(
    dataset: &Dataset,
    states: &[NodeState],
    displayable: &[bool],
    centroids: &HashMap<i64, Vec2>,
    strength: f32,
    forces: &mut [Vec2],
) {
    for (index, node) in dataset.nodes.iter().enumerate() {
        if !displayable.get(index).copied().unwrap_or(false) || states[index].fixed {
            continue;
        }
        if let Some(centroid) = centroids.get(&node.cluster) {
            forces[index] += (*centroid - states[index].pos) * strength;
        }
    }
}

/// Applies accumulated forces; fixed and hidden nodes only lose velocity.
pub(super) fn integrate(
    states: &mut [NodeState],
    forces: &[Vec2],
    displayable: &[bool],
    damping: f32,
    max_speed: f32,
    alpha: f32,
) {
    let max_speed_sq = max_speed * max_speed;

    for (index, state) in states.iter_mut().enumerate() {
        if state.fixed || !displayable.get(index).copied().unwrap_or(false) {
            state.velocity = Vec2::ZERO;
            continue;
        }

        let mut velocity = (state.velocity + forces[index]) * damping;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= max_speed / speed_sq.sqrt();
        }

        state.velocity = velocity;
        state.pos += velocity * alpha;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free(x: f32, y: f32) -> NodeState {
        NodeState {
            pos: vec2(x, y),
            velocity: Vec2::ZERO,
            fixed: false,
        }
    }

    #[test]
    fn stroke_weight_is_clamped() {
        assert_eq!(stroke_weight(1.0), 1.0);
        assert!((stroke_weight(3.0) - 2.0).abs() < 1e-6);
        assert_eq!(stroke_weight(1000.0), 3.0);
    }

    #[test]
    fn repulsion_pushes_pairs_apart_symmetrically() {
        let states = vec![free(0.0, 0.0), free(10.0, 0.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_repulsion(&states, &[0, 1], 100.0, &mut forces);
        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert!((forces[0] + forces[1]).length() < 1e-5);
    }

    #[test]
    fn coincident_nodes_still_separate() {
        let states = vec![free(5.0, 5.0), free(5.0, 5.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_repulsion(&states, &[0, 1], 1.0, &mut forces);
        assert!(forces[0].length() > 0.0);
        assert!(forces[0].x.is_finite());
    }

    #[test]
    fn springs_pull_long_edges_together() {
        let states = vec![free(0.0, 0.0), free(300.0, 0.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        let edges = [Edge {
            source: 0,
            target: 1,
            weight: 1.0,
        }];
        accumulate_springs(&states, &edges, 0.1, 100.0, &mut forces);
        assert!(forces[0].x > 0.0);
        assert!(forces[1].x < 0.0);
    }

    #[test]
    fn fixed_nodes_do_not_integrate() {
        let mut states = vec![free(0.0, 0.0), free(1.0, 1.0)];
        states[0].fixed = true;
        states[0].velocity = vec2(3.0, 3.0);
        let forces = vec![vec2(10.0, 0.0), vec2(10.0, 0.0)];
        integrate(&mut states, &forces, &[true, true], 0.9, 100.0, 1.0);
        assert_eq!(states[0].pos, vec2(0.0, 0.0));
        assert_eq!(states[0].velocity, Vec2::ZERO);
        assert!(states[1].pos.x > 1.0);
    }
}
