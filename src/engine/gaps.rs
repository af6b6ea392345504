use std::collections::HashMap;

use crate::dataset::{Dataset, Edge};

use super::hull::cluster_members;

const MIN_GAP_CLUSTER_SIZE: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterGap {
    pub a: i64,
    pub b: i64,
    pub between: usize,
    pub score: f32,
}

fn ordered_pair(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Sizeable cluster pairs with few edges between them, best first.
pub fn cluster_gaps(
    dataset: &Dataset,
    edges: &[Edge],
    displayable: &[bool],
    limit: usize,
) -> Vec<ClusterGap> {
    let sizes = cluster_members(dataset, displayable)
        .into_iter()
        .map(|(cluster, members)| (cluster, members.len()))
        .filter(|(_, size)| *size >= MIN_GAP_CLUSTER_SIZE)
        .collect::<Vec<_>>();
    if sizes.len() < 2 || limit == 0 {
        return Vec::new();
    }

    let mut between: HashMap<(i64, i64), usize> = HashMap::new();
    for edge in edges {
        let (Some(source), Some(target)) =
            (dataset.nodes.get(edge.source), dataset.nodes.get(edge.target))
        else {
            continue;
        };
        if source.external || target.external || source.cluster == target.cluster {
            continue;
        }
        *between
            .entry(ordered_pair(source.cluster, target.cluster))
            .or_default() += 1;
    }

    let mut gaps = Vec::new();
    for (offset, &(a, size_a)) in sizes.iter().enumerate() {
        for &(b, size_b) in &sizes[offset + 1..] {
            let count = between.get(&(a, b)).copied().unwrap_or(0);
            gaps.push(ClusterGap {
                a,
                b,
                between: count,
                score: (size_a * size_b) as f32 / (1 + count) as f32,
            });
        }
    }

    // stable sort keeps ascending cluster order among equal scores
    gaps.sort_by(|x, y| y.score.total_cmp(&x.score));
    gaps.truncate(limit);
    gaps
}
