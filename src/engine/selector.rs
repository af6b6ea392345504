use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::dataset::{Dataset, Edge, EdgeMode};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeFilters {
    pub include_external: bool,
    pub only_doi: bool,
    pub min_weight: f32,
}

impl Default for EdgeFilters {
    fn default() -> Self {
        Self {
            include_external: true,
            only_doi: false,
            min_weight: 1.0,
        }
    }
}

/// Edges of `mode` that survive the filters, in input order.
pub fn compute_edges(dataset: &Dataset, mode: &EdgeMode, filters: EdgeFilters) -> Vec<Edge> {
    let node_count = dataset.node_count();
    let doi_filter = filters.only_doi && mode.policy().doi_filter;

    dataset
        .edges(mode)
        .iter()
        .filter(|edge| edge.source < node_count && edge.target < node_count)
        .filter(|edge| {
            filters.include_external
                || !(dataset.nodes[edge.source].external || dataset.nodes[edge.target].external)
        })
        .filter(|edge| {
            !doi_filter || (dataset.nodes[edge.source].has_doi && dataset.nodes[edge.target].has_doi)
        })
        .filter(|edge| edge.weight >= filters.min_weight)
        .copied()
        .collect()
}

/// Connected components of the undirected graph induced by `edges`; nodes
/// without an edge are not counted.
pub fn component_count(edges: &[Edge]) -> usize {
    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.source).or_default().push(edge.target);
        adjacency.entry(edge.target).or_default().push(edge.source);
    }

    let mut visited = HashSet::with_capacity(adjacency.len());
    let mut components = 0usize;
    let mut queue = VecDeque::new();

    for &start in adjacency.keys() {
        if !visited.insert(start) {
            continue;
        }
        components += 1;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for &next in adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    components
}

/// `(components, -edges)`; smaller is better.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModeScore {
    pub components: usize,
    pub negative_edges: i64,
}

pub fn score_edges(edges: &[Edge], displayable_count: usize) -> ModeScore {
    if edges.is_empty() {
        return ModeScore {
            components: displayable_count,
            negative_edges: 0,
        };
    }

    ModeScore {
        components: component_count(edges),
        negative_edges: -(edges.len() as i64),
    }
}

/// Picks the candidate whose filtered edges fragment the graph least, more
/// edges breaking ties. Keeps `current` when no candidate has any edge.
pub fn choose_best_mode(
    dataset: &Dataset,
    candidates: &[EdgeMode],
    filters: EdgeFilters,
    current: &EdgeMode,
    displayable_count: usize,
) -> EdgeMode {
    let mut best: Option<(ModeScore, &EdgeMode)> = None;
    let mut any_edges = false;

    for mode in candidates {
        let edges = compute_edges(dataset, mode, filters);
        any_edges |= !edges.is_empty();
        let score = score_edges(&edges, displayable_count);
        debug!(
            mode = %mode,
            edges = edges.len(),
            components = score.components,
            "scored edge mode"
        );

        if best.is_none_or(|(best_score, _)| score < best_score) {
            best = Some((score, mode));
        }
    }

    match best {
        Some((_, mode)) if any_edges => mode.clone(),
        _ => current.clone(),
    }
}
