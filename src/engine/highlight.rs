use std::collections::HashSet;

use crate::dataset::{Dataset, Edge};

use super::interaction::{InteractionController, Spotlight};

/// Which parts of the scene are emphasised. When `focus_active` is set,
/// everything outside `nodes`/`edges` is dimmed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightState {
    pub nodes: HashSet<usize>,
    pub edges: HashSet<(usize, usize)>,
    pub focus_active: bool,
    pub matched_clusters: Option<HashSet<i64>>,
    pub spotlight: Option<Spotlight>,
}

impl HighlightState {
    pub fn node_in_spotlight(&self, dataset: &Dataset, index: usize) -> bool {
        match self.spotlight {
            Some(spotlight) => dataset
                .nodes
                .get(index)
                .is_some_and(|node| spotlight.includes(node.cluster)),
            None => true,
        }
    }

    pub fn cluster_in_focus(&self, cluster: i64) -> bool {
        let spotlit = self.spotlight.is_none_or(|spotlight| spotlight.includes(cluster));
        let matched = self
            .matched_clusters
            .as_ref()
            .is_none_or(|clusters| clusters.contains(&cluster));
        spotlit && matched
    }
}

fn collect_incident(
    edges: &[Edge],
    center: usize,
    nodes: &mut HashSet<usize>,
    related: &mut HashSet<(usize, usize)>,
) {
    nodes.insert(center);
    for edge in edges {
        if edge.source == center || edge.target == center {
            nodes.insert(edge.source);
            nodes.insert(edge.target);
            related.insert((edge.source, edge.target));
        }
    }
}

/// Hover wins over search; spotlight applies on top of either.
pub fn build_highlight_state(
    dataset: &Dataset,
    edges: &[Edge],
    interaction: &InteractionController,
) -> HighlightState {
    let mut state = HighlightState {
        spotlight: interaction.spotlight(),
        ..HighlightState::default()
    };

    if let Some(hovered) = interaction.hovered() {
        collect_incident(edges, hovered, &mut state.nodes, &mut state.edges);
        state.focus_active = true;
        return state;
    }

    if interaction.search_active() {
        let matches = interaction.search_matches();
        state.nodes.extend(matches.iter().copied());
        for edge in edges {
            if matches.contains(&edge.source) || matches.contains(&edge.target) {
                state.edges.insert((edge.source, edge.target));
            }
        }
        state.matched_clusters = Some(
            matches
                .iter()
                .filter_map(|&index| dataset.nodes.get(index))
                .filter(|node| !node.external)
                .map(|node| node.cluster)
                .collect(),
        );
        state.focus_active = true;
    }

    state
}
