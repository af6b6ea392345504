use tracing::debug;

use crate::dataset::{Dataset, Edge, EdgeMode, Node};
use crate::engine::selector::{EdgeFilters, choose_best_mode, compute_edges};
use crate::engine::sizing::node_radii;

use super::config::{EdgeModeChoice, ViewConfig};

/// Filtered views derived from the dataset and the current config. Rebuilt
/// as a whole after any filter or topology change; `revision` increments on
/// every rebuild.
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    pub mode: Option<EdgeMode>,
    pub edges: Vec<Edge>,
    pub displayable: Vec<bool>,
    pub active: Vec<usize>,
    pub radii: Vec<f32>,
    pub revision: u64,
}

/// Visibility before the isolated-node rule.
fn passes_filters(node: &Node, mode: Option<&EdgeMode>, filters: EdgeFilters) -> bool {
    let policy = mode.map(EdgeMode::policy);
    if node.external && !filters.include_external {
        return false;
    }
    if node.topic && !policy.is_some_and(|policy| policy.topic_nodes) {
        return false;
    }
    let doi_filter = filters.only_doi && policy.is_none_or(|policy| policy.doi_filter);
    !(doi_filter && !node.has_doi)
}

/// Resolves the configured edge mode against what the dataset offers.
///
/// Under `Auto` the relation already in use is kept while the dataset still
/// has it, so filter changes only refilter that relation. Pass `current =
/// None` to run the selection again.
pub fn resolve_mode(
    dataset: &Dataset,
    choice: &EdgeModeChoice,
    filters: EdgeFilters,
    current: Option<&EdgeMode>,
) -> Option<EdgeMode> {
    if let EdgeModeChoice::Fixed(mode) = choice
        && dataset.has_mode(mode)
    {
        return Some(mode.clone());
    }
    if let Some(mode) = current.filter(|mode| dataset.has_mode(mode)) {
        return Some(mode.clone());
    }

    let candidates = dataset.available_edge_keys();
    let fallback = dataset.default_mode()?;
    let displayable_count = dataset
        .nodes
        .iter()
        .filter(|node| passes_filters(node, None, filters))
        .count();
    Some(choose_best_mode(
        dataset,
        &candidates,
        filters,
        &fallback,
        displayable_count,
    ))
}

impl ViewState {
    pub fn compute(
        dataset: &Dataset,
        config: &ViewConfig,
        current: Option<&EdgeMode>,
        revision: u64,
    ) -> Self {
        let filters = config.filters();
        let mode = resolve_mode(dataset, &config.edge_mode, filters, current);

        let base = dataset
            .nodes
            .iter()
            .map(|node| passes_filters(node, mode.as_ref(), filters))
            .collect::<Vec<_>>();

        let edges = mode
            .as_ref()
            .map(|mode| compute_edges(dataset, mode, filters))
            .unwrap_or_default()
            .into_iter()
            .filter(|edge| base[edge.source] && base[edge.target])
            .collect::<Vec<_>>();

        let mut incident = vec![false; dataset.node_count()];
        for edge in &edges {
            incident[edge.source] = true;
            incident[edge.target] = true;
        }

        let displayable = base
            .iter()
            .zip(&incident)
            .map(|(&visible, &linked)| visible && (!config.hide_isolated || linked))
            .collect::<Vec<_>>();
        let active = incident
            .iter()
            .enumerate()
            .filter_map(|(index, &linked)| linked.then_some(index))
            .collect::<Vec<_>>();
        let radii = node_radii(dataset, config.size_metric, config.size_scale);

        debug!(
            mode = mode.as_ref().map(EdgeMode::key).unwrap_or("none"),
            edges = edges.len(),
            displayable = displayable.iter().filter(|visible| **visible).count(),
            active = active.len(),
            revision,
            "recomputed view"
        );

        Self {
            mode,
            edges,
            displayable,
            active,
            radii,
            revision,
        }
    }

    pub fn displayable_count(&self) -> usize {
        self.displayable.iter().filter(|visible| **visible).count()
    }

    pub fn is_displayable(&self, index: usize) -> bool {
        self.displayable.get(index).copied().unwrap_or(false)
    }
}
