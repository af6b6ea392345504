//! Interactive citation graph explorer: edge-mode selection, force layout,
//! cluster hulls and the view state that ties them together.

pub mod dataset;
pub mod engine;
pub mod view;

use anyhow::{Context, Result};

use dataset::{DataSource, Dataset, fetch_dataset};
use view::{Store, ViewController};

/// Fetches and normalizes a dataset from `source`.
pub fn boot_graph(source: &DataSource) -> Result<Dataset> {
    fetch_dataset(source).with_context(|| format!("failed to load dataset from {}", source.describe()))
}

/// Builds a ready controller: config and saved layout come from `store`.
pub fn boot_with_data(dataset: Dataset, store: Box<dyn Store>) -> ViewController {
    ViewController::new(dataset, store)
}
