mod fetch;
mod graph;
mod mode;
mod parse;

pub use fetch::{DataSource, FetchError, fetch_dataset, fetch_text};
pub use graph::{Dataset, Edge, Node, Topic};
pub use mode::{EdgeMode, ModePolicy};
