mod config;
mod controller;
mod state;
mod store;

pub use config::{CONFIG_KEY, EdgeModeChoice, MAX_MIN_WEIGHT, SeedStrategy, ViewConfig};
pub use controller::ViewController;
pub use state::{ViewState, resolve_mode};
pub use store::{FileStore, MemoryStore, Store, StoreError};
