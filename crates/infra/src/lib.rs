//! Infrastructure layer: storage backends, configuration, test data.

pub mod config;
pub mod seed;
pub mod store;

pub use config::{AppConfig, ConfigError, StoreConfig};
pub use store::{
    InMemoryStore, InventoryCounts, InventoryStore, PostgresStore, StoreError, StoreResult,
    UserStore,
};
