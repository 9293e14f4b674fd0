//! Relational storage for the inventory tables and user accounts.
//!
//! Two backends implement the same traits:
//! - [`InMemoryStore`] for tests/dev (no persistence)
//! - [`PostgresStore`] backed by an sqlx connection pool
//!
//! Both hand out identities in insertion order and return rows in ascending
//! id order, which is the only ordering the lists promise.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use stockroom_auth::{NewUser, User};
use stockroom_core::{ProductId, StockItemId, UserId, WarehouseId};
use stockroom_inventory::{
    NameFilter, NewStockItem, NewWarehouse, Product, ProductDraft, StockFilter, StockItem,
    StockReport, Warehouse,
};

use crate::seed::{SeedSummary, TestData};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row (or a row it references) does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The in-memory tables were poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Row counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryCounts {
    pub warehouses: u64,
    pub products: u64,
    pub stock_items: u64,
}

/// Warehouses, products and stock items.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn list_warehouses(&self, filter: &NameFilter) -> StoreResult<Vec<Warehouse>>;

    async fn insert_warehouse(&self, warehouse: NewWarehouse) -> StoreResult<Warehouse>;

    /// Delete a warehouse and every stock item it holds. Returns the number
    /// of stock items removed with it.
    async fn delete_warehouse(&self, id: WarehouseId) -> StoreResult<u64>;

    async fn list_products(&self, filter: &NameFilter) -> StoreResult<Vec<Product>>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn create_product(&self, draft: ProductDraft) -> StoreResult<Product>;

    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> StoreResult<Product>;

    /// Delete a product and every stock item referencing it. Returns the
    /// number of stock items removed with it.
    async fn delete_product(&self, id: ProductId) -> StoreResult<u64>;

    /// Fails with `NotFound` when the warehouse or product does not exist.
    async fn insert_stock_item(&self, item: NewStockItem) -> StoreResult<StockItem>;

    async fn set_stock_quantity(&self, id: StockItemId, quantity: i32) -> StoreResult<StockItem>;

    /// Filtered stock lines with their aggregates, computed from one read.
    async fn list_stock(&self, filter: &StockFilter) -> StoreResult<StockReport>;

    async fn counts(&self) -> StoreResult<InventoryCounts>;

    /// Atomically delete every stock item, product and warehouse, then insert
    /// `data`.
    async fn replace_all(&self, data: TestData) -> StoreResult<SeedSummary>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the username is taken (case-insensitive).
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Exact (case-sensitive) username lookup.
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
}
