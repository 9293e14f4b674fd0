//! Inventory domain module.
//!
//! Warehouses hold stock items, stock items reference products. This crate
//! holds the records, form validation, name search and the stock
//! aggregation rules as deterministic domain logic (no IO, no HTTP, no
//! storage).

pub mod product;
pub mod search;
pub mod stock;
pub mod warehouse;

pub use product::{Product, ProductDraft, ProductForm};
pub use search::{filter_by_name, NameFilter, Named};
pub use stock::{
    line_value, NewStockItem, ProductRef, StockFilter, StockItem, StockLine, StockReport,
    WarehouseRef,
};
pub use warehouse::{NewWarehouse, Warehouse};
