//! Stock items and the stock dashboard query.
//!
//! A [`StockReport`] is built from one already-filtered set of [`StockLine`]s
//! and derives its totals from exactly those lines, so the listed rows and
//! the aggregates can never disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, Entity, ProductId, StockItemId, WarehouseId};

use crate::search::NameFilter;
use crate::{Product, Warehouse};

/// A quantity of one product held at one warehouse.
///
/// `quantity` is expected to be non-negative but is not checked, nor is it
/// checked against the warehouse capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: StockItemId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Refreshed by the store on every write.
    pub last_updated: DateTime<Utc>,
}

impl Entity for StockItem {
    type Id = StockItemId;

    fn id(&self) -> StockItemId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockItem {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub quantity: i32,
}

impl NewStockItem {
    pub fn with_id(self, id: StockItemId, now: DateTime<Utc>) -> StockItem {
        StockItem {
            id,
            warehouse_id: self.warehouse_id,
            product_id: self.product_id,
            quantity: self.quantity,
            last_updated: now,
        }
    }
}

/// Filter for the stock list: product-name substring and/or warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockFilter {
    pub q: NameFilter,
    pub warehouse: Option<WarehouseId>,
}

impl StockFilter {
    /// Build from raw `?q=&warehouse=` values. Empty values are treated as
    /// absent; a non-integer warehouse is an error.
    pub fn from_query(q: Option<&str>, warehouse: Option<&str>) -> Result<Self, DomainError> {
        let warehouse = match warehouse {
            Some(w) if !w.is_empty() => Some(w.parse::<WarehouseId>()?),
            _ => None,
        };
        Ok(Self {
            q: NameFilter::from_query(q),
            warehouse,
        })
    }

    pub fn matches(&self, product_name: &str, warehouse_id: WarehouseId) -> bool {
        self.q.matches(product_name) && self.warehouse.is_none_or(|w| w == warehouse_id)
    }
}

/// `quantity * price` for one stock row.
pub fn line_value(quantity: i32, price: f64) -> f64 {
    f64::from(quantity) * price
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseRef {
    pub id: WarehouseId,
    pub name: String,
}

/// One row of the stock list: the item joined with its product and
/// warehouse, plus its computed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLine {
    pub item: StockItem,
    pub product: ProductRef,
    pub warehouse: WarehouseRef,
    pub line_value: f64,
}

impl StockLine {
    pub fn new(item: StockItem, product: ProductRef, warehouse: WarehouseRef) -> Self {
        let line_value = line_value(item.quantity, product.price);
        Self {
            item,
            product,
            warehouse,
            line_value,
        }
    }

    pub fn join(item: StockItem, product: &Product, warehouse: &Warehouse) -> Self {
        Self::new(
            item,
            ProductRef {
                id: product.id,
                name: product.name.clone(),
                price: product.price,
            },
            WarehouseRef {
                id: warehouse.id,
                name: warehouse.name.clone(),
            },
        )
    }
}

/// Filtered stock lines and their aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockReport {
    pub lines: Vec<StockLine>,
    pub total_quantity: i64,
    pub total_value: f64,
}

impl StockReport {
    pub fn from_lines(lines: Vec<StockLine>) -> Self {
        let total_quantity = lines.iter().map(|l| i64::from(l.item.quantity)).sum();
        let total_value = lines.iter().map(|l| l.line_value).sum();
        Self {
            lines,
            total_quantity,
            total_value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
