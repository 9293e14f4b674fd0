//! Randomized sample data for manual testing.
//!
//! [`generate`] is pure (driven by the caller's RNG); [`regenerate`] wipes the
//! inventory tables and writes the generated set in one atomic store call.

use fake::faker::address::en::CityName;
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use stockroom_inventory::{NewWarehouse, ProductDraft};

use crate::store::{InventoryStore, StoreError};

pub const DEFAULT_WAREHOUSES: usize = 5;
pub const DEFAULT_PRODUCTS: usize = 20;
pub const DEFAULT_STOCK_ITEMS: usize = 50;

/// How many rows of each kind to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestDataPlan {
    pub warehouses: usize,
    pub products: usize,
    pub stock_items: usize,
}

impl Default for TestDataPlan {
    fn default() -> Self {
        Self {
            warehouses: DEFAULT_WAREHOUSES,
            products: DEFAULT_PRODUCTS,
            stock_items: DEFAULT_STOCK_ITEMS,
        }
    }
}

impl TestDataPlan {
    pub fn validate(&self) -> Result<(), SeedError> {
        if self.stock_items > 0 && (self.warehouses == 0 || self.products == 0) {
            return Err(SeedError::InvalidPlan(
                "stock items need at least one warehouse and one product".to_string(),
            ));
        }
        Ok(())
    }
}

/// A stock row addressed by position in [`TestData`]'s warehouse and product
/// lists, since ids are only known after insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedStockItem {
    pub warehouse: usize,
    pub product: usize,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestData {
    pub warehouses: Vec<NewWarehouse>,
    pub products: Vec<ProductDraft>,
    pub stock_items: Vec<SeedStockItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub warehouses: usize,
    pub products: usize,
    pub stock_items: usize,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid test data plan: {0}")]
    InvalidPlan(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Word count range for product descriptions.
const DESCRIPTION_WORDS: std::ops::Range<usize> = 4..10;

/// Generate a data set following `plan`.
///
/// - warehouse capacity: 100..=1000
/// - product price: 0.01..=999.99, two decimals
/// - stock quantity: 1..=100, warehouses and products assigned round-robin
pub fn generate<R: Rng + ?Sized>(plan: &TestDataPlan, rng: &mut R) -> Result<TestData, SeedError> {
    plan.validate()?;

    let warehouses = (0..plan.warehouses)
        .map(|_| NewWarehouse {
            name: CompanyName().fake_with_rng(rng),
            location: CityName().fake_with_rng(rng),
            capacity: rng.gen_range(100..=1000),
        })
        .collect();

    let products = (0..plan.products)
        .map(|_| ProductDraft {
            name: Word().fake_with_rng(rng),
            description: Sentence(DESCRIPTION_WORDS).fake_with_rng(rng),
            price: f64::from(rng.gen_range(1u32..=99_999)) / 100.0,
        })
        .collect();

    let stock_items = (0..plan.stock_items)
        .map(|i| SeedStockItem {
            warehouse: i % plan.warehouses,
            product: i % plan.products,
            quantity: rng.gen_range(1..=100),
        })
        .collect();

    Ok(TestData {
        warehouses,
        products,
        stock_items,
    })
}

/// Delete all inventory rows and replace them with freshly generated data.
pub async fn regenerate<S, R>(store: &S, plan: &TestDataPlan, rng: &mut R) -> Result<SeedSummary, SeedError>
where
    S: InventoryStore + ?Sized,
    R: Rng + ?Sized,
{
    let data = generate(plan, rng)?;
    tracing::info!(
        warehouses = plan.warehouses,
        products = plan.products,
        stock_items = plan.stock_items,
        "replacing inventory with generated test data"
    );
    let summary = store.replace_all(data).await?;
    tracing::info!(?summary, "test data generated");
    Ok(summary)
}
