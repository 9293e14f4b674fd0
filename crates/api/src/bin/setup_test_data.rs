//! Wipe warehouses, products and stock items, then fill them with random
//! sample data.

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use stockroom_infra::seed::{self, TestDataPlan};
use stockroom_infra::{AppConfig, StoreConfig};

#[derive(Debug, Parser)]
#[command(name = "setup-test-data", about = "Replace inventory data with generated test data")]
struct Args {
    /// RNG seed, for a reproducible data set.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = seed::DEFAULT_WAREHOUSES)]
    warehouses: usize,

    #[arg(long, default_value_t = seed::DEFAULT_PRODUCTS)]
    products: usize,

    #[arg(long, default_value_t = seed::DEFAULT_STOCK_ITEMS)]
    stock_items: usize,
}

/// Generated data only makes sense in a store that outlives this process.
fn require_database(store: &StoreConfig) -> anyhow::Result<()> {
    match store {
        StoreConfig::Postgres { .. } => Ok(()),
        StoreConfig::InMemory => {
            anyhow::bail!("DATABASE_URL is not set; test data must be written to a database")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();
    let args = Args::parse();

    let config = AppConfig::from_env()?;
    require_database(&config.store)?;
    let services = stockroom_api::app::build_services(&config).await?;

    let plan = TestDataPlan {
        warehouses: args.warehouses,
        products: args.products,
        stock_items: args.stock_items,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::info!("Deleting old data...");
    let summary = seed::regenerate(services.inventory.as_ref(), &plan, &mut rng).await?;
    tracing::info!(
        warehouses = summary.warehouses,
        products = summary.products,
        stock_items = summary.stock_items,
        "Test data created"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_is_refused() {
        let err = require_database(&StoreConfig::InMemory).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn postgres_store_is_accepted() {
        let store = StoreConfig::Postgres {
            url: "postgres://localhost/stockroom".to_string(),
            max_connections: 1,
        };
        assert!(require_database(&store).is_ok());
    }

    #[test]
    fn plan_overrides_parse() {
        let args = Args::parse_from(["setup-test-data", "--seed", "7", "--stock-items", "3"]);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.stock_items, 3);
        assert_eq!(args.warehouses, seed::DEFAULT_WAREHOUSES);
    }
}
