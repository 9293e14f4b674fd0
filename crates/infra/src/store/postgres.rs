//! Postgres-backed store implementation.
//!
//! Cascades and `last_updated` maintenance are enforced by the schema
//! (`ON DELETE CASCADE` foreign keys and a row trigger), so every writer sees
//! the same rules, including ones outside this process.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate username |
//! | Database (foreign key violation) | `23503` | `NotFound` | Stock item references a missing warehouse/product |
//! | Database (other) | Any other | `Database` | Other database errors |
//! | Other | N/A | `Database` | Pool closed, network errors, etc. |

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use stockroom_auth::{NewUser, User};
use stockroom_core::{ProductId, StockItemId, UserId, WarehouseId};
use stockroom_inventory::{
    NameFilter, NewStockItem, NewWarehouse, Product, ProductDraft, ProductRef, StockFilter,
    StockItem, StockLine, StockReport, Warehouse, WarehouseRef,
};

use super::{InventoryCounts, InventoryStore, StoreError, StoreResult, UserStore};
use crate::seed::{SeedSummary, TestData};

const SCHEMA: &str = include_str!("schema.sql");

/// Postgres-backed store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool, which is cheap to clone and `Send + Sync`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        tracing::info!("schema applied");
        Ok(())
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => {
                return StoreError::Conflict(format!("{operation}: {}", db_err.message()));
            }
            Some("23503") => {
                let what = match db_err.constraint() {
                    Some(c) if c.contains("product") => "product",
                    _ => "warehouse",
                };
                return StoreError::NotFound(what);
            }
            _ => {}
        }
    }
    StoreError::Database {
        operation,
        source: err,
    }
}

fn warehouse_from_row(row: &PgRow) -> Result<Warehouse, sqlx::Error> {
    Ok(Warehouse {
        id: WarehouseId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        location: row.try_get("location")?,
        capacity: row.try_get("capacity")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
    })
}

fn stock_item_from_row(row: &PgRow) -> Result<StockItem, sqlx::Error> {
    Ok(StockItem {
        id: StockItemId::new(row.try_get("id")?),
        warehouse_id: WarehouseId::new(row.try_get("warehouse_id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        quantity: row.try_get("quantity")?,
        last_updated: row.try_get("last_updated")?,
    })
}

fn stock_line_from_row(row: &PgRow) -> Result<StockLine, sqlx::Error> {
    let item = stock_item_from_row(row)?;
    let product = ProductRef {
        id: item.product_id,
        name: row.try_get("product_name")?,
        price: row.try_get("product_price")?,
    };
    let warehouse = WarehouseRef {
        id: item.warehouse_id,
        name: row.try_get("warehouse_name")?,
    };
    Ok(StockLine::new(item, product, warehouse))
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        date_joined: row.try_get("date_joined")?,
    })
}

async fn count(pool: &PgPool, sql: &'static str) -> StoreResult<u64> {
    let n: i64 = sqlx::query_scalar(sql)
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("count", e))?;
    Ok(n.max(0) as u64)
}

async fn insert_stock_item_tx(
    tx: &mut Transaction<'_, Postgres>,
    item: &NewStockItem,
) -> Result<PgRow, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stock_items (warehouse_id, product_id, quantity)
        VALUES ($1, $2, $3)
        RETURNING id, warehouse_id, product_id, quantity, last_updated
        "#,
    )
    .bind(item.warehouse_id.get())
    .bind(item.product_id.get())
    .bind(item.quantity)
    .fetch_one(&mut **tx)
    .await
}

#[async_trait]
impl InventoryStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_warehouses(&self, filter: &NameFilter) -> StoreResult<Vec<Warehouse>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, location, capacity
            FROM warehouses
            WHERE $1::TEXT IS NULL OR name ILIKE $1
            ORDER BY id
            "#,
        )
        .bind(filter.like_pattern())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_warehouses", e))?;

        rows.iter()
            .map(warehouse_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_warehouses", e))
    }

    #[instrument(skip(self), err)]
    async fn insert_warehouse(&self, warehouse: NewWarehouse) -> StoreResult<Warehouse> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO warehouses (name, location, capacity) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&warehouse.name)
        .bind(&warehouse.location)
        .bind(warehouse.capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_warehouse", e))?;
        Ok(warehouse.with_id(WarehouseId::new(id)))
    }

    #[instrument(skip(self), fields(warehouse_id = %id), err)]
    async fn delete_warehouse(&self, id: WarehouseId) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("delete_warehouse", e))?;
        let cascaded = sqlx::query("DELETE FROM stock_items WHERE warehouse_id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_warehouse", e))?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM warehouses WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_warehouse", e))?
            .rows_affected();
        if deleted == 0 {
            // Dropping `tx` rolls back.
            return Err(StoreError::NotFound("warehouse"));
        }
        tx.commit().await.map_err(|e| map_sqlx_error("delete_warehouse", e))?;
        tracing::info!(cascaded, "warehouse deleted");
        Ok(cascaded)
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self, filter: &NameFilter) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price
            FROM products
            WHERE $1::TEXT IS NULL OR name ILIKE $1
            ORDER BY id
            "#,
        )
        .bind(filter.like_pattern())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter()
            .map(product_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_products", e))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query("SELECT id, name, description, price FROM products WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref()
            .map(product_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_product", e))
    }

    #[instrument(skip(self), err)]
    async fn create_product(&self, draft: ProductDraft) -> StoreResult<Product> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, description, price) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;
        Ok(draft.with_id(ProductId::new(id)))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> StoreResult<Product> {
        let updated = sqlx::query(
            "UPDATE products SET name = $2, description = $3, price = $4 WHERE id = $1",
        )
        .bind(id.get())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?
        .rows_affected();
        if updated == 0 {
            return Err(StoreError::NotFound("product"));
        }
        Ok(draft.with_id(id))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("delete_product", e))?;
        let cascaded = sqlx::query("DELETE FROM stock_items WHERE product_id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?
            .rows_affected();
        if deleted == 0 {
            return Err(StoreError::NotFound("product"));
        }
        tx.commit().await.map_err(|e| map_sqlx_error("delete_product", e))?;
        tracing::info!(cascaded, "product deleted");
        Ok(cascaded)
    }

    #[instrument(skip(self), err)]
    async fn insert_stock_item(&self, item: NewStockItem) -> StoreResult<StockItem> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("insert_stock_item", e))?;
        let row = insert_stock_item_tx(&mut tx, &item)
            .await
            .map_err(|e| map_sqlx_error("insert_stock_item", e))?;
        tx.commit().await.map_err(|e| map_sqlx_error("insert_stock_item", e))?;
        stock_item_from_row(&row).map_err(|e| map_sqlx_error("insert_stock_item", e))
    }

    #[instrument(skip(self), fields(stock_item_id = %id), err)]
    async fn set_stock_quantity(&self, id: StockItemId, quantity: i32) -> StoreResult<StockItem> {
        let row = sqlx::query(
            r#"
            UPDATE stock_items SET quantity = $2
            WHERE id = $1
            RETURNING id, warehouse_id, product_id, quantity, last_updated
            "#,
        )
        .bind(id.get())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_stock_quantity", e))?
        .ok_or(StoreError::NotFound("stock item"))?;
        stock_item_from_row(&row).map_err(|e| map_sqlx_error("set_stock_quantity", e))
    }

    #[instrument(skip(self), err)]
    async fn list_stock(&self, filter: &StockFilter) -> StoreResult<StockReport> {
        let rows = sqlx::query(
            r#"
            SELECT
                s.id,
                s.warehouse_id,
                s.product_id,
                s.quantity,
                s.last_updated,
                p.name AS product_name,
                p.price AS product_price,
                w.name AS warehouse_name
            FROM stock_items s
            JOIN products p ON p.id = s.product_id
            JOIN warehouses w ON w.id = s.warehouse_id
            WHERE ($1::TEXT IS NULL OR p.name ILIKE $1)
              AND ($2::BIGINT IS NULL OR s.warehouse_id = $2)
            ORDER BY s.id
            "#,
        )
        .bind(filter.q.like_pattern())
        .bind(filter.warehouse.map(|w| w.get()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_stock", e))?;

        let lines = rows
            .iter()
            .map(stock_line_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("list_stock", e))?;
        Ok(StockReport::from_lines(lines))
    }

    #[instrument(skip(self), err)]
    async fn counts(&self) -> StoreResult<InventoryCounts> {
        Ok(InventoryCounts {
            warehouses: count(&self.pool, "SELECT COUNT(*) FROM warehouses").await?,
            products: count(&self.pool, "SELECT COUNT(*) FROM products").await?,
            stock_items: count(&self.pool, "SELECT COUNT(*) FROM stock_items").await?,
        })
    }

    #[instrument(
        skip(self, data),
        fields(
            warehouses = data.warehouses.len(),
            products = data.products.len(),
            stock_items = data.stock_items.len()
        ),
        err
    )]
    async fn replace_all(&self, data: TestData) -> StoreResult<SeedSummary> {
        let op = "replace_all";
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))?;

        for sql in [
            "DELETE FROM stock_items",
            "DELETE FROM products",
            "DELETE FROM warehouses",
        ] {
            sqlx::query(sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(op, e))?;
        }

        let mut warehouse_ids = Vec::with_capacity(data.warehouses.len());
        for w in &data.warehouses {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO warehouses (name, location, capacity) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(&w.name)
            .bind(&w.location)
            .bind(w.capacity)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
            warehouse_ids.push(WarehouseId::new(id));
        }

        let mut product_ids = Vec::with_capacity(data.products.len());
        for p in &data.products {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO products (name, description, price) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(&p.name)
            .bind(&p.description)
            .bind(p.price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
            product_ids.push(ProductId::new(id));
        }

        for s in &data.stock_items {
            let item = NewStockItem {
                warehouse_id: *warehouse_ids.get(s.warehouse).ok_or(StoreError::NotFound("warehouse"))?,
                product_id: *product_ids.get(s.product).ok_or(StoreError::NotFound("product"))?,
                quantity: s.quantity,
            };
            insert_stock_item_tx(&mut tx, &item)
                .await
                .map_err(|e| map_sqlx_error(op, e))?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;

        Ok(SeedSummary {
            warehouses: warehouse_ids.len(),
            products: product_ids.len(),
            stock_items: data.stock_items.len(),
        })
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, date_joined
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        user_from_row(&row).map_err(|e| map_sqlx_error("create_user", e))
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, date_joined FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_username", e))?;
        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("find_user_by_username", e))
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, date_joined FROM users WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_user", e))
    }
}
