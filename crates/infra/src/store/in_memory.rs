use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use stockroom_auth::{NewUser, User};
use stockroom_core::{Entity, ProductId, StockItemId, UserId, WarehouseId};
use stockroom_inventory::{
    filter_by_name, NameFilter, NewStockItem, NewWarehouse, Product, ProductDraft, StockFilter,
    StockItem, StockLine, StockReport, Warehouse,
};

use super::{InventoryCounts, InventoryStore, StoreError, StoreResult, UserStore};
use crate::seed::{SeedSummary, TestData};

#[derive(Debug, Default)]
struct Tables {
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    products: BTreeMap<ProductId, Product>,
    stock_items: BTreeMap<StockItemId, StockItem>,
    users: BTreeMap<UserId, User>,
    // Serial counters; never reused, even after deletes.
    next_warehouse: i64,
    next_product: i64,
    next_stock_item: i64,
    next_user: i64,
}

impl Tables {
    fn next(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn insert_warehouse(&mut self, warehouse: NewWarehouse) -> Warehouse {
        let id = WarehouseId::new(Self::next(&mut self.next_warehouse));
        let row = warehouse.with_id(id);
        self.warehouses.insert(row.id(), row.clone());
        row
    }

    fn insert_product(&mut self, draft: ProductDraft) -> Product {
        let id = ProductId::new(Self::next(&mut self.next_product));
        let row = draft.with_id(id);
        self.products.insert(row.id(), row.clone());
        row
    }

    fn insert_stock_item(&mut self, item: NewStockItem) -> StoreResult<StockItem> {
        if !self.warehouses.contains_key(&item.warehouse_id) {
            return Err(StoreError::NotFound("warehouse"));
        }
        if !self.products.contains_key(&item.product_id) {
            return Err(StoreError::NotFound("product"));
        }
        let id = StockItemId::new(Self::next(&mut self.next_stock_item));
        let row = item.with_id(id, Utc::now());
        self.stock_items.insert(row.id(), row.clone());
        Ok(row)
    }

    fn remove_stock_where(&mut self, pred: impl Fn(&StockItem) -> bool) -> u64 {
        let before = self.stock_items.len();
        self.stock_items.retain(|_, s| !pred(s));
        (before - self.stock_items.len()) as u64
    }

    fn load(&mut self, data: TestData) -> StoreResult<SeedSummary> {
        let warehouse_ids: Vec<WarehouseId> = data
            .warehouses
            .into_iter()
            .map(|w| self.insert_warehouse(w).id)
            .collect();
        let product_ids: Vec<ProductId> = data
            .products
            .into_iter()
            .map(|p| self.insert_product(p).id)
            .collect();
        for s in &data.stock_items {
            let warehouse_id = *warehouse_ids.get(s.warehouse).ok_or(StoreError::NotFound("warehouse"))?;
            let product_id = *product_ids.get(s.product).ok_or(StoreError::NotFound("product"))?;
            self.insert_stock_item(NewStockItem {
                warehouse_id,
                product_id,
                quantity: s.quantity,
            })?;
        }
        Ok(SeedSummary {
            warehouses: warehouse_ids.len(),
            products: product_ids.len(),
            stock_items: data.stock_items.len(),
        })
    }
}

/// In-memory store for tests/dev.
///
/// One lock guards every table, so each operation (including
/// [`InventoryStore::replace_all`]) is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn list_warehouses(&self, filter: &NameFilter) -> StoreResult<Vec<Warehouse>> {
        let t = self.read()?;
        Ok(filter_by_name(t.warehouses.values().cloned(), filter))
    }

    async fn insert_warehouse(&self, warehouse: NewWarehouse) -> StoreResult<Warehouse> {
        Ok(self.write()?.insert_warehouse(warehouse))
    }

    async fn delete_warehouse(&self, id: WarehouseId) -> StoreResult<u64> {
        let mut t = self.write()?;
        if t.warehouses.remove(&id).is_none() {
            return Err(StoreError::NotFound("warehouse"));
        }
        Ok(t.remove_stock_where(|s| s.warehouse_id == id))
    }

    async fn list_products(&self, filter: &NameFilter) -> StoreResult<Vec<Product>> {
        let t = self.read()?;
        Ok(filter_by_name(t.products.values().cloned(), filter))
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn create_product(&self, draft: ProductDraft) -> StoreResult<Product> {
        Ok(self.write()?.insert_product(draft))
    }

    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> StoreResult<Product> {
        let mut t = self.write()?;
        let row = t.products.get_mut(&id).ok_or(StoreError::NotFound("product"))?;
        *row = draft.with_id(id);
        Ok(row.clone())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<u64> {
        let mut t = self.write()?;
        if t.products.remove(&id).is_none() {
            return Err(StoreError::NotFound("product"));
        }
        Ok(t.remove_stock_where(|s| s.product_id == id))
    }

    async fn insert_stock_item(&self, item: NewStockItem) -> StoreResult<StockItem> {
        self.write()?.insert_stock_item(item)
    }

    async fn set_stock_quantity(&self, id: StockItemId, quantity: i32) -> StoreResult<StockItem> {
        let mut t = self.write()?;
        let row = t.stock_items.get_mut(&id).ok_or(StoreError::NotFound("stock item"))?;
        row.quantity = quantity;
        row.last_updated = Utc::now();
        Ok(row.clone())
    }

    async fn list_stock(&self, filter: &StockFilter) -> StoreResult<StockReport> {
        let t = self.read()?;
        let mut lines = Vec::new();
        for item in t.stock_items.values() {
            // Cascades keep both sides present; skip rather than panic if not.
            let (Some(product), Some(warehouse)) =
                (t.products.get(&item.product_id), t.warehouses.get(&item.warehouse_id))
            else {
                continue;
            };
            if filter.matches(&product.name, warehouse.id) {
                lines.push(StockLine::join(item.clone(), product, warehouse));
            }
        }
        Ok(StockReport::from_lines(lines))
    }

    async fn counts(&self) -> StoreResult<InventoryCounts> {
        let t = self.read()?;
        Ok(InventoryCounts {
            warehouses: t.warehouses.len() as u64,
            products: t.products.len() as u64,
            stock_items: t.stock_items.len() as u64,
        })
    }

    async fn replace_all(&self, data: TestData) -> StoreResult<SeedSummary> {
        let mut t = self.write()?;
        // Build into a copy so a failure leaves the live tables untouched.
        let mut next = Tables {
            users: std::mem::take(&mut t.users),
            next_warehouse: t.next_warehouse,
            next_product: t.next_product,
            next_stock_item: t.next_stock_item,
            next_user: t.next_user,
            ..Tables::default()
        };

        let result = next.load(data);

        match result {
            Ok(summary) => {
                *t = next;
                Ok(summary)
            }
            Err(e) => {
                t.users = std::mem::take(&mut next.users);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.write()?;
        let wanted = user.username.to_lowercase();
        if t.users.values().any(|u| u.username.to_lowercase() == wanted) {
            return Err(StoreError::Conflict(format!("username '{}' is taken", user.username)));
        }
        let id = UserId::new(Tables::next(&mut t.next_user));
        let row = user.with_id(id, Utc::now());
        t.users.insert(row.id(), row.clone());
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let t = self.read()?;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{generate, TestDataPlan};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn draft(name: &str, price: f64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: format!("{name} description"),
            price,
        }
    }

    fn new_warehouse(name: &str) -> NewWarehouse {
        NewWarehouse {
            name: name.to_string(),
            location: "Zagreb".to_string(),
            capacity: 500,
        }
    }

    async fn stock(store: &InMemoryStore, w: WarehouseId, p: ProductId, quantity: i32) -> StockItem {
        store
            .insert_stock_item(NewStockItem {
                warehouse_id: w,
                product_id: p,
                quantity,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn ids_are_assigned_in_insertion_order() {
        let store = InMemoryStore::new();
        let a = store.create_product(draft("A", 1.0)).await.unwrap();
        let b = store.create_product(draft("B", 1.0)).await.unwrap();
        assert_eq!(a.id, ProductId::new(1));
        assert_eq!(b.id, ProductId::new(2));

        store.delete_product(b.id).await.unwrap();
        let c = store.create_product(draft("C", 1.0)).await.unwrap();
        assert_eq!(c.id, ProductId::new(3));
    }

    #[tokio::test]
    async fn product_search_is_case_insensitive() {
        let store = InMemoryStore::new();
        store.create_product(draft("Steel Bolt", 1.0)).await.unwrap();
        store.create_product(draft("Nut", 1.0)).await.unwrap();
        store.create_product(draft("BOLT cutter", 1.0)).await.unwrap();

        let found = store
            .list_products(&NameFilter::from_query(Some("bolt")))
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Steel Bolt", "BOLT cutter"]);

        let all = store.list_products(&NameFilter::none()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn stock_report_aggregates_filtered_rows() {
        let store = InMemoryStore::new();
        let w1 = store.insert_warehouse(new_warehouse("North")).await.unwrap();
        let w2 = store.insert_warehouse(new_warehouse("South")).await.unwrap();
        let bolt = store.create_product(draft("Bolt", 10.0)).await.unwrap();
        let nut = store.create_product(draft("Nut", 5.0)).await.unwrap();
        stock(&store, w1.id, bolt.id, 2).await;
        stock(&store, w1.id, nut.id, 3).await;
        stock(&store, w2.id, bolt.id, 7).await;

        let all = store.list_stock(&StockFilter::default()).await.unwrap();
        assert_eq!(all.total_quantity, 12);
        assert_eq!(all.total_value, 105.0);

        let north = StockFilter::from_query(None, Some(w1.id.to_string().as_str())).unwrap();
        let report = store.list_stock(&north).await.unwrap();
        assert_eq!(report.lines.len(), 2);
        assert_eq!(report.total_quantity, 5);
        assert_eq!(report.total_value, 35.0);

        let bolts_north = StockFilter::from_query(Some("BOL"), Some(w1.id.to_string().as_str())).unwrap();
        let report = store.list_stock(&bolts_north).await.unwrap();
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.total_value, 20.0);

        let none = StockFilter::from_query(Some("zzz"), None).unwrap();
        let report = store.list_stock(&none).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_quantity, 0);
        assert_eq!(report.total_value, 0.0);
    }

    #[tokio::test]
    async fn deleting_product_cascades_to_stock() {
        let store = InMemoryStore::new();
        let w = store.insert_warehouse(new_warehouse("North")).await.unwrap();
        let bolt = store.create_product(draft("Bolt", 1.0)).await.unwrap();
        let nut = store.create_product(draft("Nut", 1.0)).await.unwrap();
        stock(&store, w.id, bolt.id, 1).await;
        stock(&store, w.id, bolt.id, 2).await;
        stock(&store, w.id, nut.id, 3).await;

        assert_eq!(store.delete_product(bolt.id).await.unwrap(), 2);
        let report = store.list_stock(&StockFilter::default()).await.unwrap();
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].product.id, nut.id);

        assert!(matches!(
            store.delete_product(bolt.id).await,
            Err(StoreError::NotFound("product"))
        ));
    }

    #[tokio::test]
    async fn deleting_warehouse_cascades_to_stock() {
        let store = InMemoryStore::new();
        let w1 = store.insert_warehouse(new_warehouse("North")).await.unwrap();
        let w2 = store.insert_warehouse(new_warehouse("South")).await.unwrap();
        let p = store.create_product(draft("Bolt", 1.0)).await.unwrap();
        stock(&store, w1.id, p.id, 1).await;
        stock(&store, w2.id, p.id, 1).await;

        assert_eq!(store.delete_warehouse(w1.id).await.unwrap(), 1);
        assert_eq!(store.counts().await.unwrap().stock_items, 1);
    }

    #[tokio::test]
    async fn stock_item_requires_existing_references() {
        let store = InMemoryStore::new();
        let p = store.create_product(draft("Bolt", 1.0)).await.unwrap();
        let err = store
            .insert_stock_item(NewStockItem {
                warehouse_id: WarehouseId::new(99),
                product_id: p.id,
                quantity: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("warehouse")));
    }

    #[tokio::test]
    async fn quantity_update_touches_last_updated() {
        let store = InMemoryStore::new();
        let w = store.insert_warehouse(new_warehouse("North")).await.unwrap();
        let p = store.create_product(draft("Bolt", 1.0)).await.unwrap();
        let item = stock(&store, w.id, p.id, 1).await;

        let updated = store.set_stock_quantity(item.id, 40).await.unwrap();
        assert_eq!(updated.quantity, 40);
        assert!(updated.last_updated >= item.last_updated);
    }

    #[tokio::test]
    async fn update_unknown_product_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .update_product(ProductId::new(1), draft("X", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("product")));
    }

    #[tokio::test]
    async fn replace_all_swaps_inventory_but_keeps_users() {
        let store = InMemoryStore::new();
        store
            .create_user(NewUser {
                username: "ana".to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap();
        store.create_product(draft("Old", 1.0)).await.unwrap();

        let data = generate(&TestDataPlan::default(), &mut StdRng::seed_from_u64(3)).unwrap();
        let summary = store.replace_all(data).await.unwrap();
        assert_eq!(summary.stock_items, 50);

        let counts = store.counts().await.unwrap();
        assert_eq!(counts, InventoryCounts { warehouses: 5, products: 20, stock_items: 50 });
        assert!(store.list_products(&NameFilter::from_query(Some("Old"))).await.unwrap().is_empty());
        assert!(store.find_user_by_username("ana").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn usernames_are_unique_ignoring_case() {
        let store = InMemoryStore::new();
        let new = |name: &str| NewUser {
            username: name.to_string(),
            password_hash: "x".to_string(),
        };
        let ana = store.create_user(new("Ana")).await.unwrap();
        assert!(matches!(store.create_user(new("ana")).await, Err(StoreError::Conflict(_))));

        assert_eq!(store.get_user(ana.id).await.unwrap().unwrap().username, "Ana");
        assert!(store.find_user_by_username("ana").await.unwrap().is_none());
    }
}
