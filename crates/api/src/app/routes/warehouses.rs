use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_inventory::NameFilter;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/warehouses/", get(list_warehouses))
}

pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let filter = NameFilter::from_query(query.q.as_deref());
    match services.inventory.list_warehouses(&filter).await {
        Ok(warehouses) => Json(dto::WarehouseListView {
            warehouses,
            q: query.q,
        })
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
