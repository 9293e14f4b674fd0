use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_inventory::{NameFilter, StockFilter};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/stock/", get(list_stock))
}

/// Stock lines matching `q` (product name) and `warehouse` (id), with
/// quantity and value totals over exactly the listed lines.
pub async fn list_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::StockQuery>,
) -> axum::response::Response {
    let filter = match StockFilter::from_query(query.q.as_deref(), query.warehouse.as_deref()) {
        Ok(f) => f,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_filter", e.to_string()),
    };

    let report = match services.inventory.list_stock(&filter).await {
        Ok(r) => r,
        Err(e) => return errors::store_error_to_response(e),
    };
    let warehouses = match services.inventory.list_warehouses(&NameFilter::none()).await {
        Ok(w) => w,
        Err(e) => return errors::store_error_to_response(e),
    };

    Json(dto::StockListView {
        report,
        warehouses,
        filter,
    })
    .into_response()
}
