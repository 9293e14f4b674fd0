use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};

use stockroom_inventory::NameFilter;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new().route("/", get(dashboard))
}

/// Landing page after login: every warehouse plus inventory totals.
pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    let warehouses = match services.inventory.list_warehouses(&NameFilter::none()).await {
        Ok(w) => w,
        Err(e) => return errors::store_error_to_response(e),
    };
    let counts = match services.inventory.counts().await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };

    Json(dto::DashboardView {
        user: (&user).into(),
        warehouses,
        counts,
    })
    .into_response()
}
