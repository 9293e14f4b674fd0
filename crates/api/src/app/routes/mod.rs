use axum::{routing::get, Router};

pub mod accounts;
pub mod dashboard;
pub mod products;
pub mod stock;
pub mod system;
pub mod warehouses;

/// Pages anyone may open.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(warehouses::router())
        .merge(products::router())
        .merge(stock::router())
        .merge(accounts::router())
}

/// Pages that require a logged-in user.
pub fn protected_router() -> Router {
    dashboard::router()
}
