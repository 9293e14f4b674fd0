//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backends and the session codec
//! - `routes/`: handlers, one file per page group
//! - `dto.rs`: query/form DTOs and the JSON view contexts
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{build_services, AppServices};

/// Build the full HTTP router around already-wired services.
pub fn build_app(services: AppServices) -> Router {
    let session_state = middleware::SessionState {
        sessions: services.sessions.clone(),
    };

    // Protected routes: require a valid session cookie.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        session_state,
        middleware::session_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(Arc::new(services))),
        )
}
