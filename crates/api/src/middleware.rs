use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};

use stockroom_auth::SessionCodec;

use crate::context::UserContext;

pub const SESSION_COOKIE: &str = "stockroom_session";
pub const LOGIN_PATH: &str = "/login/";

#[derive(Clone)]
pub struct SessionState {
    pub sessions: Arc<SessionCodec>,
}

/// Resolve the session cookie into a [`UserContext`], or send the client to
/// the login page with the original path in `next`.
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let claims = extract_session(req.headers()).and_then(|token| {
        state
            .sessions
            .validate(token, Utc::now())
            .inspect_err(|e| tracing::debug!(error = %e, "rejected session cookie"))
            .ok()
    });

    let Some(claims) = claims else {
        let target = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path(), |pq| pq.as_str());
        return login_redirect(target).into_response();
    };

    req.extensions_mut()
        .insert(UserContext::new(claims.sub, claims.username));

    next.run(req).await
}

pub fn login_redirect(next: &str) -> Redirect {
    let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    Redirect::to(&format!("{LOGIN_PATH}?next={next}"))
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.num_seconds()
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn extract_session(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|token| !token.is_empty())
}
