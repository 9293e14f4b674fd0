use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Json, Router,
};
use chrono::Utc;

use stockroom_auth::{authenticate, hash_password, LoginForm, NewUser, RegistrationForm, User};
use stockroom_core::FieldErrors;
use stockroom_infra::StoreError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::{clear_session_cookie, session_cookie, LOGIN_PATH};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub fn router() -> Router {
    Router::new()
        .route("/register/", get(register_page).post(register))
        .route("/login/", get(login_page).post(login))
        .route("/logout/", get(logout).post(logout))
}

pub async fn register_page() -> axum::response::Response {
    Json(serde_json::json!({ "form": RegistrationForm::default() })).into_response()
}

/// Create an account and log it in straight away.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<RegistrationForm>,
) -> axum::response::Response {
    let registration = match form.validate() {
        Ok(r) => r,
        Err(field_errors) => return errors::form_errors(&form, &field_errors),
    };

    let password = registration.password;
    let password_hash = match tokio::task::spawn_blocking(move || hash_password(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "password hashing failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "could not register user");
        }
        Err(e) => {
            tracing::error!(error = %e, "password hashing task failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "could not register user");
        }
    };

    let new_user = NewUser {
        username: registration.username,
        password_hash,
    };
    let user = match services.users.create_user(new_user).await {
        Ok(u) => u,
        Err(StoreError::Conflict(_)) => {
            let mut field_errors = FieldErrors::new();
            field_errors.add("username", USERNAME_TAKEN);
            return errors::form_errors(&form, &field_errors);
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    start_session(&services, &user, "/")
}

pub async fn login_page(Query(query): Query<dto::LoginPageQuery>) -> axum::response::Response {
    Json(dto::LoginView {
        form: LoginForm::default(),
        next: dto::safe_next(query.next.as_deref()).to_string(),
    })
    .into_response()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Form(request): Form<dto::LoginRequest>,
) -> axum::response::Response {
    let form = request.form();
    let account = match services.users.find_user_by_username(form.username.trim()).await {
        Ok(u) => u,
        Err(e) => return errors::store_error_to_response(e),
    };

    let checked = {
        let form = form.clone();
        tokio::task::spawn_blocking(move || authenticate(account, &form)).await
    };
    let user = match checked {
        Ok(Ok(user)) => user,
        Ok(Err(field_errors)) => {
            tracing::info!(username = %form.username, "login rejected");
            return errors::form_errors(&form, &field_errors);
        }
        Err(e) => {
            tracing::error!(error = %e, "login task failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "could not log in");
        }
    };

    start_session(&services, &user, dto::safe_next(request.next.as_deref()))
}

pub async fn logout() -> axum::response::Response {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

/// Issue a session cookie for `user` and redirect to `next`.
fn start_session(services: &AppServices, user: &User, next: &str) -> axum::response::Response {
    let token = match services.sessions.issue(user, Utc::now()) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "failed to issue session token");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "could not start session");
        }
    };

    (
        [(header::SET_COOKIE, session_cookie(&token, services.sessions.ttl()))],
        Redirect::to(next),
    )
        .into_response()
}
