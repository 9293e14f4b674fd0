use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Json, Router,
};

use stockroom_core::ProductId;
use stockroom_infra::StoreError;
use stockroom_inventory::{NameFilter, Product, ProductForm};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

const LIST_PATH: &str = "/products/";

pub fn router() -> Router {
    Router::new()
        .route("/products/", get(list_products))
        .route("/products/add/", get(add_product_page).post(add_product))
        .route("/products/:id/edit/", get(edit_product_page).post(edit_product))
        .route("/products/:id/delete/", get(delete_product_page).post(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let filter = NameFilter::from_query(query.q.as_deref());
    match services.inventory.list_products(&filter).await {
        Ok(products) => Json(dto::ProductListView { products, q: query.q }).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn add_product_page() -> axum::response::Response {
    Json(dto::ProductFormView {
        product: None,
        form: ProductForm::default(),
    })
    .into_response()
}

pub async fn add_product(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<ProductForm>,
) -> axum::response::Response {
    let draft = match form.validate() {
        Ok(d) => d,
        Err(field_errors) => return errors::form_errors(&form, &field_errors),
    };

    match services.inventory.create_product(draft).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, name = %product.name, "product created");
            Redirect::to(LIST_PATH).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn edit_product_page(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product = match load_product(&services, &id).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    Json(dto::ProductFormView {
        form: ProductForm::from_product(&product),
        product: Some(product),
    })
    .into_response()
}

pub async fn edit_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> axum::response::Response {
    let product = match load_product(&services, &id).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let draft = match form.validate() {
        Ok(d) => d,
        Err(field_errors) => return errors::form_errors(&form, &field_errors),
    };

    match services.inventory.update_product(product.id, draft).await {
        Ok(updated) => {
            tracing::info!(product_id = %updated.id, "product updated");
            Redirect::to(LIST_PATH).into_response()
        }
        Err(StoreError::NotFound(_)) => errors::not_found("product"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product_page(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match load_product(&services, &id).await {
        Ok(product) => Json(dto::ProductDeleteView { product }).into_response(),
        Err(resp) => resp,
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Ok(id) = id.parse::<ProductId>() else {
        return errors::not_found("product");
    };

    match services.inventory.delete_product(id).await {
        Ok(removed_stock) => {
            tracing::info!(product_id = %id, removed_stock, "product deleted");
            Redirect::to(LIST_PATH).into_response()
        }
        Err(StoreError::NotFound(_)) => errors::not_found("product"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Resolve a path id to a product. Ids that don't parse are as missing as
/// ids that don't exist.
async fn load_product(services: &AppServices, id: &str) -> Result<Product, axum::response::Response> {
    let Ok(id) = id.parse::<ProductId>() else {
        return Err(errors::not_found("product"));
    };

    match services.inventory.get_product(id).await {
        Ok(Some(product)) => Ok(product),
        Ok(None) => Err(errors::not_found("product")),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}
