use serde::{Deserialize, Serialize};

use stockroom_auth::LoginForm;
use stockroom_infra::InventoryCounts;
use stockroom_inventory::{Product, ProductForm, StockFilter, StockReport, Warehouse};

use crate::context::UserContext;

// -------------------------
// Request DTOs
// -------------------------

/// `?q=` on the warehouse and product lists.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// `?q=&warehouse=` on the stock list. `warehouse` stays raw so a bad value
/// can be reported instead of rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub q: Option<String>,
    pub warehouse: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

impl LoginRequest {
    pub fn form(&self) -> LoginForm {
        LoginForm {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

// -------------------------
// View contexts
// -------------------------

#[derive(Debug, Serialize)]
pub struct DashboardView<'a> {
    pub user: UserView<'a>,
    pub warehouses: Vec<Warehouse>,
    pub counts: InventoryCounts,
}

#[derive(Debug, Serialize)]
pub struct UserView<'a> {
    pub id: i64,
    pub username: &'a str,
}

impl<'a> From<&'a UserContext> for UserView<'a> {
    fn from(user: &'a UserContext) -> Self {
        Self {
            id: user.user_id().get(),
            username: user.username(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WarehouseListView {
    pub warehouses: Vec<Warehouse>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductListView {
    pub products: Vec<Product>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StockListView {
    #[serde(flatten)]
    pub report: StockReport,
    pub warehouses: Vec<Warehouse>,
    pub filter: StockFilter,
}

#[derive(Debug, Serialize)]
pub struct ProductFormView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    pub form: ProductForm,
}

#[derive(Debug, Serialize)]
pub struct ProductDeleteView {
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub form: LoginForm,
    pub next: String,
}

/// Where to go after a successful login. Only same-site paths that fit in a
/// `Location` header are honoured.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && path.bytes().all(|b| b.is_ascii_graphic()) =>
        {
            path
        }
        _ => "/",
    }
}
