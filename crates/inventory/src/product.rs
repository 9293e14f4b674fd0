use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, FieldErrors, ProductId};

/// Maximum length of a product name, in characters.
pub const NAME_MAX_CHARS: usize = 100;

/// Aggregate root: Product.
///
/// Owns zero or more stock items; deleting a product deletes them too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validated product fields, ready to be inserted or written over an
/// existing product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl ProductDraft {
    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
        }
    }
}

/// Raw create/update form as submitted by the client.
///
/// Every field is text so that bad input can be echoed back alongside the
/// field-level errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
}

impl ProductForm {
    /// Form pre-filled with an existing product (edit screen).
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
        }
    }

    /// Validate field types only: required fields, name length, numeric price.
    pub fn validate(&self) -> Result<ProductDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        } else {
            let len = name.chars().count();
            if len > NAME_MAX_CHARS {
                errors.add(
                    "name",
                    format!("Ensure this value has at most {NAME_MAX_CHARS} characters (it has {len})."),
                );
            }
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", REQUIRED);
        }

        let price = match parse_price(&self.price) {
            Ok(p) => Some(p),
            Err(msg) => {
                errors.add("price", msg);
                None
            }
        };

        errors.into_result()?;

        Ok(ProductDraft {
            name: name.to_string(),
            description: description.to_string(),
            // Only `None` when an error was recorded above.
            price: price.unwrap_or_default(),
        })
    }
}

const REQUIRED: &str = "This field is required.";

fn parse_price(raw: &str) -> Result<f64, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(REQUIRED);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err("Enter a number."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, description: &str, price: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            description: description.to_string(),
            price: price.to_string(),
        }
    }

    #[test]
    fn valid_form_produces_trimmed_draft() {
        let draft = form("  Bolt ", "M8 hex bolt", " 0.25 ").validate().unwrap();
        assert_eq!(draft.name, "Bolt");
        assert_eq!(draft.description, "M8 hex bolt");
        assert_eq!(draft.price, 0.25);
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let errors = ProductForm::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), ["This field is required."]);
        assert_eq!(errors.get("description"), ["This field is required."]);
        assert_eq!(errors.get("price"), ["This field is required."]);
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let errors = form("Bolt", "hex", "ten").validate().unwrap_err();
        assert_eq!(errors.get("price"), ["Enter a number."]);
        assert!(!errors.has("name"));
    }

    #[test]
    fn non_finite_price_is_rejected() {
        for raw in ["inf", "NaN", "-infinity"] {
            let errors = form("Bolt", "hex", raw).validate().unwrap_err();
            assert!(errors.has("price"), "{raw} should be rejected");
        }
    }

    #[test]
    fn negative_price_passes_type_validation() {
        let draft = form("Refund", "credit line", "-5").validate().unwrap();
        assert_eq!(draft.price, -5.0);
    }

    #[test]
    fn name_longer_than_limit_is_rejected() {
        let long = "x".repeat(NAME_MAX_CHARS + 1);
        let errors = form(&long, "d", "1").validate().unwrap_err();
        assert_eq!(
            errors.get("name"),
            ["Ensure this value has at most 100 characters (it has 101)."]
        );
    }

    #[test]
    fn from_product_round_trips_through_validation() {
        let product = Product {
            id: ProductId::new(3),
            name: "Gasket".to_string(),
            description: "Rubber".to_string(),
            price: 12.5,
        };
        let draft = ProductForm::from_product(&product).validate().unwrap();
        assert_eq!(draft.with_id(product.id), product);
    }
}
