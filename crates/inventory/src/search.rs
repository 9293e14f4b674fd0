//! Case-insensitive substring search over names.

use serde::Serialize;

use crate::{Product, Warehouse};

/// Optional name filter taken from a `?q=` query parameter.
///
/// An absent or empty value means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameFilter(Option<String>);

impl NameFilter {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn from_query(q: Option<&str>) -> Self {
        match q {
            Some(q) if !q.is_empty() => Self(Some(q.to_string())),
            _ => Self(None),
        }
    }

    pub fn needle(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// `true` when `name` contains the needle, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        match self.needle() {
            None => true,
            Some(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
        }
    }

    /// SQL `LIKE`/`ILIKE` pattern (`%needle%`) with the needle's own wildcard
    /// and escape characters escaped by `\`.
    pub fn like_pattern(&self) -> Option<String> {
        self.0.as_ref().map(|needle| {
            let mut out = String::with_capacity(needle.len() + 2);
            out.push('%');
            for c in needle.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('%');
            out
        })
    }
}

/// Anything listed by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Warehouse {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Product {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Keep the rows whose name matches `filter`, preserving order.
pub fn filter_by_name<T: Named>(items: impl IntoIterator<Item = T>, filter: &NameFilter) -> Vec<T> {
    items.into_iter().filter(|i| filter.matches(i.name())).collect()
}
