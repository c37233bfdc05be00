//! Product handles and their display projection.
//!
//! A [`Product`] is the resolved handle a backend hands out from its catalog.
//! Callers pass these handles back into purchase operations, so a handle can
//! never refer to a product the backend does not know about.

use serde::{Deserialize, Serialize};

/// Store-defined product identifier (e.g. `tip.small`, `pro.monthly`)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a product identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which catalog list a product belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Auto-renewing subscription
    Subscription,
    /// One-time purchase
    NonConsumable,
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscription => write!(f, "subscription"),
            Self::NonConsumable => write!(f, "non_consumable"),
        }
    }
}

/// A product as reported by the purchase backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Store identifier
    pub id: ProductId,
    /// Subscription or one-time purchase
    pub kind: ProductKind,
    /// Localized display name
    pub display_name: String,
    /// Localized description
    pub description: String,
    /// Localized, formatted price (e.g. `$0.99`)
    pub display_price: String,
}

impl Product {
    /// Creates a product handle
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        kind: ProductKind,
        display_name: impl Into<String>,
        description: impl Into<String>,
        display_price: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            display_name: display_name.into(),
            description: description.into(),
            display_price: display_price.into(),
        }
    }

    /// Returns true for auto-renewing subscriptions
    #[must_use]
    pub fn is_subscription(&self) -> bool {
        self.kind == ProductKind::Subscription
    }
}

/// Display information for a single product
///
/// Always derived on demand from the current catalog entry; never cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Localized price string
    pub price: String,
}

impl From<&Product> for ProductInfo {
    fn from(product: &Product) -> Self {
        Self {
            name: product.display_name.clone(),
            description: product.description.clone(),
            price: product.display_price.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_info_projects_display_fields() {
        let product = Product::new(
            "tip.small",
            ProductKind::NonConsumable,
            "Small Tip",
            "Buy the developer a coffee",
            "$0.99",
        );

        let info = ProductInfo::from(&product);
        assert_eq!(info.name, "Small Tip");
        assert_eq!(info.description, "Buy the developer a coffee");
        assert_eq!(info.price, "$0.99");
        assert!(!product.is_subscription());
    }

    #[test]
    fn product_id_displays_raw_identifier() {
        let id = ProductId::new("pro.monthly");
        assert_eq!(id.to_string(), "pro.monthly");
        assert_eq!(id.as_str(), "pro.monthly");
        assert_eq!(id, ProductId::from("pro.monthly"));
    }
}
