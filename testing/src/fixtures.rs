//! Sample products and configuration shared by tests, previews and demos.

use storefront_core::{Product, ProductKind, StorefrontConfig};

/// Privacy URL used by [`config`]
pub const PRIVACY_URL: &str = "https://example.com/privacy";

/// Terms URL used by [`config`]
pub const TERMS_URL: &str = "https://example.com/terms";

/// Two subscriptions: `pro.monthly`, `pro.yearly`
#[must_use]
pub fn subscriptions() -> Vec<Product> {
    vec![
        Product::new(
            "pro.monthly",
            ProductKind::Subscription,
            "Pro Monthly",
            "All features, billed monthly",
            "$2.99",
        ),
        Product::new(
            "pro.yearly",
            ProductKind::Subscription,
            "Pro Yearly",
            "All features, billed yearly",
            "$24.99",
        ),
    ]
}

/// Three tips: `tip.small`, `tip.medium`, `tip.large`
#[must_use]
pub fn non_consumables() -> Vec<Product> {
    vec![
        Product::new(
            "tip.small",
            ProductKind::NonConsumable,
            "Small Tip",
            "A coffee for the developer",
            "$0.99",
        ),
        Product::new(
            "tip.medium",
            ProductKind::NonConsumable,
            "Medium Tip",
            "Lunch for the developer",
            "$4.99",
        ),
        Product::new(
            "tip.large",
            ProductKind::NonConsumable,
            "Large Tip",
            "Dinner for the developer",
            "$9.99",
        ),
    ]
}

/// Default configuration with logging enabled
///
/// # Panics
///
/// Panics if the hardcoded URLs fail to parse, which should never happen.
#[must_use]
#[allow(clippy::expect_used)]
pub fn config() -> StorefrontConfig {
    StorefrontConfig::new(PRIVACY_URL, TERMS_URL)
        .expect("hardcoded URLs should always parse")
        .with_logging(true)
}
