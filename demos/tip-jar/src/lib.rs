//! Tip jar demo
//!
//! A small tip screen on top of a [`StoreSession`]: sync on mount, leave a
//! tip, restore, dismiss. The binary runs it against the preview backend.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use storefront_core::config::ConfigError;
use storefront_core::{ProductId, PurchaseResult, RestoreResult, StoreBackend, StorefrontConfig};
use storefront_runtime::{SessionCallbacks, StoreSession};
use storefront_testing::fixtures;

/// Resolves the demo configuration
///
/// A path wins. Without one, `STOREFRONT_*` variables are read through
/// `lookup`; if the URLs are not set the fixture configuration is used.
///
/// # Errors
///
/// Returns the loader's error for an unreadable or invalid file, or for
/// variables that are present but invalid.
pub fn load_config<F>(path: Option<&Path>, lookup: F) -> Result<StorefrontConfig, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    if let Some(path) = path {
        return StorefrontConfig::from_toml_file(path);
    }

    match StorefrontConfig::from_lookup(lookup) {
        Err(ConfigError::Missing(field)) => {
            tracing::info!(field, "No configuration found, using defaults");
            Ok(fixtures::config())
        },
        other => other,
    }
}

/// Counts of the callbacks a tip jar session fired
#[derive(Debug, Default)]
pub struct Thanks {
    tips: AtomicUsize,
    closes: AtomicUsize,
}

impl Thanks {
    /// Successful tips so far
    #[must_use]
    pub fn tips(&self) -> usize {
        self.tips.load(Ordering::SeqCst)
    }

    /// Times the screen asked to close
    #[must_use]
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Builds a session whose callbacks count into the returned [`Thanks`]
#[must_use]
pub fn tip_jar_session(
    config: StorefrontConfig,
    backend: Arc<dyn StoreBackend>,
) -> (StoreSession, Arc<Thanks>) {
    let thanks = Arc::new(Thanks::default());
    let on_tip = Arc::clone(&thanks);
    let on_close = Arc::clone(&thanks);

    let callbacks = SessionCallbacks::new()
        .on_purchase_success(move |id| {
            tracing::info!(product_id = %id, "Thank you for the tip");
            on_tip.tips.fetch_add(1, Ordering::SeqCst);
        })
        .on_dismiss(move || {
            on_close.closes.fetch_add(1, Ordering::SeqCst);
        });

    (StoreSession::new(config, backend, callbacks), thanks)
}

/// What one pass through the tip screen produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// Result of the tip purchase, `None` if the backend failed
    pub tip: Option<PurchaseResult>,
    /// Restore banner shown after the restore button
    pub restore: Option<RestoreResult>,
}

/// Syncs, tips with `tip`, restores and dismisses the banner
///
/// # Errors
///
/// Returns an error if `tip` is not in the synced catalog.
pub async fn visit(session: &StoreSession, tip: &ProductId) -> anyhow::Result<Visit> {
    session.sync_store_silently().await;

    for product in session.non_consumables() {
        let info = session.product_info(&product);
        tracing::info!(product_id = %product.id, name = %info.name, price = %info.price, "Tip option");
    }

    let tip = session.purchase_product(tip).await?;
    session.restore_purchases().await;
    let restore = session.restore_result();
    session.dismiss_restore_result();

    Ok(Visit { tip, restore })
}
