//! The purchase backend port.
//!
//! The session never talks to a platform store directly. Everything it needs
//! from the in-app purchase library goes through [`StoreBackend`]:
//!
//! - Start (or refresh) the backend's product and purchase state
//! - Execute a purchase for a resolved product handle
//! - Read the current product lists and purchased identifiers
//!
//! # Implementations
//!
//! - Platform bindings (outside this workspace): the real store
//! - `MockStoreBackend` (in `storefront-testing`): scriptable, in-memory, also
//!   usable as a preview backend
//!
//! # Example
//!
//! ```no_run
//! use storefront_core::backend::StoreBackend;
//! use storefront_core::error::BackendError;
//!
//! async fn refresh<B: StoreBackend + ?Sized>(backend: &B) -> Result<usize, BackendError> {
//!     backend.start_or_refresh().await?;
//!     Ok(backend.subscription_products().len() + backend.non_consumable_products().len())
//! }
//! ```

use crate::error::BackendError;
use crate::outcome::PurchaseOutcome;
use crate::product::{Product, ProductId, ProductInfo};
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by backend operations
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// In-app purchase backend consumed by the session.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the session shares one backend
/// behind an `Arc` and may call into it from spawned tasks.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so sessions can hold an `Arc<dyn StoreBackend>`.
pub trait StoreBackend: Send + Sync {
    /// Initializes the backend on first use, or re-fetches products and
    /// purchases on later calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or rejects the request.
    fn start_or_refresh(&self) -> BackendFuture<'_, ()>;

    /// Runs a purchase for a product previously returned by this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction could not be attempted at all
    /// (network failure, backend not started). Declines and cancellations
    /// are reported as [`PurchaseOutcome`] values, not errors.
    fn purchase<'a>(&'a self, product: &'a Product) -> BackendFuture<'a, PurchaseOutcome>;

    /// Subscription products in backend order. Valid after a successful start.
    fn subscription_products(&self) -> Vec<Product>;

    /// One-time products in backend order. Valid after a successful start.
    fn non_consumable_products(&self) -> Vec<Product>;

    /// Identifiers of every product the user currently owns.
    fn purchased_product_ids(&self) -> BTreeSet<ProductId>;

    /// Display information for a product.
    fn display_info(&self, product: &Product) -> ProductInfo {
        ProductInfo::from(product)
    }
}
