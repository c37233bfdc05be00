//! # Storefront Runtime
//!
//! Runtime for the Storefront purchase package.
//!
//! This crate provides [`StoreSession`], the component a presentation layer
//! creates to drive a purchase screen. The session calls the purchase backend,
//! reports what happened to the session reducer, and executes the effects the
//! reducer returns.
//!
//! ## Core Components
//!
//! - **`StoreSession`**: Owns session state, calls the backend, runs effects
//! - **`SessionCallbacks`**: Purchase-succeeded and dismiss hooks for the presentation
//! - **Loading guard**: Clears the loading flag on every exit path of an operation
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use storefront_runtime::{SessionCallbacks, StoreSession};
//!
//! let session = StoreSession::new(
//!     config,
//!     Arc::new(platform_backend),
//!     SessionCallbacks::new()
//!         .on_purchase_success(|id| println!("thanks for buying {id}"))
//!         .on_dismiss(|| println!("closing")),
//! );
//!
//! // On mount
//! session.sync_store_silently().await;
//!
//! // User taps a product card
//! let product = session.non_consumables()[0].clone();
//! let result = session.purchase(&product).await;
//! ```

use std::sync::{Arc, Weak};
use storefront_core::effect::{Effect, Notification};
use storefront_core::environment::{Clock, SystemClock};
use storefront_core::reducer::Reducer;
use storefront_core::session::{
    Catalog, SessionAction, SessionEnvironment, SessionReducer, SessionState,
};
use storefront_core::{
    Product, ProductId, ProductInfo, PurchaseResult, RestoreResult, SmallVec, StoreBackend,
    StoreError, StorefrontConfig,
};
use tokio::sync::watch;

/// Prometheus metrics for observability
pub mod metrics;

/// Callback invoked with the identifier of a purchased product
type PurchaseCallback = Arc<dyn Fn(&ProductId) + Send + Sync>;

/// Callback invoked when the presentation should close
type DismissCallback = Arc<dyn Fn() + Send + Sync>;

/// Hooks the session uses to talk back to the presentation layer
///
/// Both default to no-ops. On a completed purchase the session calls
/// `on_purchase_success` and then `on_dismiss`, never concurrently.
#[derive(Clone)]
pub struct SessionCallbacks {
    on_purchase_success: PurchaseCallback,
    on_dismiss: DismissCallback,
}

impl SessionCallbacks {
    /// Callbacks that do nothing
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_purchase_success: Arc::new(|_| {}),
            on_dismiss: Arc::new(|| {}),
        }
    }

    /// Sets the purchase-succeeded hook
    #[must_use]
    pub fn on_purchase_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProductId) + Send + Sync + 'static,
    {
        self.on_purchase_success = Arc::new(callback);
        self
    }

    /// Sets the dismiss hook
    #[must_use]
    pub fn on_dismiss<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_dismiss = Arc::new(callback);
        self
    }
}

impl Default for SessionCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCallbacks").finish_non_exhaustive()
    }
}

/// Shared session internals
struct Inner {
    state: watch::Sender<SessionState>,
    reducer: SessionReducer,
    environment: SessionEnvironment,
    backend: Arc<dyn StoreBackend>,
    callbacks: SessionCallbacks,
    config: StorefrontConfig,
}

impl Inner {
    /// Runs an action through the reducer and executes the resulting effects
    ///
    /// The reducer runs inside a single synchronous state update, so this is
    /// safe to call from `Drop`. Observers are woken when the scalar flags
    /// change or the catalog is replaced.
    fn dispatch(self: &Arc<Self>, action: SessionAction) {
        let mut effects: SmallVec<[Effect<SessionAction>; 4]> = SmallVec::new();

        self.state.send_if_modified(|state| {
            let replaces_catalog = action.replaces_catalog();
            let before = state.flags();
            effects = self.reducer.reduce(state, action, &self.environment);
            replaces_catalog || state.flags() != before
        });

        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(self: &Arc<Self>, effect: Effect<SessionAction>) {
        match effect {
            Effect::None => {},
            Effect::Sequential(effects) => {
                for effect in effects {
                    self.execute(effect);
                }
            },
            Effect::Notify(Notification::PurchaseSucceeded(product_id)) => {
                (self.callbacks.on_purchase_success)(&product_id);
            },
            Effect::Notify(Notification::DismissRequested) => {
                (self.callbacks.on_dismiss)();
            },
            Effect::Delay { duration, action } => {
                let Ok(handle) = tokio::runtime::Handle::try_current() else {
                    tracing::warn!(?action, "No tokio runtime available, dropping delayed action");
                    return;
                };

                // The timer must not keep a dropped session alive
                let inner: Weak<Self> = Arc::downgrade(self);
                handle.spawn(async move {
                    tokio::time::sleep(duration).await;
                    if let Some(inner) = inner.upgrade() {
                        inner.dispatch(*action);
                    }
                });
            },
        }
    }
}

/// RAII guard that holds the loading flag for one operation
///
/// Dispatches `LoadingFinished` on drop, so the flag clears on success,
/// early return, backend error, panic, or the operation future being dropped.
struct LoadingGuard<'a> {
    inner: &'a Arc<Inner>,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(inner: &'a Arc<Inner>) -> Self {
        inner.dispatch(SessionAction::LoadingStarted);
        Self { inner }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.inner.dispatch(SessionAction::LoadingFinished);
    }
}

/// Purchase session controller
///
/// The single authority over loading, catalog and restore-result state, and
/// the only caller of the purchase backend. Cloning is cheap; clones share the
/// same state.
///
/// # Concurrency
///
/// Operations are not serialized against each other. Each one sets the
/// loading flag when it starts and clears it when it ends, so with
/// overlapping calls the flag reflects whichever call finished last.
#[derive(Clone)]
pub struct StoreSession {
    inner: Arc<Inner>,
}

impl StoreSession {
    /// Creates a session with an empty catalog, using the system clock
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        backend: Arc<dyn StoreBackend>,
        callbacks: SessionCallbacks,
    ) -> Self {
        Self::with_clock(config, backend, callbacks, Arc::new(SystemClock))
    }

    /// Creates a session with an injected clock
    #[must_use]
    pub fn with_clock(
        config: StorefrontConfig,
        backend: Arc<dyn StoreBackend>,
        callbacks: SessionCallbacks,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let environment = SessionEnvironment::new(clock)
            .with_restore_result_display(config.restore_result_display());
        let (state, _) = watch::channel(SessionState::default());

        Self {
            inner: Arc::new(Inner {
                state,
                reducer: SessionReducer::new(),
                environment,
                backend,
                callbacks,
                config,
            }),
        }
    }

    /// Purchases a product previously returned by the backend
    ///
    /// Starts the backend first if no sync has succeeded yet. The loading
    /// flag is held for the whole call.
    ///
    /// On `Purchased` the purchase-succeeded callback fires with the product
    /// identifier, followed by the dismiss callback. Every other outcome
    /// leaves the callbacks alone.
    ///
    /// # Returns
    ///
    /// The caller-visible result, or `None` if the backend failed before
    /// producing an outcome. Failures are logged, never returned.
    #[tracing::instrument(skip_all, name = "store_purchase", fields(product_id = %product.id))]
    pub async fn purchase(&self, product: &Product) -> Option<PurchaseResult> {
        let _loading = LoadingGuard::acquire(&self.inner);

        let started = self.inner.state.borrow().backend_started;
        if !started && !self.run_sync(false).await {
            if self.logging() {
                tracing::warn!("Backend could not be started, abandoning purchase");
            }
            return None;
        }

        let outcome = match self.inner.backend.purchase(product).await {
            Ok(outcome) => outcome,
            Err(error) => {
                if self.logging() {
                    tracing::error!(%error, "Purchase failed");
                }
                metrics::record_purchase_failure();
                return None;
            },
        };

        let result = PurchaseResult::from_outcome(product.id.clone(), outcome);
        if self.logging() {
            tracing::info!(%outcome, result = result.label(), "Purchase completed");
        }
        metrics::record_purchase(&result, outcome);

        self.inner.dispatch(SessionAction::PurchaseCompleted {
            product_id: product.id.clone(),
            outcome,
        });

        Some(result)
    }

    /// Purchases a product by identifier
    ///
    /// The identifier is resolved against the last-synced catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ProductNotFound`] if the catalog has no such
    /// product; the backend is not called and the loading flag is untouched.
    pub async fn purchase_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<PurchaseResult>, StoreError> {
        let product = self.find_product(product_id)?;
        Ok(self.purchase(&product).await)
    }

    /// Refreshes the catalog from the backend
    ///
    /// On success both product lists are replaced. With `show_result`, the
    /// restore result becomes `Success` if the backend reports any purchased
    /// product and `NothingToRestore` otherwise. On failure the catalog is
    /// kept and, with `show_result`, the restore result becomes `Failure`.
    #[tracing::instrument(skip(self), name = "store_sync")]
    pub async fn sync_store(&self, show_result: bool) {
        let _loading = LoadingGuard::acquire(&self.inner);
        self.run_sync(show_result).await;
    }

    /// Refreshes the catalog without showing a restore result
    pub async fn sync_store_silently(&self) {
        self.sync_store(false).await;
    }

    /// User-initiated restore: refreshes and reports a restore result
    pub async fn restore_purchases(&self) {
        self.sync_store(true).await;
    }

    /// Clears the restore result; does nothing if none is shown
    pub fn dismiss_restore_result(&self) {
        self.inner.dispatch(SessionAction::DismissRestoreResult);
    }

    /// Display information for a product
    #[must_use]
    pub fn product_info(&self, product: &Product) -> ProductInfo {
        self.inner.backend.display_info(product)
    }

    /// Display information for a product in the last-synced catalog
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ProductNotFound`] if the catalog has no such product.
    pub fn product_info_by_id(&self, product_id: &ProductId) -> Result<ProductInfo, StoreError> {
        let product = self.find_product(product_id)?;
        Ok(self.product_info(&product))
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes
    ///
    /// The receiver is notified whenever an operation actually changes the
    /// state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// True while a purchase or sync is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    /// The restore result currently shown, if any
    #[must_use]
    pub fn restore_result(&self) -> Option<RestoreResult> {
        self.inner.state.borrow().restore_result
    }

    /// Snapshot of the catalog
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        self.inner.state.borrow().catalog.clone()
    }

    /// Subscription products in backend order
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Product> {
        self.inner.state.borrow().catalog.subscriptions.clone()
    }

    /// One-time products in backend order
    #[must_use]
    pub fn non_consumables(&self) -> Vec<Product> {
        self.inner.state.borrow().catalog.non_consumables.clone()
    }

    /// The configuration this session was created with
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    fn logging(&self) -> bool {
        self.inner.config.logging_enabled()
    }

    fn find_product(&self, product_id: &ProductId) -> Result<Product, StoreError> {
        let found = self.inner.state.borrow().catalog.find(product_id).cloned();
        found.ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))
    }

    /// Calls `start_or_refresh` once and reports the result to the reducer
    ///
    /// Returns true if the backend call succeeded.
    async fn run_sync(&self, show_result: bool) -> bool {
        let backend = &self.inner.backend;

        match backend.start_or_refresh().await {
            Ok(()) => {
                let subscriptions = backend.subscription_products();
                let non_consumables = backend.non_consumable_products();
                let has_purchases = !backend.purchased_product_ids().is_empty();

                if self.logging() {
                    tracing::debug!(
                        subscriptions = subscriptions.len(),
                        non_consumables = non_consumables.len(),
                        has_purchases,
                        "Store synced"
                    );
                }
                metrics::record_sync(true);
                if show_result {
                    metrics::record_restore_result(RestoreResult::from_sync(has_purchases));
                }

                self.inner.dispatch(SessionAction::SyncSucceeded {
                    subscriptions,
                    non_consumables,
                    has_purchases,
                    show_result,
                });
                true
            },
            Err(error) => {
                if self.logging() {
                    tracing::error!(%error, show_result, "Store sync failed");
                }
                metrics::record_sync(false);
                if show_result {
                    metrics::record_restore_result(RestoreResult::Failure);
                }

                self.inner.dispatch(SessionAction::SyncFailed { show_result });
                false
            },
        }
    }
}

impl std::fmt::Debug for StoreSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSession")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}
