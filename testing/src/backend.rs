//! Scriptable in-memory purchase backend.
//!
//! [`MockStoreBackend`] implements [`StoreBackend`] without any platform
//! store. Tests script its catalog, purchase outcomes and failures; previews
//! and demos use [`MockStoreBackend::preview`], which starts already
//! populated and completes every purchase.

#![allow(clippy::module_name_repetitions)] // MockStoreBackend is the natural name

use crate::fixtures;
use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storefront_core::backend::{BackendFuture, StoreBackend};
use storefront_core::{BackendError, Product, ProductId, PurchaseOutcome};
use tokio::sync::Semaphore;

/// What the next scripted purchase does
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptedPurchase {
    /// Return this outcome
    Outcome(PurchaseOutcome),
    /// Fail with this error
    Error(BackendError),
    /// Panic inside the purchase future
    Panic,
}

#[derive(Debug)]
struct MockState {
    subscriptions: Vec<Product>,
    non_consumables: Vec<Product>,
    purchased: BTreeSet<ProductId>,
    started: bool,
    start_failures: VecDeque<BackendError>,
    purchase_script: VecDeque<ScriptedPurchase>,
    default_outcome: PurchaseOutcome,
    purchase_requests: Vec<ProductId>,
    gate: Option<Arc<Semaphore>>,
}

/// In-memory [`StoreBackend`] for tests and previews
///
/// # Example
///
/// ```
/// use storefront_core::{PurchaseOutcome, StoreBackend};
/// use storefront_testing::{MockStoreBackend, fixtures};
///
/// let backend = MockStoreBackend::new()
///     .with_non_consumables(fixtures::non_consumables())
///     .with_default_outcome(PurchaseOutcome::Cancelled);
///
/// assert_eq!(backend.non_consumable_products().len(), 3);
/// ```
#[derive(Debug)]
pub struct MockStoreBackend {
    state: Mutex<MockState>,
    start_calls: AtomicUsize,
    purchase_calls: AtomicUsize,
}

impl MockStoreBackend {
    /// An empty, not-yet-started backend whose purchases succeed
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                subscriptions: Vec::new(),
                non_consumables: Vec::new(),
                purchased: BTreeSet::new(),
                started: false,
                start_failures: VecDeque::new(),
                purchase_script: VecDeque::new(),
                default_outcome: PurchaseOutcome::Purchased,
                purchase_requests: Vec::new(),
                gate: None,
            }),
            start_calls: AtomicUsize::new(0),
            purchase_calls: AtomicUsize::new(0),
        }
    }

    /// A started backend with the fixture catalog, for previews and demos
    #[must_use]
    pub fn preview() -> Self {
        let backend = Self::new()
            .with_subscriptions(fixtures::subscriptions())
            .with_non_consumables(fixtures::non_consumables());
        backend.lock().started = true;
        backend
    }

    /// Sets the subscription list
    #[must_use]
    pub fn with_subscriptions(self, products: Vec<Product>) -> Self {
        self.set_subscriptions(products);
        self
    }

    /// Sets the one-time product list
    #[must_use]
    pub fn with_non_consumables(self, products: Vec<Product>) -> Self {
        self.set_non_consumables(products);
        self
    }

    /// Marks products as already purchased
    #[must_use]
    pub fn with_purchased<I, P>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProductId>,
    {
        self.lock().purchased.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Outcome returned when no purchase is scripted
    #[must_use]
    pub fn with_default_outcome(self, outcome: PurchaseOutcome) -> Self {
        self.lock().default_outcome = outcome;
        self
    }

    /// Replaces the subscription list
    pub fn set_subscriptions(&self, products: Vec<Product>) {
        self.lock().subscriptions = products;
    }

    /// Replaces the one-time product list
    pub fn set_non_consumables(&self, products: Vec<Product>) {
        self.lock().non_consumables = products;
    }

    /// Makes the next `start_or_refresh` fail with `error`
    pub fn fail_next_start(&self, error: BackendError) {
        self.lock().start_failures.push_back(error);
    }

    /// Queues a behaviour for the next purchase
    pub fn script_purchase(&self, purchase: ScriptedPurchase) {
        self.lock().purchase_script.push_back(purchase);
    }

    /// Queues an outcome for the next purchase
    pub fn push_outcome(&self, outcome: PurchaseOutcome) {
        self.script_purchase(ScriptedPurchase::Outcome(outcome));
    }

    /// Queues an error for the next purchase
    pub fn push_error(&self, error: BackendError) {
        self.script_purchase(ScriptedPurchase::Error(error));
    }

    /// Makes every backend call wait until [`MockStoreBackend::release`]
    pub fn hold(&self) {
        self.lock().gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Lets held and future calls proceed
    pub fn release(&self) {
        if let Some(gate) = self.lock().gate.take() {
            gate.close();
        }
    }

    /// Number of `start_or_refresh` calls so far
    #[must_use]
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// Number of `purchase` calls so far
    #[must_use]
    pub fn purchase_calls(&self) -> usize {
        self.purchase_calls.load(Ordering::SeqCst)
    }

    /// Products passed to `purchase`, in call order
    #[must_use]
    pub fn purchase_requests(&self) -> Vec<ProductId> {
        self.lock().purchase_requests.clone()
    }

    /// Whether a start has succeeded
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate(&self) -> Option<Arc<Semaphore>> {
        self.lock().gate.clone()
    }
}

impl Default for MockStoreBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits on a held gate; a closed gate lets everyone through
async fn pass(gate: Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        let _ = gate.acquire().await;
    }
}

impl StoreBackend for MockStoreBackend {
    fn start_or_refresh(&self) -> BackendFuture<'_, ()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate();

        Box::pin(async move {
            pass(gate).await;

            let mut state = self.lock();
            if let Some(error) = state.start_failures.pop_front() {
                return Err(error);
            }
            state.started = true;
            Ok(())
        })
    }

    fn purchase<'a>(&'a self, product: &'a Product) -> BackendFuture<'a, PurchaseOutcome> {
        self.purchase_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate();

        Box::pin(async move {
            pass(gate).await;

            let scripted = {
                let mut state = self.lock();
                state.purchase_requests.push(product.id.clone());
                if !state.started {
                    return Err(BackendError::NotStarted);
                }
                let default = ScriptedPurchase::Outcome(state.default_outcome);
                state.purchase_script.pop_front().unwrap_or(default)
            };

            match scripted {
                ScriptedPurchase::Outcome(outcome) => {
                    if outcome == PurchaseOutcome::Purchased {
                        self.lock().purchased.insert(product.id.clone());
                    }
                    Ok(outcome)
                },
                ScriptedPurchase::Error(error) => Err(error),
                #[allow(clippy::panic)] // Scripted panic for exit-path tests
                ScriptedPurchase::Panic => panic!("scripted purchase panic for {}", product.id),
            }
        })
    }

    fn subscription_products(&self) -> Vec<Product> {
        self.lock().subscriptions.clone()
    }

    fn non_consumable_products(&self) -> Vec<Product> {
        self.lock().non_consumables.clone()
    }

    fn purchased_product_ids(&self) -> BTreeSet<ProductId> {
        self.lock().purchased.clone()
    }
}
