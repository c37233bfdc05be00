//! # Storefront Testing
//!
//! Testing utilities and helpers for the Storefront purchase package.
//!
//! This crate provides:
//! - [`MockStoreBackend`], a scriptable in-memory purchase backend
//! - Fixtures: sample catalog and configuration
//! - A deterministic clock
//! - [`CallbackRecorder`] for asserting callback order
//! - Property-based testing strategies
//! - [`ReducerTest`] for Given-When-Then reducer tests
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use storefront_runtime::StoreSession;
//! use storefront_testing::{CallbackRecorder, MockStoreBackend, fixtures, test_clock};
//!
//! #[tokio::test]
//! async fn restore_with_purchases() {
//!     let backend = Arc::new(MockStoreBackend::preview().with_purchased(["tip.small"]));
//!     let recorder = CallbackRecorder::new();
//!     let session = StoreSession::with_clock(
//!         fixtures::config(),
//!         backend,
//!         recorder.callbacks(),
//!         Arc::new(test_clock()),
//!     );
//!
//!     session.restore_purchases().await;
//!     assert_eq!(session.restore_result(), Some(RestoreResult::Success));
//! }
//! ```

use chrono::{DateTime, Utc};
use storefront_core::environment::Clock;

pub mod backend;
pub mod fixtures;

/// Ergonomic reducer testing utilities
pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use storefront_testing::mocks::FixedClock;
    /// use storefront_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities
pub mod helpers {
    use std::sync::{Arc, Mutex, PoisonError};
    use storefront_core::ProductId;
    use storefront_runtime::SessionCallbacks;

    /// A callback the session invoked
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum CallbackEvent {
        /// `on_purchase_success` with this product
        PurchaseSucceeded(ProductId),
        /// `on_dismiss`
        Dismissed,
    }

    /// Records session callbacks in invocation order
    #[derive(Clone, Debug, Default)]
    pub struct CallbackRecorder {
        events: Arc<Mutex<Vec<CallbackEvent>>>,
    }

    impl CallbackRecorder {
        /// Creates an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Callbacks that append to this recorder
        #[must_use]
        pub fn callbacks(&self) -> SessionCallbacks {
            let on_success = Arc::clone(&self.events);
            let on_dismiss = Arc::clone(&self.events);

            SessionCallbacks::new()
                .on_purchase_success(move |id| {
                    on_success
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(CallbackEvent::PurchaseSucceeded(id.clone()));
                })
                .on_dismiss(move || {
                    on_dismiss
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(CallbackEvent::Dismissed);
                })
        }

        /// Everything recorded so far
        #[must_use]
        pub fn events(&self) -> Vec<CallbackEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// True if no callback has fired
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.events().is_empty()
        }
    }

    /// Installs a test-friendly tracing subscriber once per process
    ///
    /// Honors `RUST_LOG`; defaults to `storefront_runtime=debug`.
    pub fn init_test_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "storefront_runtime=debug".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use storefront_core::{BackendError, Product, ProductKind, PurchaseOutcome};

    use crate::backend::ScriptedPurchase;

    /// Any backend purchase outcome
    pub fn arb_outcome() -> impl Strategy<Value = PurchaseOutcome> {
        prop_oneof![
            Just(PurchaseOutcome::Purchased),
            Just(PurchaseOutcome::Cancelled),
            Just(PurchaseOutcome::Pending),
            Just(PurchaseOutcome::InProgress),
            Just(PurchaseOutcome::NotStarted),
            Just(PurchaseOutcome::Unknown),
            Just(PurchaseOutcome::NotPurchased),
            Just(PurchaseOutcome::CannotPay),
            Just(PurchaseOutcome::Failed),
            Just(PurchaseOutcome::FailedVerification),
        ]
    }

    /// Any backend error
    pub fn arb_backend_error() -> impl Strategy<Value = BackendError> {
        prop_oneof![
            Just(BackendError::NotStarted),
            "[a-z ]{1,16}".prop_map(BackendError::Network),
            "[a-z ]{1,16}".prop_map(BackendError::Store),
            "[a-z ]{1,16}".prop_map(BackendError::Verification),
        ]
    }

    /// A scripted purchase that returns an outcome or fails (never panics)
    pub fn arb_scripted_purchase() -> impl Strategy<Value = ScriptedPurchase> {
        prop_oneof![
            3 => arb_outcome().prop_map(ScriptedPurchase::Outcome),
            1 => arb_backend_error().prop_map(ScriptedPurchase::Error),
        ]
    }

    /// A product with a unique-enough identifier
    pub fn arb_product() -> impl Strategy<Value = Product> {
        (
            "[a-z]{3,8}\\.[a-z]{3,8}",
            prop_oneof![Just(ProductKind::Subscription), Just(ProductKind::NonConsumable)],
            "[A-Za-z ]{1,20}",
            "\\$[0-9]{1,2}\\.99",
        )
            .prop_map(|(id, kind, name, price)| {
                Product::new(id, kind, name, "", price)
            })
    }

    /// A product list of up to `max` entries
    pub fn arb_products(max: usize) -> impl Strategy<Value = Vec<Product>> {
        prop::collection::vec(arb_product(), 0..=max)
    }
}

// Re-export commonly used items
pub use backend::{MockStoreBackend, ScriptedPurchase};
pub use helpers::{CallbackEvent, CallbackRecorder, init_test_tracing};
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_recorder_starts_empty() {
        let recorder = CallbackRecorder::new();
        let _callbacks = recorder.callbacks();
        assert!(recorder.is_empty());
    }
}
