//! Error taxonomy for sessions and backends.

use crate::product::ProductId;
use thiserror::Error;

/// Errors raised by a purchase backend implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// An operation needed the backend to be started first.
    #[error("Purchase backend has not been started")]
    NotStarted,

    /// Network failure talking to the store.
    #[error("Network error: {0}")]
    Network(String),

    /// The store itself reported an error.
    #[error("Store error: {0}")]
    Store(String),

    /// A transaction could not be verified.
    #[error("Verification error: {0}")]
    Verification(String),
}

/// Errors surfaced to callers of the purchase package.
///
/// `StoreSession` only returns [`StoreError::ProductNotFound`], from its
/// identifier-based lookups; purchases and syncs convert backend failures
/// into state instead. [`StoreError::BackendNotStarted`] and
/// [`StoreError::Backend`] are for code that drives a [`StoreBackend`]
/// directly, such as platform adapters or host-side restore jobs, where `?`
/// converts a [`BackendError`] through the `From` impl below.
///
/// [`StoreBackend`]: crate::backend::StoreBackend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The identifier is not in the last-synced catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The backend was used before its first successful start.
    #[error("Purchase backend has not been started")]
    BackendNotStarted,

    /// Opaque backend failure.
    #[error("Backend failure: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for StoreError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::NotStarted => Self::BackendNotStarted,
            other => Self::Backend(other),
        }
    }
}
