//! Prometheus metrics for store sessions.
//!
//! Sessions record counters through the `metrics` facade. Nothing is exported
//! unless the host application installs a recorder, for example with
//! [`PrometheusMetrics::install`].
//!
//! # Example
//!
//! ```rust,no_run
//! use storefront_runtime::metrics::PrometheusMetrics;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::install()?;
//! // ... run sessions ...
//! println!("{}", metrics.render());
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use storefront_core::{PurchaseOutcome, PurchaseResult, RestoreResult};
use thiserror::Error;

/// Purchases that reached the backend, labelled by caller-visible result and raw outcome
pub const PURCHASES_TOTAL: &str = "storefront_purchases_total";
/// Purchases that failed with a backend error
pub const PURCHASE_FAILURES_TOTAL: &str = "storefront_purchase_failures_total";
/// Catalog syncs, labelled by status
pub const SYNCS_TOTAL: &str = "storefront_syncs_total";
/// Restore results shown to the user, labelled by result
pub const RESTORE_RESULTS_TOTAL: &str = "storefront_restore_results_total";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
pub struct PrometheusMetrics {
    handle: PrometheusHandle,
}

impl PrometheusMetrics {
    /// Registers metric descriptions and installs a global Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if a recorder is already installed.
    pub fn install() -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_metrics();
        tracing::info!("Prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        PURCHASES_TOTAL,
        "Total number of purchase attempts answered by the backend"
    );
    describe_counter!(
        PURCHASE_FAILURES_TOTAL,
        "Total number of purchase attempts that failed with a backend error"
    );
    describe_counter!(SYNCS_TOTAL, "Total number of catalog syncs");
    describe_counter!(
        RESTORE_RESULTS_TOTAL,
        "Total number of restore results shown to the user"
    );
}

pub(crate) fn record_purchase(result: &PurchaseResult, outcome: PurchaseOutcome) {
    counter!(
        PURCHASES_TOTAL,
        "result" => result.label(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub(crate) fn record_purchase_failure() {
    counter!(PURCHASE_FAILURES_TOTAL).increment(1);
}

pub(crate) fn record_sync(succeeded: bool) {
    let status = if succeeded { "success" } else { "failure" };
    counter!(SYNCS_TOTAL, "status" => status).increment(1);
}

pub(crate) fn record_restore_result(result: RestoreResult) {
    counter!(RESTORE_RESULTS_TOTAL, "result" => result.label()).increment(1);
}
