//! Counters recorded by store sessions
//!
//! Each test installs a thread-local Prometheus recorder and drives a session
//! on a current-thread runtime, so counts are isolated from other tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::Future;
use std::sync::Arc;
use storefront_core::{BackendError, PurchaseOutcome};
use storefront_runtime::StoreSession;
use storefront_runtime::metrics::{
    PURCHASE_FAILURES_TOTAL, PURCHASES_TOTAL, RESTORE_RESULTS_TOTAL, SYNCS_TOTAL,
};
use storefront_testing::{CallbackRecorder, MockStoreBackend, fixtures};

/// Runs `scenario` with a local recorder and returns the rendered text
fn render_after<F, Fut>(scenario: F) -> String
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    metrics::with_local_recorder(&recorder, || runtime.block_on(scenario()));
    handle.render()
}

/// Value of the sample `name` carrying every label in `labels`
fn sample(rendered: &str, name: &str, labels: &[&str]) -> Option<u64> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(name)
                .is_some_and(|rest| rest.starts_with(['{', ' ']))
        })
        .find(|line| labels.iter().all(|label| line.contains(label)))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

fn session(backend: &Arc<MockStoreBackend>) -> StoreSession {
    StoreSession::new(
        fixtures::config(),
        Arc::clone(backend) as Arc<dyn storefront_core::StoreBackend>,
        CallbackRecorder::new().callbacks(),
    )
}

#[test]
fn purchases_are_counted_by_result_and_outcome() {
    let rendered = render_after(|| async {
        let backend = Arc::new(MockStoreBackend::preview());
        let session = session(&backend);
        session.sync_store_silently().await;
        let product = session.non_consumables()[0].clone();

        session.purchase(&product).await;
        backend.push_outcome(PurchaseOutcome::CannotPay);
        session.purchase(&product).await;
        backend.push_outcome(PurchaseOutcome::Pending);
        session.purchase(&product).await;
        backend.push_error(BackendError::Network("timed out".to_string()));
        session.purchase(&product).await;
    });

    assert_eq!(
        sample(&rendered, PURCHASES_TOTAL, &[r#"result="success""#, r#"outcome="purchased""#]),
        Some(1)
    );
    assert_eq!(
        sample(
            &rendered,
            PURCHASES_TOTAL,
            &[r#"result="user_cancelled""#, r#"outcome="cannot_pay""#]
        ),
        Some(1)
    );
    assert_eq!(
        sample(&rendered, PURCHASES_TOTAL, &[r#"result="pending""#, r#"outcome="pending""#]),
        Some(1)
    );
    assert_eq!(sample(&rendered, PURCHASE_FAILURES_TOTAL, &[]), Some(1));
}

#[test]
fn syncs_and_restore_results_are_counted() {
    let rendered = render_after(|| async {
        let backend = Arc::new(MockStoreBackend::preview().with_purchased(["tip.small"]));
        let session = session(&backend);

        session.sync_store_silently().await;
        backend.fail_next_start(BackendError::Store("unavailable".to_string()));
        session.restore_purchases().await;
        session.restore_purchases().await;
    });

    assert_eq!(sample(&rendered, SYNCS_TOTAL, &[r#"status="success""#]), Some(2));
    assert_eq!(sample(&rendered, SYNCS_TOTAL, &[r#"status="failure""#]), Some(1));
    assert_eq!(
        sample(&rendered, RESTORE_RESULTS_TOTAL, &[r#"result="failure""#]),
        Some(1)
    );
    assert_eq!(
        sample(&rendered, RESTORE_RESULTS_TOTAL, &[r#"result="success""#]),
        Some(1)
    );
}

#[test]
fn silent_sync_records_no_restore_result() {
    let rendered = render_after(|| async {
        let backend = Arc::new(MockStoreBackend::preview());
        session(&backend).sync_store_silently().await;
    });

    assert_eq!(sample(&rendered, SYNCS_TOTAL, &[r#"status="success""#]), Some(1));
    assert_eq!(sample(&rendered, RESTORE_RESULTS_TOTAL, &[]), None);
    assert_eq!(sample(&rendered, PURCHASES_TOTAL, &[]), None);
}
