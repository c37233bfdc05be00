//! Tip jar binary
//!
//! Usage: `tip-jar [CONFIG.toml]`

use std::path::PathBuf;
use std::sync::Arc;
use storefront_core::ProductId;
use storefront_runtime::metrics::PrometheusMetrics;
use storefront_testing::MockStoreBackend;
use tip_jar::{load_config, tip_jar_session, visit};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = load_config(path.as_deref(), |key| std::env::var(key).ok())?;

    let default_filter = if config.logging_enabled() {
        "tip_jar=debug,storefront_runtime=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics = PrometheusMetrics::install()?;

    println!("=== Tip Jar ===\n");
    println!("Privacy: {}", config.privacy_url());
    println!("Terms:   {}", config.terms_url());
    println!("Accent:  {}\n", config.theme().colors.primary);

    let (session, thanks) = tip_jar_session(config, Arc::new(MockStoreBackend::preview()));
    let report = visit(&session, &ProductId::from("tip.medium")).await?;

    println!("Tip:     {:?}", report.tip.as_ref().map(|result| result.label()));
    println!("Restore: {:?}", report.restore.map(|result| result.label()));
    println!("Thanks:  {} tip(s), {} close request(s)", thanks.tips(), thanks.closes());
    println!("Loading: {}", session.is_loading());

    println!("\n=== Metrics ===\n");
    println!("{}", metrics.render());

    Ok(())
}
