//! Installs the global `tracing` subscriber: `RUST_LOG`-driven filtering,
//! human-readable output, and `tracing-error`'s span-trace capture for
//! `color-eyre` reports.

pub fn init() {
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::EnvFilter::try_new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "chainidx=info".to_owned()),
    )
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chainidx=info"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_error::ErrorLayer::default());
    let _ = tracing::subscriber::set_global_default(subscriber);
}
