// Observability infrastructure using the tracing crate
// Structured logging that never blocks the polling loop

use anyhow::Result;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize the observability system
/// Human-readable output on stderr so renderer output on stdout stays
/// pipeable; set `json` for machine parsing instead
pub fn init(json: bool) -> Result<()> {
    // Configure filter from environment or use default
    // Example: RUST_LOG=skywatch=debug
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("skywatch=info"))
        .expect("Failed to create tracing filter");

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }

    Ok(())
}

/// Span covering one monitoring session
#[inline]
pub fn session_span(session_id: uuid::Uuid, resource_id: &str, region: &str) -> tracing::Span {
    tracing::info_span!(
        "monitor",
        resource_id = resource_id,
        region = region,
        session_id = %session_id,
    )
}
