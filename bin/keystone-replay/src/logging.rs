//! Logging initialization.

use std::io;

use tracing::{Level, info};
use tracing_subscriber::{
    EnvFilter, Layer, fmt::layer, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global subscriber.
///
/// Logs go to stderr so that stdout carries only the final report. The
/// default level is INFO and `RUST_LOG` overrides it.
pub(crate) fn init(json_format: bool) {
    let filt = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let stderr_sub = if json_format {
        layer()
            .json()
            .with_writer(io::stderr)
            .with_filter(filt)
            .boxed()
    } else {
        layer()
            .compact()
            .with_writer(io::stderr)
            .with_filter(filt)
            .boxed()
    };

    tracing_subscriber::registry().with(stderr_sub).init();

    info!(json_format, "logging initialized");
}
