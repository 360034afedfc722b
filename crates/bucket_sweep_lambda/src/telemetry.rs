use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info";

/// Installs JSON logging filtered by `RUST_LOG` (default `info`).
///
/// Timestamps and targets are left out: CloudWatch stamps ingestion time and
/// the events already carry their own fields.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
