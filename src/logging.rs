use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Installs the global subscriber. Events go to stderr so stdout stays CSV.
///
/// `log_level` is a bare level (`debug`) or a full filter directive
/// (`ledger_engine=trace,info`). `RUST_LOG`, when set, wins.
pub fn setup_logging(log_level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(log_level.trim()))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let subscriber = tracing_subscriber::registry().with(filter);

    if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_current_span(false);
        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact();
        subscriber.with(fmt_layer).init();
    }

    tracing::debug!(
        level = log_level,
        format = if json_format { "json" } else { "compact" },
        "logging initialized"
    );
}
