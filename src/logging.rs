use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the tracing filter, e.g. `typestat=debug`
pub const LOG_ENV: &str = "TYPESTAT_LOG";

/// Install the global subscriber. Logs go to stderr so command output stays
/// pipeable. Calling twice is harmless.
pub fn init() {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_ansi(false),
        )
        .with(filter_layer)
        .try_init();
}
