//! Logging setup for the console.
//!
//! Logs go to stderr so they never interleave with event output on stdout.
//! Set `DEBUG_LOGGING=1` to enable debug output for ancestral crates.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter_directive = if debug_logging {
        "info,ancestral_core=debug,ancestral_cli=debug,ancestral=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::new(filter_directive);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();

    tracing::info!(debug_logging, "Ancestral logging initialized");
}
