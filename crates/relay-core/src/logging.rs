//! `tracing-subscriber` initialisation.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Returns `false` if a
/// global subscriber was already installed (e.g. by a test harness).
pub fn init_subscriber(level: &str, json: bool) -> bool {
    let filter = build_filter(level);
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry.with(fmt::layer().compact().with_target(true)).try_init()
    };
    result.is_ok()
}

/// Run `f` with a scoped stderr subscriber.
///
/// Used while settings are loaded, before the global subscriber exists, so
/// warnings about corrected or ignored values are not lost.
pub fn with_bootstrap_logging<T>(level: &str, f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(fmt::layer().compact().with_writer(std::io::stderr));
    tracing::subscriber::with_default(subscriber, f)
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
