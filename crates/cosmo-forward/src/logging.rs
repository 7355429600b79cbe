//! Tracing subscriber setup.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Filter for the subscriber.
///
/// `directives` (normally `RUST_LOG`) wins when set; otherwise the level is
/// `warn`, or `info` with `--verbose`.
#[must_use]
pub fn env_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let default = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    EnvFilter::builder()
        .with_default_directive(default.into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Install the global subscriber, writing to stderr.
pub fn init(verbose: bool) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(verbose, directives.as_deref()))
        .init();
}
