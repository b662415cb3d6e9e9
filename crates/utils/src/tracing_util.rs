//! Logging setup for the `cimg` binary.
//!
//! Diagnostics always go to stderr, since stdout carries image tables and
//! loaded image names that scripts consume.

use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

/// Level used for stderr output when `RUST_LOG` is unset.
const DEFAULT_STDERR_LEVEL: LevelFilter = LevelFilter::WARN;

/// Level forwarded to the journal.
const JOURNAL_LEVEL: LevelFilter = LevelFilter::INFO;

fn stderr_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(DEFAULT_STDERR_LEVEL.into())
        .from_env_lossy()
}

/// The journal sink, present only for root with a reachable journald.
fn journal_layer<S>() -> Option<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if !rustix::process::getuid().is_root() {
        return None;
    }
    let layer = tracing_journald::layer().ok()?;
    Some(layer.with_filter(JOURNAL_LEVEL))
}

/// Install the global subscriber.
///
/// Stderr output honors `RUST_LOG` and shows warnings and up otherwise.
/// Loads and pulls run by system services as root also land in the journal
/// at info level.
pub fn initialize_tracing() {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(
            tracing_subscriber::fmt::format()
                .without_time()
                .with_target(false)
                .compact(),
        )
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(journal_layer())
        .init();
}
