//! Log output for the `apiguard` binary.

use std::io;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the process-wide subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level`. With `json`, each event is one
/// JSON object per line. Only the first call in a process has any effect.
pub fn init_tracing(json: bool, level: Level) {
    let plain = (!json).then(|| fmt::layer().with_target(false).with_writer(io::stderr));
    let structured = json.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(io::stderr)
            .json()
    });

    tracing_subscriber::registry()
        .with(log_filter(level))
        .with(plain)
        .with(structured)
        .try_init()
        .ok();
}

fn log_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}
