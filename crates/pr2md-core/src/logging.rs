//! Tracing setup for the pr2md binary

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing on stderr. `RUST_LOG` takes precedence over `level`.
///
/// The returned guard flushes buffered log lines when dropped, so keep it
/// alive until the program exits.
pub fn init_logging(level: &str) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .without_time(),
        )
        .init();

    guard
}
