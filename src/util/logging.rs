use std::path::Path;

use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialise tracing for the CLI.
///
/// Always logs to stderr; when `log_dir` is given, a daily-rolling plain-text
/// file is written there as well. `verbose` widens the filter to debug.
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("spopt=debug,warn")
    } else {
        EnvFilter::new("spopt=info,warn")
    };

    let registry = tracing_subscriber::registry().with(filter);

    match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "spopt.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            // The guard must outlive the process; init_logging runs once.
            std::mem::forget(guard);

            registry
                .with(fmt::layer().with_target(true))
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
        }
        None => registry.with(fmt::layer().with_target(true)).init(),
    }

    Ok(())
}
