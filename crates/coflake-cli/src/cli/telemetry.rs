use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::config::LogFormat;

/// Installs the global subscriber.
///
/// Verbosity comes from `RUST_LOG` and defaults to `warn`. Output always goes
/// to stderr; stdout is reserved for IDs.
pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_file(true)
                .with_writer(std::io::stderr)
                .pretty()
        }))
        .try_init()?;

    Ok(())
}
