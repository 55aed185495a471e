//! Logging.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter, Layer,
};

/// Environment variable holding the filter directives, e.g. `rusty_compact_expfmt=trace`.
pub const LOG_LEVEL_ENV_VAR: &str = "CPRDECODE_LOG_LEVEL";

/// Environment variable switching the output to JSON when set to `true` or `1`.
pub const LOG_FORMAT_JSON_ENV_VAR: &str = "CPRDECODE_LOG_FORMAT_JSON";

/// Logs a message to standard error and exits the process with a non-zero exit code.
pub fn fatal_and_exit(message: String) -> ! {
    eprintln!("FATAL: {}", message);
    std::process::exit(1);
}

/// Initializes the global tracing subscriber.
///
/// Events go to standard error so that standard output only carries decoded
/// payloads. Filtering directives are read from `CPRDECODE_LOG_LEVEL`, falling
/// back to `default_level` (INFO if `None`).
///
/// # Errors
///
/// If the logging subsystem was already initialized, an error will be returned.
pub fn initialize_logging(
    default_level: Option<LevelFilter>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let is_json = std::env::var(LOG_FORMAT_JSON_ENV_VAR)
        .map(|s| s.trim().to_lowercase())
        .map(|s| s == "true" || s == "1")
        .unwrap_or(false);

    let level_filter = EnvFilter::builder()
        .with_default_directive(default_level.unwrap_or(LevelFilter::INFO).into())
        .with_env_var(LOG_LEVEL_ENV_VAR)
        .from_env_lossy();

    let layer = if is_json {
        tracing_subscriber::fmt::Layer::new()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::Layer::new()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(level_filter))
        .try_init()?;

    Ok(())
}
