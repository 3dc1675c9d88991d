use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter(default_log_settings: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_settings))
}

/// Sets the logging (tracing) level using RUST_LOG, falling back to the supplied default log settings.
/// A subscriber that is already installed is left in place.
pub fn setup_logging(default_log_settings: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_log_settings))
        .with(fmt::layer())
        .try_init();
}

/// Same as `setup_logging`, but writes to stderr so stdout stays machine readable.
pub fn setup_cli_logging(default_log_settings: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_log_settings))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
