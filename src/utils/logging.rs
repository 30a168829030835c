/// Initialize tracing/logging for the application.
///
/// `RUST_LOG` wins when it is set; otherwise the filter falls back to
/// `default_level`.
pub fn init(default_level: &str) {
    let lvl = parse_level(default_level);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(lvl.to_string().to_lowercase()));

    // try_init so tests can call this more than once
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Maps a configured level name onto a `tracing::Level`, defaulting to INFO.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" | "warning" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    }
}
