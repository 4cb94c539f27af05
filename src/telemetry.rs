use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber
///
/// `RUST_LOG` takes precedence; `log_level` is used when it is unset.
pub fn init(log_level: &str) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", log_level, e))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
