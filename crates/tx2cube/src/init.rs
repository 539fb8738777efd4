// Logging/tracing setup for the runner

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tx2cube_config::{EtlConfig, LogFormat};

/// Initialize tracing from the resolved configuration.
pub(crate) fn init_tracing(config: &EtlConfig) {
    let env_filter =
        EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log.format {
        LogFormat::Json => {
            registry.with(fmt::layer().json()).init();
        }
        LogFormat::Text => {
            registry.with(fmt::layer()).init();
        }
    }
}
