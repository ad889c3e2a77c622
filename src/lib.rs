pub mod commands;
pub mod error;
pub mod models;
pub mod services;

pub use error::{ConfigError, ParseError, RosterError, StoreError, WorkflowError};
pub use models::config::AppConfig;
pub use services::ocr::{parse_capture, ScreenParser};

use models::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: tracing::Level = config
        .level
        .parse()
        .map_err(|_| ConfigError::InvalidLogLevel(config.level.clone()))?;

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;
    }

    Ok(())
}
