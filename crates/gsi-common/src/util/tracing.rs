use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::{GsiError, GsiResult};

/// Installs the global fmt subscriber. `RUST_LOG` wins over `level` when set.
pub fn setup_tracing(level: Option<LevelFilter>) -> GsiResult<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.unwrap_or(LevelFilter::INFO).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| GsiError::Tracing(e.to_string()))
}

/// Picks the level from the command line over the configured one, INFO when neither parses.
pub fn resolve_level(cli: Option<LevelFilter>, configured: &str) -> LevelFilter {
    cli.or_else(|| configured.parse().ok())
        .unwrap_or(LevelFilter::INFO)
}
