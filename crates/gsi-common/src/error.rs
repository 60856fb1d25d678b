pub type GsiResult<T = (), E = GsiError> = Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum GsiError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Settings already initialized")]
    AlreadyInitialized,
    #[error("Settings not initialized")]
    NotInitialized,
    #[error("Runtime error: {0}")]
    Runtime(#[from] anyhow::Error),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Tracing error: {0}")]
    Tracing(String),
    #[error("Invalid Yaml: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
}
