use gsi_common::error::GsiError;
use gsi_operator::error::OperatorError;
use thiserror::Error;

pub type GsiCliResult<T = (), E = GsiCliError> = Result<T, E>;

#[derive(Debug, Error)]
pub enum GsiCliError {
    #[error("Unable to initialize config: {0}")]
    InitConfig(String),
    #[error("Unable to serialize settings: {0}")]
    Serialize(String),
    #[error("Operator failed: {0}")]
    Operator(#[from] OperatorError),
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<GsiError> for GsiCliError {
    fn from(error: GsiError) -> Self {
        match error {
            GsiError::Config(e) => GsiCliError::InitConfig(e.to_string()),
            e @ (GsiError::AlreadyInitialized | GsiError::NotInitialized) => {
                GsiCliError::InitConfig(e.to_string())
            }
            other => GsiCliError::Runtime(other.to_string()),
        }
    }
}

impl From<serde_yaml::Error> for GsiCliError {
    fn from(error: serde_yaml::Error) -> Self {
        GsiCliError::Serialize(error.to_string())
    }
}

impl From<anyhow::Error> for GsiCliError {
    fn from(error: anyhow::Error) -> Self {
        GsiCliError::Runtime(error.to_string())
    }
}
