use std::{path::PathBuf, time::Duration};

use mock_provider::ProviderError;

/// Failures of the harness itself, as opposed to failing test bodies.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("invalid duration for {field}: {value:?}: {source}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("SDK initialization failed: {0}")]
    SdkInit(String),

    #[error("global timeout of {0:?} exceeded")]
    GlobalTimeout(Duration),

    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
