use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("tick interval must be positive, got {0}ms")]
    InvalidTickInterval(u64),

    #[error("no tokio runtime available to drive the ticker")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),

    #[error("failed to read config file {path}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
