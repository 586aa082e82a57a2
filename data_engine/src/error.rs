use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the generation and enrichment pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A caller passed an argument the computation cannot use.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A timestamp cell in an input file matched none of the accepted formats.
    #[error("unparsable timestamp '{0}'")]
    Timestamp(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
