use std::path::PathBuf;
use thiserror::Error;

use super::format::Format;
use super::value::Scalar;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("real-time configuration changes are not allowed")]
    ChangesNotAllowed,

    #[error("unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("config data must be a map or a sequence, found scalar {0}")]
    ScalarRoot(Scalar),

    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: Box<ConfigError>,
    },

    #[error("failed to decode {format} config: {message}")]
    Decode { format: Format, message: String },

    #[error("failed to encode config as {format}: {message}")]
    Encode { format: Format, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn decode(format: Format, message: impl ToString) -> Self {
        Self::Decode {
            format,
            message: message.to_string(),
        }
    }

    pub(crate) fn encode(format: Format, message: impl ToString) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }
}
