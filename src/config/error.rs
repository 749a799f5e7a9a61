use std::path::PathBuf;
use thiserror::Error;

use crate::arr::{Key, TomlConversionError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid config group name: {0:?}")]
    InvalidGroupName(String),

    #[error("no configuration sources attached")]
    NoSourcesAttached,

    #[error("source '{source_name}' failed to load group '{group}': {source}")]
    SourceRead {
        source_name: String,
        group: String,
        source: SourceError,
    },

    #[error("{} write(s) to group '{group}' failed", .failures.len())]
    SourceWrite {
        group: String,
        failures: Vec<WriteFailure>,
    },

    #[error("failed to deserialize config group: {0}")]
    DeserializeError(#[from] toml::de::Error),

    #[error(transparent)]
    Conversion(#[from] TomlConversionError),
}

/// A single failed write collected during fan-out.
#[derive(Debug, Error)]
#[error("source '{source_name}' failed to write key '{key}': {error}")]
pub struct WriteFailure {
    pub source_name: String,
    pub key: Key,
    #[source]
    pub error: SourceError,
}

/// Errors raised by a configuration source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config file '{path}': {source}")]
    SerializeError {
        path: PathBuf,
        source: toml::ser::Error,
    },

    #[error(transparent)]
    Unrepresentable(#[from] TomlConversionError),
}
