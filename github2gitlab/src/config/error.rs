//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse config file '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A value is present but unusable.
    #[error("Invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    /// A required value was given neither on the command line nor in the
    /// config file.
    #[error("Missing required setting: {name}")]
    MissingValue { name: &'static str },
}
