//! Error types for the command-line front end.

use std::path::PathBuf;

use odata_tsql_core::CompileError;

/// Errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The options file could not be read.
    #[error("cannot read config file '{path}': {source}")]
    ConfigRead {
        /// Path of the options file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The options file is not valid JSON for the compiler options.
    #[error("invalid config file '{path}': {source}")]
    ConfigParse {
        /// Path of the options file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Compilation failed.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Output could not be serialized.
    #[error("cannot serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result type alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
