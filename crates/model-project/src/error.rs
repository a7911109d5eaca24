//! Error types for model-project

use std::path::PathBuf;

/// Result type for model-project operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in model-project operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Blocking on the first load from the serial context would never wake up.
    #[error("Cannot wait for the first model load from the project's serial context")]
    WaitOnSerialContext,

    /// Waiting for the first load on the thread still building the
    /// project; nothing can load before its extensions are assigned.
    #[error("Project is not initialized yet")]
    NotInitialized,

    /// No Tokio runtime to run fetches on.
    #[error("No Tokio runtime available; build the project inside a runtime or pass a handle")]
    NoRuntime,

    /// The serial worker thread could not be started.
    #[error("Failed to start serial worker '{name}': {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A fetch task panicked or was cancelled before it finished.
    #[error("Model fetch aborted: {message}")]
    FetchAborted { message: String },

    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parsed but holds an unusable value
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    // Transparent wrappers for underlying crate errors
    /// Load error from model-loader
    #[error(transparent)]
    Load(#[from] model_loader::Error),

    /// Filesystem error from model-fs
    #[error(transparent)]
    Fs(#[from] model_fs::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn fetch_aborted(message: impl Into<String>) -> Self {
        Self::FetchAborted {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_is_transparent() {
        let err: Error = model_loader::Error::connection("refused").into();
        assert_eq!(err.to_string(), "Build tool connection failed: refused");
    }

    #[test]
    fn test_wait_on_serial_context_display() {
        assert!(Error::WaitOnSerialContext.to_string().contains("serial context"));
    }
}
