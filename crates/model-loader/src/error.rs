//! Error types for model-loader

/// Result type for model-loader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole load.
///
/// Problems confined to one module or one extension never show up here;
/// they are collected as [`LoadIssue`](crate::LoadIssue)s instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The round trip to the build tool failed as a whole.
    #[error("Build tool connection failed: {message}")]
    Connection { message: String },

    /// Filesystem error from model-fs
    #[error(transparent)]
    Fs(#[from] model_fs::Error),

    /// Extension error from model-extensions
    #[error(transparent)]
    Extensions(#[from] model_extensions::Error),
}

impl Error {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}
