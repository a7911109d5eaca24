//! Error types for model-fs

use std::path::PathBuf;

/// Result type for model-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in model-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_contains_path() {
        let err = Error::io(
            "/work/app",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let display = err.to_string();
        assert!(display.contains("/work/app"), "got: {display}");
        assert!(display.contains("gone"), "got: {display}");
    }
}
