/// Errors that can occur in the extension system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two extensions in one registry share a name.
    #[error("duplicate extension name '{0}'")]
    DuplicateName(String),

    /// Invalid extension name.
    #[error("invalid extension name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// An extension failed to build its model.
    #[error("extension '{extension}' failed to parse its model: {message}")]
    ParseFailed { extension: String, message: String },

    /// An extension required input that the fetch did not deliver.
    #[error("extension '{extension}' is missing required input: {what}")]
    MissingInput { extension: String, what: String },
}

impl Error {
    pub fn parse_failed(extension: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseFailed {
            extension: extension.into(),
            message: message.into(),
        }
    }

    pub fn missing_input(extension: impl Into<String>, what: impl Into<String>) -> Self {
        Self::MissingInput {
            extension: extension.into(),
            what: what.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
