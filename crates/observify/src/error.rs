#![forbid(unsafe_code)]

//! Errors raised while reifying or synchronizing a model.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("cannot synchronize {incoming} into {model}")]
    ShapeMismatch {
        model: &'static str,
        incoming: &'static str,
    },

    #[error("property `{name}` is read-only")]
    ReadOnly { name: String },

    #[cfg(feature = "serde")]
    #[error("invalid options: {message}")]
    Options { message: String },
}

impl SyncError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn read_only(name: impl Into<String>) -> Self {
        Self::ReadOnly { name: name.into() }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Options {
            message: err.to_string(),
        }
    }
}
