use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatlogError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a json array of conversations, found {found}")]
    NotAnArray { found: &'static str },
    #[error("expected {what} to be a json object, found {found}")]
    NotAnObject {
        what: &'static str,
        found: &'static str,
    },
    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ChatlogError {
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
