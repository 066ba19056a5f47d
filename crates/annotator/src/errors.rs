use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::sentiment::AnalyzerError;

/// A recoverable per-item failure recorded in the batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum AnnotationFailure {
    #[error("conversation #{index} skipped: {reason}")]
    Conversation { index: usize, reason: String },
    #[error("message #{message_index} of conversation `{conversation_id}` degraded: {reason}")]
    Message {
        conversation_id: String,
        message_index: usize,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    #[error("failed to prepare `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("annotation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
