//! Error types for the HCN gateway

use std::time::Duration;
use thiserror::Error;

use crate::hcn::binding::Library;
use crate::hcn::result::ResultDocument;
use crate::hcn::status::Status;

#[derive(Error, Debug)]
pub enum Error {
    /// A string argument could not be turned into a null-terminated UTF-16 buffer.
    #[error("invalid string argument `{argument}`: contains an embedded NUL")]
    InvalidString { argument: &'static str },

    /// The library or the exported symbol is missing on this host.
    #[error("{symbol} not found in {}: {reason}", .library.file_name())]
    ProcNotFound {
        library: Library,
        symbol: &'static str,
        reason: String,
    },

    /// The native call returned a failure status.
    #[error("{operation} failed: {status}{}", render_result(.result))]
    Native {
        operation: &'static str,
        status: Status,
        result: Option<String>,
    },

    #[error("HNS request failed: {0}")]
    Hns(String),

    #[error("call abandoned after {after:?}")]
    Abandoned { after: Duration },

    #[error("blocking task failed: {0}")]
    Join(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn render_result(result: &Option<String>) -> String {
    match result {
        Some(text) => format!(" ({})", text),
        None => String::new(),
    }
}

impl Error {
    /// The entry point could not be bound, e.g. HCN is not installed on this edition.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::ProcNotFound { .. })
    }

    /// The native status, if this error came back from a native call
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Native { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status().is_some_and(|s| s.is_not_found())
    }

    pub fn is_access_denied(&self) -> bool {
        self.status().is_some_and(|s| s.is_access_denied())
    }

    /// Message reported by the service in the result document, if any
    pub fn native_message(&self) -> Option<String> {
        match self {
            Error::Native {
                result: Some(text), ..
            } => ResultDocument::parse(text).and_then(|doc| doc.error),
            _ => None,
        }
    }
}
