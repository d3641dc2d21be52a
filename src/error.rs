// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// Result of a worksheet load.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Everything that can go wrong while loading a worksheet.
///
/// These are the only errors that leave [`crate::loader::SheetLoader`];
/// transport and auth errors are classified into one of them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// Service-account key file missing or unreadable
    #[error("The service account file '{}' could not be used: {reason}", .path.display())]
    CredentialsUnavailable { path: PathBuf, reason: String },

    /// Spreadsheet key does not resolve for these credentials
    #[error("The Google Sheet '{key}' was not found.")]
    ResourceNotFound { key: String },

    /// No tab with this title in the spreadsheet
    #[error("The worksheet '{worksheet}' was not found in the spreadsheet.")]
    SubResourceNotFound { worksheet: String },

    #[error("An unexpected error occurred: {0}")]
    UnexpectedFailure(String),
}

impl LoadError {
    pub fn unexpected<S: Into<String>>(msg: S) -> Self {
        LoadError::UnexpectedFailure(msg.into())
    }

    /// Remediation text shown under the error message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            LoadError::CredentialsUnavailable { .. } => Some(
                "Please ensure the file exists at the configured location and the filename is correct.",
            ),
            LoadError::ResourceNotFound { .. } => Some(
                "Please check the key and make sure you have shared the sheet with the service account email.",
            ),
            LoadError::SubResourceNotFound { .. } => {
                Some("Check the tab name; it must match exactly, including case and spaces.")
            }
            LoadError::UnexpectedFailure(_) => None,
        }
    }

    /// Message plus hint, for direct display.
    pub fn report(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{}\n{}", self, hint),
            None => self.to_string(),
        }
    }
}

/// A failed call against the remote sheets service.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status, when the service answered at all
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::new(None, message)
    }
}
