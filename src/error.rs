//! Error types for site-audit

use thiserror::Error;

/// Errors that can occur while preparing or running an audit submission
#[derive(Error, Debug)]
pub enum Error {
    /// A form field failed its input constraint
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name as shown to the user
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// API base origin missing or unusable
    #[error("configuration error: {0}")]
    Config(String),

    /// Submission endpoint answered with a non-success status
    #[error("Failed to generate PDF (HTTP {status})")]
    Submission {
        /// HTTP status code
        status: u16,
        /// `message` field of the failure body, if the server sent one
        message: Option<String>,
    },

    /// A submission is already awaiting its response
    #[error("a submission is already in progress")]
    AttemptInFlight,

    /// Progress channel could not be opened
    #[error("progress stream error: {0}")]
    ProgressStream(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Human-readable message for a failed submission attempt.
    ///
    /// Prefers the server's structured `message` and otherwise falls back to
    /// the error's own description. A submission rejected without a body
    /// reads `Failed to generate PDF (HTTP <status>)`.
    pub fn user_message(&self) -> String {
        if let Self::Submission {
            message: Some(message),
            ..
        } = self
        {
            if !message.trim().is_empty() {
                return message.clone();
            }
        }

        self.to_string()
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;
