//! Core types for site-audit

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque token correlating a submission with its progress channel
///
/// Generated on the client for every attempt. The server only uses it as a
/// channel address, so nothing here assumes any structure beyond "string".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier (e.g. one printed by an earlier run)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /submit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// Requester name
    pub name: String,
    /// Requester email
    pub email: String,
    /// Website to audit
    pub url: String,
    /// Correlation id for the progress channel
    pub session_id: SessionId,
}

/// Success body of `POST /submit`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitResponse {
    /// Link to the generated report
    pub pdf_url: String,
}

/// Failure body of `POST /submit`, when the server sends one
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure reason
    #[serde(default)]
    pub message: Option<String>,
}

/// One event pushed on the progress channel
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressEvent {
    /// Overall completion, nominally 0-100
    pub percent: f64,
    /// Pipeline stage the server is reporting on
    pub section: String,
}

impl ProgressEvent {
    /// Parse the data payload of a single SSE event
    pub fn from_data(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    /// Percent as a whole number within 0..=100
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn whole_percent(&self) -> u8 {
        if self.percent.is_nan() {
            return 0;
        }
        self.percent.clamp(0.0, 100.0) as u8
    }

    /// Whether this event marks the end of the stream
    ///
    /// Level-triggered: any value at or above 100 counts, so a server that
    /// overshoots or repeats the final event still terminates the channel.
    pub fn is_final(&self) -> bool {
        self.percent >= 100.0
    }
}

/// Latest progress reported for the current attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Completion in percent
    pub percent: u8,
    /// Label of the section last reported
    pub section: String,
}

/// Section labels seen so far, de-duplicated in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedSections {
    labels: Vec<String>,
}

impl CompletedSections {
    /// No labels yet
    pub const fn new() -> Self {
        Self { labels: Vec::new() }
    }

    /// Record a label; returns `true` if it was not seen before
    pub fn insert(&mut self, label: &str) -> bool {
        if self.contains(label) {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    /// Whether a label has been recorded
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Labels in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no label was recorded
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Forget every label
    pub fn clear(&mut self) {
        self.labels.clear();
    }
}

/// Render a section label for display: `core_web_vitals` -> `CORE WEB VITALS`
pub fn display_section(section: &str) -> String {
    section.replace('_', " ").to_uppercase()
}
