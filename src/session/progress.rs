//! Progress callback trait for interface-agnostic updates
//!
//! The session driver reports every visible change through this trait so a
//! terminal renderer, a log writer or a test recorder can follow along.

use crate::types::{ProgressState, SessionId};
use async_trait::async_trait;
use std::fmt;

/// Why a progress channel stopped delivering events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelClose {
    /// An event reported 100% or more
    Finished,
    /// A newer attempt replaced this one
    Superseded,
    /// The server ended the stream
    Ended,
    /// Opening or reading the stream failed
    Failed(String),
    /// The session was torn down
    TornDown,
}

impl fmt::Display for ChannelClose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => write!(f, "finished"),
            Self::Superseded => write!(f, "superseded by a new submission"),
            Self::Ended => write!(f, "closed by server"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
            Self::TornDown => write!(f, "closed"),
        }
    }
}

/// Progress callback trait
///
/// Implement this trait to receive updates while an attempt runs.
/// - CLI implementations can draw a progress bar
/// - Tests can record the sequence of calls
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// A new attempt started and its channel is being opened
    async fn on_attempt_started(&self, session_id: &SessionId);

    /// A progress event was applied; `new_section` is set the first time a
    /// section label is seen
    async fn on_progress(&self, progress: &ProgressState, new_section: Option<&str>);

    /// The progress channel stopped
    async fn on_channel_closed(&self, reason: &ChannelClose);

    /// Submission succeeded with a report link
    async fn on_completed(&self, pdf_url: &str);

    /// Submission failed with a user-facing message
    async fn on_failed(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_attempt_started(&self, _session_id: &SessionId) {}
    async fn on_progress(&self, _progress: &ProgressState, _new_section: Option<&str>) {}
    async fn on_channel_closed(&self, _reason: &ChannelClose) {}
    async fn on_completed(&self, _pdf_url: &str) {}
    async fn on_failed(&self, _message: &str) {}
}
