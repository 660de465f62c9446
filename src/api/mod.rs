//! Audit API client
//!
//! Two endpoints: a one-shot submission and a server-sent progress stream,
//! both addressed by the same client-generated session id.

mod http;
pub mod sse;

pub use http::HttpAuditApi;

use crate::error::Result;
use crate::types::{SessionId, SubmissionPayload, SubmitResponse};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Raw data payloads of the progress channel's message events
pub type ProgressStream = BoxStream<'static, Result<String>>;

/// Audit API operations
///
/// Abstracts the remote service so the session driver can run against the
/// HTTP client or a scripted stand-in.
#[async_trait]
pub trait AuditApi: Send + Sync {
    /// `POST /submit`, resolving once the report is ready
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitResponse>;

    /// `GET /progress/{session_id}`, yielding each event's data
    async fn open_progress(&self, session_id: &SessionId) -> Result<ProgressStream>;
}
