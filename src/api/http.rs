//! reqwest implementation of the audit API

use crate::api::{sse, AuditApi, ProgressStream};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{ErrorBody, SessionId, SubmissionPayload, SubmitResponse};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;

/// Connection establishment timeout in seconds
///
/// Requests themselves are not bounded: report generation can take minutes
/// and the progress stream is long-lived by nature.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Audit API over HTTP
pub struct HttpAuditApi {
    client: Client,
    config: ApiConfig,
}

impl HttpAuditApi {
    /// Create a client for the configured API base
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    fn submit_url(&self) -> String {
        self.config.endpoint("/submit")
    }

    fn progress_url(&self, session_id: &SessionId) -> String {
        self.config.endpoint(&format!(
            "/progress/{}",
            urlencoding::encode(session_id.as_str())
        ))
    }
}

#[async_trait]
impl AuditApi for HttpAuditApi {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitResponse> {
        let url = self.submit_url();
        tracing::debug!(%url, session_id = %payload.session_id, "submitting audit request");

        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        tracing::debug!(status = status.as_u16(), ?message, "submission rejected");

        Err(Error::Submission {
            status: status.as_u16(),
            message,
        })
    }

    async fn open_progress(&self, session_id: &SessionId) -> Result<ProgressStream> {
        let url = self.progress_url(session_id);
        tracing::debug!(%url, "opening progress stream");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ProgressStream(format!(
                "server responded with {status}"
            )));
        }

        Ok(sse::message_data(response.bytes_stream().map_err(Error::from)))
    }
}
