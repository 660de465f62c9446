//! Scripted audit API for session tests
//!
//! Progress streams are fed from test-held senders, so a test decides
//! exactly when events arrive and can observe when the session drops a
//! stream. Submissions answer immediately unless a gate is installed.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use site_audit::api::{AuditApi, ProgressStream};
use site_audit::error::{Error, Result};
use site_audit::types::{SessionId, SubmissionPayload, SubmitResponse};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

pub const REPORT_URL: &str = "https://x/report.pdf";

/// How a submission answers
#[derive(Debug, Clone)]
pub enum SubmitReply {
    Ok(String),
    Reject { status: u16, message: Option<String> },
}

impl SubmitReply {
    fn into_result(self) -> Result<SubmitResponse> {
        match self {
            Self::Ok(pdf_url) => Ok(SubmitResponse { pdf_url }),
            Self::Reject { status, message } => Err(Error::Submission { status, message }),
        }
    }
}

/// Sender half of a scripted progress stream
pub type ProgressFeed = mpsc::UnboundedSender<Result<String>>;

pub struct MockAuditApi {
    reply: Mutex<SubmitReply>,
    gates: Mutex<VecDeque<oneshot::Receiver<SubmitReply>>>,
    streams: Mutex<VecDeque<mpsc::UnboundedReceiver<Result<String>>>>,
    error_on_open: Mutex<Option<String>>,
    // Call tracking
    submit_calls: Mutex<Vec<SubmissionPayload>>,
    open_calls: Mutex<Vec<SessionId>>,
}

impl MockAuditApi {
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(SubmitReply::Ok(REPORT_URL.to_string())),
            gates: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            error_on_open: Mutex::new(None),
            submit_calls: Mutex::new(Vec::new()),
            open_calls: Mutex::new(Vec::new()),
        }
    }

    // === Scripting ===

    /// Answer every ungated submission with `reply`
    pub fn set_reply(&self, reply: SubmitReply) {
        *self.reply.lock().unwrap() = reply;
    }

    /// Hold the next submission until the returned sender fires
    pub fn gate_submit(&self) -> oneshot::Sender<SubmitReply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Feed for the next opened progress stream; unscripted streams stay
    /// silent forever
    pub fn script_progress(&self) -> ProgressFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams.lock().unwrap().push_back(rx);
        tx
    }

    /// Make `open_progress` fail
    pub fn fail_open_progress(&self, msg: &str) {
        *self.error_on_open.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification ===

    pub fn submit_calls(&self) -> Vec<SubmissionPayload> {
        self.submit_calls.lock().unwrap().clone()
    }

    pub fn open_calls(&self) -> Vec<SessionId> {
        self.open_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditApi for MockAuditApi {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitResponse> {
        self.submit_calls.lock().unwrap().push(payload.clone());

        let gate = self.gates.lock().unwrap().pop_front();
        let reply = match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| SubmitReply::Ok(REPORT_URL.to_string())),
            None => self.reply.lock().unwrap().clone(),
        };
        reply.into_result()
    }

    async fn open_progress(&self, session_id: &SessionId) -> Result<ProgressStream> {
        self.open_calls.lock().unwrap().push(session_id.clone());

        if let Some(msg) = self.error_on_open.lock().unwrap().as_ref() {
            return Err(Error::ProgressStream(msg.clone()));
        }

        let scripted = self.streams.lock().unwrap().pop_front();
        match scripted {
            Some(rx) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            None => Ok(stream::pending().boxed()),
        }
    }
}
