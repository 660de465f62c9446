//! Test data factories and a recording progress callback

use async_trait::async_trait;
use site_audit::form::FormInput;
use site_audit::session::{ChannelClose, ProgressCallback};
use site_audit::types::{ProgressState, SessionId};
use std::sync::Mutex;

/// A form that passes validation
pub fn make_form() -> FormInput {
    FormInput::new("Ada Lovelace", "ada@example.com", "https://example.com")
}

/// JSON data of one progress event
pub fn progress_data(percent: u32, section: &str) -> String {
    format!(r#"{{"percent": {percent}, "section": "{section}"}}"#)
}

/// One callback invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Started(SessionId),
    Progress {
        percent: u8,
        section: String,
        new_section: Option<String>,
    },
    Closed(ChannelClose),
    Completed(String),
    Failed(String),
}

/// Progress callback that records every call
#[derive(Default)]
pub struct RecordingProgress {
    calls: Mutex<Vec<Call>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn closes(&self) -> Vec<ChannelClose> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Closed(reason) => Some(reason),
                _ => None,
            })
            .collect()
    }

    pub fn new_sections(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Progress { new_section, .. } => new_section,
                _ => None,
            })
            .collect()
    }

    pub fn progress_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Progress { .. }))
            .count()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_attempt_started(&self, session_id: &SessionId) {
        self.push(Call::Started(session_id.clone()));
    }

    async fn on_progress(&self, progress: &ProgressState, new_section: Option<&str>) {
        self.push(Call::Progress {
            percent: progress.percent,
            section: progress.section.clone(),
            new_section: new_section.map(ToString::to_string),
        });
    }

    async fn on_channel_closed(&self, reason: &ChannelClose) {
        self.push(Call::Closed(reason.clone()));
    }

    async fn on_completed(&self, pdf_url: &str) {
        self.push(Call::Completed(pdf_url.to_string()));
    }

    async fn on_failed(&self, message: &str) {
        self.push(Call::Failed(message.to_string()));
    }
}
