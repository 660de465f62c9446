//! Submission & progress view state
//!
//! A synchronous state machine holding everything the user sees: the form,
//! the latest progress, the sections seen so far, the report link and the
//! error message. Two producers write into it independently, the submission
//! response and the progress channel, so every write is tagged with the
//! [`AttemptId`] it belongs to and writes from superseded attempts are
//! dropped.

use crate::error::{Error, Result};
use crate::form::{Field, FormInput};
use crate::types::{CompletedSections, ProgressEvent, ProgressState, SessionId, SubmissionPayload};
use std::fmt;

/// Identifies one submission attempt within a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing submitted yet
    Idle,
    /// Submission request in flight
    Submitting,
    /// Submission succeeded, report link available
    Completed,
    /// Submission failed, error message available
    Failed,
}

/// A freshly started attempt
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Tag for writes belonging to this attempt
    pub id: AttemptId,
    /// What gets sent to the submission endpoint
    pub payload: SubmissionPayload,
}

/// What happened to a progress message handed to the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// Belongs to an attempt that is no longer current, or arrived after
    /// the channel was closed
    Ignored,
    /// Payload was not a valid progress event
    Malformed,
    /// Progress state updated
    Applied {
        /// Section label if this is the first time it was seen
        new_section: Option<String>,
        /// Event reached 100% and closed the channel
        finished: bool,
    },
}

/// The view itself
#[derive(Debug)]
pub struct SubmissionView {
    form: FormInput,
    state: ViewState,
    next_attempt: u64,
    current: Option<AttemptId>,
    session_id: Option<SessionId>,
    channel_open: bool,
    progress: ProgressState,
    sections: CompletedSections,
    artifact_url: Option<String>,
    error: Option<String>,
}

impl Default for SubmissionView {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionView {
    /// Empty form, idle
    pub fn new() -> Self {
        Self::with_form(FormInput::default())
    }

    /// Start from pre-filled form values
    pub const fn with_form(form: FormInput) -> Self {
        Self {
            form,
            state: ViewState::Idle,
            next_attempt: 1,
            current: None,
            session_id: None,
            channel_open: false,
            progress: ProgressState {
                percent: 0,
                section: String::new(),
            },
            sections: CompletedSections::new(),
            artifact_url: None,
            error: None,
        }
    }

    // === Form ===

    /// Overwrite one form field
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
    }

    /// Current form values
    pub const fn form(&self) -> &FormInput {
        &self.form
    }

    // === Transitions ===

    /// Enter `Submitting`: validate, reset, and allocate a new attempt
    ///
    /// Rejected while a previous request is still awaiting its response.
    /// The caller owns closing the previous progress channel.
    pub fn begin_attempt(&mut self) -> Result<Attempt> {
        if self.state == ViewState::Submitting {
            return Err(Error::AttemptInFlight);
        }
        self.form.validate()?;

        let session_id = SessionId::generate();
        let id = self.start(session_id.clone());
        self.state = ViewState::Submitting;

        Ok(Attempt {
            id,
            payload: self.form.to_payload(session_id),
        })
    }

    /// Follow the progress of an existing session without submitting
    ///
    /// Resets progress like a new attempt but leaves the submission state
    /// untouched.
    pub fn begin_watch(&mut self, session_id: SessionId) -> Result<AttemptId> {
        if self.state == ViewState::Submitting {
            return Err(Error::AttemptInFlight);
        }
        Ok(self.start(session_id))
    }

    fn start(&mut self, session_id: SessionId) -> AttemptId {
        let id = AttemptId(self.next_attempt);
        self.next_attempt += 1;

        self.current = Some(id);
        self.session_id = Some(session_id);
        self.channel_open = true;
        self.progress = ProgressState::default();
        self.sections.clear();
        self.error = None;
        id
    }

    /// Submission succeeded; returns `false` if the attempt is stale
    pub fn complete(&mut self, attempt: AttemptId, pdf_url: impl Into<String>) -> bool {
        if !self.is_current(attempt) {
            return false;
        }
        self.artifact_url = Some(pdf_url.into());
        self.state = ViewState::Completed;
        true
    }

    /// Submission failed; returns `false` if the attempt is stale
    ///
    /// The progress channel is left as it is.
    pub fn fail(&mut self, attempt: AttemptId, message: impl Into<String>) -> bool {
        if !self.is_current(attempt) {
            return false;
        }
        self.error = Some(message.into());
        self.state = ViewState::Failed;
        true
    }

    // === Progress channel ===

    /// Apply the raw data of one pushed event
    pub fn apply_progress(&mut self, attempt: AttemptId, data: &str) -> ProgressOutcome {
        if !self.is_current(attempt) || !self.channel_open {
            return ProgressOutcome::Ignored;
        }

        let event = match ProgressEvent::from_data(data) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(attempt = %attempt, error = %err, data, "dropping malformed progress event");
                return ProgressOutcome::Malformed;
            }
        };

        self.progress = ProgressState {
            percent: event.whole_percent(),
            section: event.section.clone(),
        };
        let new_section = self
            .sections
            .insert(&event.section)
            .then(|| event.section.clone());

        let finished = event.is_final();
        if finished {
            self.channel_open = false;
        }

        ProgressOutcome::Applied {
            new_section,
            finished,
        }
    }

    /// Mark the channel of `attempt` closed; returns `true` only on the
    /// first close of the current attempt's channel
    pub fn close_channel(&mut self, attempt: AttemptId) -> bool {
        if !self.is_current(attempt) || !self.channel_open {
            return false;
        }
        self.channel_open = false;
        true
    }

    // === Accessors ===

    fn is_current(&self, attempt: AttemptId) -> bool {
        self.current == Some(attempt)
    }

    /// Current lifecycle state
    pub const fn state(&self) -> ViewState {
        self.state
    }

    /// Whether a submission request is in flight
    pub fn is_busy(&self) -> bool {
        self.state == ViewState::Submitting
    }

    /// Attempt currently displayed
    pub const fn current_attempt(&self) -> Option<AttemptId> {
        self.current
    }

    /// Session id of the current attempt
    pub const fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Whether the current attempt's channel still accepts events
    pub const fn is_channel_open(&self) -> bool {
        self.channel_open
    }

    /// Latest progress
    pub const fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Sections seen so far
    pub const fn sections(&self) -> &CompletedSections {
        &self.sections
    }

    /// Report link of the latest successful submission
    pub fn artifact_url(&self) -> Option<&str> {
        self.artifact_url.as_deref()
    }

    /// Error message of the last failed submission
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_view() -> SubmissionView {
        SubmissionView::with_form(FormInput::new(
            "Ada",
            "ada@example.com",
            "https://example.com",
        ))
    }

    #[test]
    fn test_begin_attempt_enters_submitting() {
        let mut view = ready_view();
        assert_eq!(view.state(), ViewState::Idle);

        let attempt = view.begin_attempt().unwrap();
        assert_eq!(view.state(), ViewState::Submitting);
        assert!(view.is_busy());
        assert!(view.is_channel_open());
        assert_eq!(view.current_attempt(), Some(attempt.id));
        assert_eq!(view.session_id(), Some(&attempt.payload.session_id));
        assert_eq!(attempt.payload.name, "Ada");
    }

    #[test]
    fn test_invalid_form_does_not_start_attempt() {
        let mut view = SubmissionView::new();
        assert!(matches!(
            view.begin_attempt(),
            Err(Error::InvalidField { .. })
        ));
        assert_eq!(view.state(), ViewState::Idle);
        assert!(view.current_attempt().is_none());
    }

    #[test]
    fn test_second_attempt_rejected_while_in_flight() {
        let mut view = ready_view();
        view.begin_attempt().unwrap();
        assert!(matches!(view.begin_attempt(), Err(Error::AttemptInFlight)));
    }

    #[test]
    fn test_sections_collect_and_final_event_closes() {
        let mut view = ready_view();
        let attempt = view.begin_attempt().unwrap();

        let first = view.apply_progress(attempt.id, r#"{"percent":30,"section":"seo"}"#);
        assert_eq!(
            first,
            ProgressOutcome::Applied {
                new_section: Some("seo".into()),
                finished: false
            }
        );
        let last = view.apply_progress(attempt.id, r#"{"percent":100,"section":"performance"}"#);
        assert_eq!(
            last,
            ProgressOutcome::Applied {
                new_section: Some("performance".into()),
                finished: true
            }
        );

        assert_eq!(
            view.sections().iter().collect::<Vec<_>>(),
            vec!["seo", "performance"]
        );
        assert!(!view.is_channel_open());

        // Nothing is processed after the channel closed
        let late = view.apply_progress(attempt.id, r#"{"percent":100,"section":"extra"}"#);
        assert_eq!(late, ProgressOutcome::Ignored);
        assert_eq!(view.sections().len(), 2);
        assert!(!view.close_channel(attempt.id));
    }

    #[test]
    fn test_duplicate_section_collapses() {
        let mut view = ready_view();
        let attempt = view.begin_attempt().unwrap();
        view.apply_progress(attempt.id, r#"{"percent":50,"section":"seo"}"#);
        let again = view.apply_progress(attempt.id, r#"{"percent":50,"section":"seo"}"#);
        assert_eq!(
            again,
            ProgressOutcome::Applied {
                new_section: None,
                finished: false
            }
        );
        assert_eq!(view.sections().iter().collect::<Vec<_>>(), vec!["seo"]);
    }

    #[test]
    fn test_regressing_progress_is_accepted() {
        let mut view = ready_view();
        let attempt = view.begin_attempt().unwrap();
        view.apply_progress(attempt.id, r#"{"percent":60,"section":"b"}"#);
        view.apply_progress(attempt.id, r#"{"percent":20,"section":"a"}"#);
        assert_eq!(view.progress().percent, 20);
        assert_eq!(view.progress().section, "a");
    }

    #[test]
    fn test_malformed_event_is_dropped() {
        let mut view = ready_view();
        let attempt = view.begin_attempt().unwrap();
        view.apply_progress(attempt.id, r#"{"percent":10,"section":"a"}"#);

        assert_eq!(
            view.apply_progress(attempt.id, "{oops"),
            ProgressOutcome::Malformed
        );
        assert_eq!(view.progress().percent, 10);
        assert!(view.is_channel_open());
        assert!(view.error().is_none());
    }

    #[test]
    fn test_artifact_visible_regardless_of_progress() {
        let mut view = ready_view();
        let attempt = view.begin_attempt().unwrap();
        view.apply_progress(attempt.id, r#"{"percent":40,"section":"seo"}"#);

        assert!(view.complete(attempt.id, "https://x/report.pdf"));
        assert_eq!(view.state(), ViewState::Completed);
        assert_eq!(view.artifact_url(), Some("https://x/report.pdf"));
        assert_eq!(view.progress().percent, 40);
        assert!(view.is_channel_open());
    }

    #[test]
    fn test_failure_keeps_channel_open() {
        let mut view = ready_view();
        let attempt = view.begin_attempt().unwrap();
        assert!(view.fail(attempt.id, "invalid url"));
        assert_eq!(view.state(), ViewState::Failed);
        assert_eq!(view.error(), Some("invalid url"));
        assert!(!view.is_busy());
        assert!(view.is_channel_open());
    }

    #[test]
    fn test_new_attempt_resets_and_ignores_stale_writes() {
        let mut view = ready_view();
        let first = view.begin_attempt().unwrap();
        view.apply_progress(first.id, r#"{"percent":30,"section":"seo"}"#);
        view.fail(first.id, "boom");

        let second = view.begin_attempt().unwrap();
        assert_ne!(first.id, second.id);
        assert_ne!(first.payload.session_id, second.payload.session_id);
        assert_eq!(view.progress(), &ProgressState::default());
        assert!(view.sections().is_empty());
        assert!(view.error().is_none());

        assert_eq!(
            view.apply_progress(first.id, r#"{"percent":90,"section":"old"}"#),
            ProgressOutcome::Ignored
        );
        assert!(!view.complete(first.id, "https://stale"));
        assert!(!view.fail(first.id, "stale"));
        assert!(view.artifact_url().is_none());
        assert_eq!(view.state(), ViewState::Submitting);
    }

    #[test]
    fn test_form_survives_submission() {
        let mut view = ready_view();
        let attempt = view.begin_attempt().unwrap();
        view.complete(attempt.id, "https://x/report.pdf");
        assert_eq!(view.form().name, "Ada");
        view.set_field(Field::Name, "Grace");
        let next = view.begin_attempt().unwrap();
        assert_eq!(next.payload.name, "Grace");
    }

    #[test]
    fn test_report_link_kept_until_next_success() {
        let mut view = ready_view();
        let first = view.begin_attempt().unwrap();
        view.complete(first.id, "https://x/first.pdf");

        let second = view.begin_attempt().unwrap();
        assert_eq!(view.artifact_url(), Some("https://x/first.pdf"));
        view.fail(second.id, "invalid url");
        assert_eq!(view.artifact_url(), Some("https://x/first.pdf"));

        let third = view.begin_attempt().unwrap();
        view.complete(third.id, "https://x/third.pdf");
        assert_eq!(view.artifact_url(), Some("https://x/third.pdf"));
    }

    #[test]
    fn test_watch_leaves_state_untouched() {
        let mut view = SubmissionView::new();
        let id = view.begin_watch(SessionId::new("abc")).unwrap();
        assert_eq!(view.state(), ViewState::Idle);
        assert_eq!(view.session_id().map(SessionId::as_str), Some("abc"));
        assert!(view.close_channel(id));
        assert!(!view.close_channel(id));
    }
}
