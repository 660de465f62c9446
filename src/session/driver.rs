//! Async driver racing the submission request against the progress channel

use crate::api::{AuditApi, ProgressStream};
use crate::error::{Error, Result};
use crate::form::Field;
use crate::session::{ChannelClose, ProgressCallback};
use crate::types::{SessionId, SubmitResponse};
use crate::view::{AttemptId, ProgressOutcome, SubmissionView};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How the submission request of an attempt settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Report is available
    Completed {
        /// Link to the report
        pdf_url: String,
    },
    /// Request failed
    Failed {
        /// Message shown to the user
        message: String,
    },
}

/// Message forwarded from a channel task, tagged with its attempt
#[derive(Debug)]
enum ChannelMessage {
    Data { attempt: AttemptId, data: String },
    Ended { attempt: AttemptId },
    Failed { attempt: AttemptId, error: String },
}

/// Reader task of one attempt's progress channel; aborted on drop
struct ProgressChannel {
    attempt: AttemptId,
    task: JoinHandle<()>,
}

impl Drop for ProgressChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A submission view bound to an API
///
/// Owns the view exclusively. Channel tasks only forward raw messages over
/// an mpsc queue; all state changes happen here, one message at a time.
/// Dropping the session closes any open channel.
pub struct Session {
    api: Arc<dyn AuditApi>,
    view: SubmissionView,
    channel: Option<ProgressChannel>,
    tx: mpsc::UnboundedSender<ChannelMessage>,
    rx: mpsc::UnboundedReceiver<ChannelMessage>,
}

impl Session {
    /// Session with an empty form
    pub fn new(api: Arc<dyn AuditApi>) -> Self {
        Self::with_view(api, SubmissionView::new())
    }

    /// Session around an existing view
    pub fn with_view(api: Arc<dyn AuditApi>, view: SubmissionView) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            view,
            channel: None,
            tx,
            rx,
        }
    }

    /// Current view state
    pub const fn view(&self) -> &SubmissionView {
        &self.view
    }

    /// Overwrite one form field
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.view.set_field(field, value);
    }

    /// Whether a progress channel task is running
    pub const fn has_open_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Submit the form and wait for the submission request to settle
    ///
    /// Progress events arriving meanwhile are applied as they come. The
    /// channel is left running when this returns; see
    /// [`wait_for_progress`](Self::wait_for_progress).
    ///
    /// Errors only when the attempt cannot start (invalid form, request
    /// already in flight). A failed request is reported as
    /// [`AttemptOutcome::Failed`].
    pub async fn submit(&mut self, progress: &dyn ProgressCallback) -> Result<AttemptOutcome> {
        if self.view.is_busy() {
            return Err(Error::AttemptInFlight);
        }
        self.view.form().validate()?;

        self.close_channel(ChannelClose::Superseded, progress).await;
        let attempt = self.view.begin_attempt()?;
        tracing::info!(
            attempt = %attempt.id,
            session_id = %attempt.payload.session_id,
            url = %attempt.payload.url,
            "starting submission"
        );

        progress
            .on_attempt_started(&attempt.payload.session_id)
            .await;

        // A request settling first still waits for the channel to open
        let api = Arc::clone(&self.api);
        let mut opening = api.open_progress(&attempt.payload.session_id);
        let mut request = api.submit(&attempt.payload);
        let mut opened = false;
        let mut settled: Option<Result<SubmitResponse>> = None;

        let result = loop {
            tokio::select! {
                biased;
                stream = &mut opening, if !opened => {
                    opened = true;
                    Self::attach_channel(
                        &mut self.view,
                        &mut self.channel,
                        &self.tx,
                        attempt.id,
                        stream,
                        progress,
                    )
                    .await;
                }
                Some(message) = self.rx.recv() => {
                    Self::handle_message(&mut self.view, &mut self.channel, message, progress).await;
                }
                result = &mut request, if settled.is_none() => settled = Some(result),
            }

            if opened {
                if let Some(result) = settled.take() {
                    break result;
                }
            }
        };

        let outcome = match result {
            Ok(response) => {
                tracing::info!(attempt = %attempt.id, pdf_url = %response.pdf_url, "report ready");
                self.view.complete(attempt.id, response.pdf_url.clone());
                progress.on_completed(&response.pdf_url).await;
                AttemptOutcome::Completed {
                    pdf_url: response.pdf_url,
                }
            }
            Err(err) => {
                tracing::warn!(attempt = %attempt.id, error = %err, "submission failed");
                let message = err.user_message();
                self.view.fail(attempt.id, message.clone());
                progress.on_failed(&message).await;
                AttemptOutcome::Failed { message }
            }
        };

        Ok(outcome)
    }

    /// Follow the progress of a session started elsewhere
    ///
    /// Returns `false` if `limit` elapsed before the channel closed.
    pub async fn watch(
        &mut self,
        session_id: SessionId,
        progress: &dyn ProgressCallback,
        limit: Option<Duration>,
    ) -> Result<bool> {
        if self.view.is_busy() {
            return Err(Error::AttemptInFlight);
        }

        self.close_channel(ChannelClose::Superseded, progress).await;
        let attempt = self.view.begin_watch(session_id.clone())?;
        tracing::info!(attempt = %attempt, %session_id, "watching progress");

        progress.on_attempt_started(&session_id).await;
        let stream = self.api.open_progress(&session_id).await;
        Self::attach_channel(
            &mut self.view,
            &mut self.channel,
            &self.tx,
            attempt,
            stream,
            progress,
        )
        .await;

        Ok(self.wait_for_progress(progress, limit).await)
    }

    /// Apply channel events until the current channel closes
    ///
    /// No limit is imposed by default: a stream that stays open without
    /// ever reaching 100% is followed indefinitely. Returns `false` if
    /// `limit` elapsed first; the channel is left open in that case.
    pub async fn wait_for_progress(
        &mut self,
        progress: &dyn ProgressCallback,
        limit: Option<Duration>,
    ) -> bool {
        match limit {
            None => {
                self.drain(progress).await;
                true
            }
            Some(limit) => tokio::time::timeout(limit, self.drain(progress))
                .await
                .is_ok(),
        }
    }

    /// Tear down: close the progress channel if one is open
    pub async fn close(&mut self, progress: &dyn ProgressCallback) {
        self.close_channel(ChannelClose::TornDown, progress).await;
    }

    async fn drain(&mut self, progress: &dyn ProgressCallback) {
        while self.channel.is_some() {
            let Some(message) = self.rx.recv().await else {
                break;
            };
            Self::handle_message(&mut self.view, &mut self.channel, message, progress).await;
        }
    }

    /// Spawn the reader of an opened progress stream, or report the channel
    /// closed if it could not be opened
    async fn attach_channel(
        view: &mut SubmissionView,
        channel: &mut Option<ProgressChannel>,
        tx: &mpsc::UnboundedSender<ChannelMessage>,
        attempt: AttemptId,
        stream: Result<ProgressStream>,
        progress: &dyn ProgressCallback,
    ) {
        let mut stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                let message = ChannelMessage::Failed {
                    attempt,
                    error: err.to_string(),
                };
                Self::handle_message(view, channel, message, progress).await;
                return;
            }
        };
        tracing::debug!(attempt = %attempt, "progress channel open");

        let tx = tx.clone();
        let task = tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                let message = match item {
                    Ok(data) => ChannelMessage::Data { attempt, data },
                    Err(err) => {
                        let _ = tx.send(ChannelMessage::Failed {
                            attempt,
                            error: err.to_string(),
                        });
                        return;
                    }
                };
                if tx.send(message).is_err() {
                    return;
                }
            }

            let _ = tx.send(ChannelMessage::Ended { attempt });
        });

        *channel = Some(ProgressChannel { attempt, task });
    }

    async fn close_channel(&mut self, reason: ChannelClose, progress: &dyn ProgressCallback) {
        let Some(channel) = self.channel.take() else {
            return;
        };
        let attempt = channel.attempt;
        drop(channel);

        if self.view.close_channel(attempt) {
            tracing::debug!(attempt = %attempt, %reason, "progress channel closed");
            progress.on_channel_closed(&reason).await;
        }
    }

    async fn handle_message(
        view: &mut SubmissionView,
        channel: &mut Option<ProgressChannel>,
        message: ChannelMessage,
        progress: &dyn ProgressCallback,
    ) {
        let (attempt, reason) = match message {
            ChannelMessage::Data { attempt, data } => {
                match view.apply_progress(attempt, &data) {
                    ProgressOutcome::Applied {
                        new_section,
                        finished,
                    } => {
                        progress
                            .on_progress(view.progress(), new_section.as_deref())
                            .await;
                        if !finished {
                            return;
                        }
                        (attempt, ChannelClose::Finished)
                    }
                    ProgressOutcome::Ignored => {
                        tracing::trace!(attempt = %attempt, "ignoring progress event");
                        return;
                    }
                    ProgressOutcome::Malformed => return,
                }
            }
            ChannelMessage::Ended { attempt } => {
                if !view.close_channel(attempt) {
                    return;
                }
                (attempt, ChannelClose::Ended)
            }
            ChannelMessage::Failed { attempt, error } => {
                if !view.close_channel(attempt) {
                    return;
                }
                tracing::warn!(attempt = %attempt, %error, "progress stream failed");
                (attempt, ChannelClose::Failed(error))
            }
        };

        if channel.as_ref().is_some_and(|c| c.attempt == attempt) {
            channel.take();
        }
        tracing::debug!(attempt = %attempt, %reason, "progress channel closed");
        progress.on_channel_closed(&reason).await;
    }
}
