//! Terminal progress callback with an indicatif bar

use crate::cli::style::{audit_bar_style, check, cross, hyperlink_url, Stream, Stylize};
use anstream::{eprintln, println};
use async_trait::async_trait;
use indicatif::ProgressBar;
use site_audit::session::{ChannelClose, ProgressCallback};
use site_audit::types::{display_section, ProgressState, SessionId};
use std::sync::Mutex;
use std::time::Duration;

/// Renders an attempt: a bar for the current percent and section, one line
/// per completed section, then the report link or the error.
///
/// Lines are printed through [`ProgressBar::suspend`] so they land above the
/// bar, and still print when the bar is hidden (stderr not a terminal).
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CliProgress {
    /// No attempt rendered yet
    pub const fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn current_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|bar| bar.clone())
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut bar| bar.take())
    }

    /// Stop drawing the bar of the current attempt
    ///
    /// Later progress of that attempt is still listed line by line, but
    /// nothing redraws over prompts that follow.
    pub fn release_bar(&self) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
    }

    /// Print a line without tearing the bar
    fn line(&self, print: impl FnOnce()) {
        match self.current_bar() {
            Some(bar) => bar.suspend(print),
            None => print(),
        }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_attempt_started(&self, session_id: &SessionId) {
        if let Some(old) = self.take_bar() {
            old.finish_and_clear();
        }

        println!("{} {}", "Session".muted(), session_id.accent());

        let bar = ProgressBar::new(100).with_style(audit_bar_style());
        bar.set_message("starting");
        bar.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    async fn on_progress(&self, progress: &ProgressState, new_section: Option<&str>) {
        if let Some(section) = new_section {
            let label = display_section(section);
            self.line(|| println!("  {} {}", check(), label.accent()));
        }
        if let Some(bar) = self.current_bar() {
            bar.set_position(u64::from(progress.percent));
            bar.set_message(display_section(&progress.section));
        }
    }

    async fn on_channel_closed(&self, reason: &ChannelClose) {
        let Some(bar) = self.take_bar() else {
            return;
        };
        bar.finish_and_clear();

        match reason {
            ChannelClose::Finished => println!("{} {}", check(), "Audit finished".success()),
            ChannelClose::Failed(msg) => {
                eprintln!("{} progress unavailable: {}", cross(), msg.error());
            }
            ChannelClose::Ended | ChannelClose::Superseded | ChannelClose::TornDown => {
                println!("{}", format!("Progress stream {reason}").muted());
            }
        }
    }

    async fn on_completed(&self, pdf_url: &str) {
        let link = hyperlink_url(Stream::Stdout, pdf_url);
        self.line(|| {
            println!("{} {}", check(), "Your PDF report is ready".success());
            println!("  {link}");
        });
    }

    async fn on_failed(&self, message: &str) {
        self.line(|| eprintln!("{} {}", cross(), message.error()));
    }
}
