//! Submit command - one-shot submission from flags

use crate::cli::progress::CliProgress;
use crate::cli::style::Stylize;
use crate::cli::FollowProgress;
use anstream::println;
use site_audit::api::AuditApi;
use site_audit::error::Result;
use site_audit::form::FormInput;
use site_audit::session::{AttemptOutcome, Session};
use site_audit::view::SubmissionView;
use std::process::ExitCode;
use std::sync::Arc;

/// Run the submit command
pub async fn run_submit(
    api: Arc<dyn AuditApi>,
    form: FormInput,
    follow: FollowProgress,
) -> Result<ExitCode> {
    let progress = CliProgress::new();
    let mut session = Session::with_view(api, SubmissionView::with_form(form));

    println!("{}", "Website Audit".emphasis());
    let outcome = session.submit(&progress).await?;
    let code = settle(&mut session, &progress, &outcome, follow).await;

    session.close(&progress).await;
    Ok(code)
}

/// After the request settled: keep following progress when the report is
/// ready, map the outcome to an exit code.
///
/// A failed submission does not close the channel here; it stays open
/// until the session is torn down or superseded. The bar is released either
/// way so nothing keeps drawing after the outcome is shown.
pub async fn settle(
    session: &mut Session,
    progress: &CliProgress,
    outcome: &AttemptOutcome,
    follow: FollowProgress,
) -> ExitCode {
    let code = match outcome {
        AttemptOutcome::Completed { .. } => {
            if follow.enabled
                && session.has_open_channel()
                && !session.wait_for_progress(progress, follow.timeout).await
            {
                println!("{}", "Stopped following progress (timeout)".muted());
            }
            ExitCode::SUCCESS
        }
        AttemptOutcome::Failed { .. } => ExitCode::FAILURE,
    };

    progress.release_bar();
    code
}
