//! Watch command - follow the progress of an existing session

use crate::cli::progress::CliProgress;
use crate::cli::style::Stylize;
use anstream::println;
use site_audit::api::AuditApi;
use site_audit::error::Result;
use site_audit::session::Session;
use site_audit::types::SessionId;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Run the watch command
pub async fn run_watch(
    api: Arc<dyn AuditApi>,
    session_id: &str,
    timeout: Option<Duration>,
) -> Result<ExitCode> {
    let progress = CliProgress::new();
    let mut session = Session::new(api);

    let closed = session
        .watch(SessionId::new(session_id), &progress, timeout)
        .await?;
    progress.release_bar();
    session.close(&progress).await;

    if closed {
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}", "Stopped following progress (timeout)".muted());
        Ok(ExitCode::FAILURE)
    }
}
