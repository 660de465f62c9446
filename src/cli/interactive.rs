//! Interactive mode - prompt for the form, submit, offer to go again

use crate::cli::progress::CliProgress;
use crate::cli::style::Stylize;
use crate::cli::submit::settle;
use crate::cli::FollowProgress;
use anstream::println;
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use site_audit::api::AuditApi;
use site_audit::form::{validate_field, Field};
use site_audit::session::Session;
use std::process::ExitCode;
use std::sync::Arc;

/// Run interactive mode (default when no subcommand given)
///
/// Values typed in one round are offered again in the next. A channel left
/// open by a failed round is closed when the next round starts.
pub async fn run_interactive(api: Arc<dyn AuditApi>, follow: FollowProgress) -> Result<ExitCode> {
    let theme = ColorfulTheme::default();
    let progress = CliProgress::new();
    let mut session = Session::new(api);

    println!("{}", "Website Audit".emphasis());
    println!();

    let code = loop {
        for field in Field::ALL {
            let current = session.view().form().get(field).to_string();
            let prompt = if current.is_empty() {
                format!("{} ({})", field.label(), field.placeholder())
            } else {
                field.label().to_string()
            };

            let value: String = Input::<String>::with_theme(&theme)
                .with_prompt(prompt)
                .with_initial_text(current)
                .validate_with(move |input: &String| -> Result<(), String> {
                    validate_field(field, input).map_err(|e| e.to_string())
                })
                .interact_text()?;
            session.set_field(field, value);
        }

        let outcome = session.submit(&progress).await?;
        let code = settle(&mut session, &progress, &outcome, follow).await;
        println!();

        let again = Confirm::with_theme(&theme)
            .with_prompt("Audit another website?")
            .default(false)
            .interact()?;
        if !again {
            break code;
        }
    };

    session.close(&progress).await;
    Ok(code)
}
