//! site-audit - website audit reports with live progress
//!
//! CLI binary submitting a website to the audit API and following the
//! report generation over server-sent events.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use site_audit::api::{AuditApi, HttpAuditApi};
use site_audit::config::ApiConfig;
use site_audit::form::FormInput;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cli;

/// Environment variable selecting the log filter
const LOG_ENV: &str = "SITE_AUDIT_LOG";

#[derive(Parser)]
#[command(name = "site-audit")]
#[command(about = "Website audit reports with live progress")]
#[command(version)]
struct Cli {
    /// Base URL of the audit API (defaults to $SITE_AUDIT_API_BASE_URL)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Log diagnostics to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a website for audit
    Submit {
        /// Your name
        #[arg(long)]
        name: String,

        /// Email address the report is associated with
        #[arg(long)]
        email: String,

        /// Website to audit
        #[arg(long)]
        url: String,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Follow the progress of an existing session
    Watch {
        /// Session id printed by an earlier submission
        session_id: String,

        /// Stop after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Args, Clone, Copy)]
struct FollowArgs {
    /// Exit as soon as the report link is available
    #[arg(long)]
    no_follow: bool,

    /// Stop following progress after this many seconds
    #[arg(long)]
    follow_timeout: Option<u64>,
}

impl From<FollowArgs> for cli::FollowProgress {
    fn from(args: FollowArgs) -> Self {
        Self {
            enabled: !args.no_follow,
            timeout: args.follow_timeout.map(Duration::from_secs),
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "site_audit=info",
            _ => "site_audit=debug",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ApiConfig::resolve(cli.api_base.as_deref())?;
    tracing::debug!(base = %config.base_url(), source = ?config.source, "resolved API base");
    let api: Arc<dyn AuditApi> = Arc::new(HttpAuditApi::new(config)?);

    let code = match cli.command {
        None => {
            // Default: interactive mode
            let follow = cli::FollowProgress {
                enabled: true,
                timeout: None,
            };
            cli::run_interactive(api, follow).await?
        }
        Some(Commands::Submit {
            name,
            email,
            url,
            follow,
        }) => cli::run_submit(api, FormInput::new(name, email, url), follow.into()).await?,
        Some(Commands::Watch {
            session_id,
            timeout,
        }) => cli::run_watch(api, &session_id, timeout.map(Duration::from_secs)).await?,
    };

    Ok(code)
}
