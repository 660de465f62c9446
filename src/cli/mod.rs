//! CLI commands
//!
//! Command implementations for the `site-audit` binary.

mod interactive;
mod progress;
mod style;
mod submit;
mod watch;

pub use interactive::run_interactive;
pub use submit::run_submit;
pub use watch::run_watch;

use std::time::Duration;

/// What to do with the progress channel once the submission settled
#[derive(Debug, Clone, Copy)]
pub struct FollowProgress {
    /// Keep rendering progress after the report link arrived
    pub enabled: bool,
    /// Give up following after this long
    pub timeout: Option<Duration>,
}
