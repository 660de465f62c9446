//! Submission session
//!
//! Drives one view against the audit API:
//! 1. Start an attempt - validate the form, reset the view, new session id
//! 2. Open the progress channel and race the submission request against it
//! 3. Optionally keep following the channel after the request settled

mod driver;
mod progress;

pub use driver::{AttemptOutcome, Session};
pub use progress::{ChannelClose, NoopProgress, ProgressCallback};
