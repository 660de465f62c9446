//! site-audit - submit a website for audit and follow report generation
//!
//! Collects a name, email and website URL, posts them to a remote
//! PDF-generation API, and follows live progress over a server-sent events
//! stream keyed by a client-generated session id.
//!
//! The [`view::SubmissionView`] holds everything shown to the user; the
//! [`session::Session`] drives it against an [`api::AuditApi`].

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod session;
pub mod types;
pub mod view;

pub use error::{Error, Result};
