//! Form input and field constraints
//!
//! Mirrors the constraints a browser enforces on a `required` text field,
//! an `email` field and a `url` field. Nothing stricter is checked: the
//! server is the authority on whether a website can actually be audited.

use crate::error::{Error, Result};
use crate::types::{SessionId, SubmissionPayload};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A field of the submission form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Requester name
    Name,
    /// Requester email
    Email,
    /// Website URL to audit
    Url,
}

impl Field {
    /// All fields in display order
    pub const ALL: [Self; 3] = [Self::Name, Self::Email, Self::Url];

    /// Field name as used in the payload
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Url => "url",
        }
    }

    /// Prompt label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Url => "Website URL",
        }
    }

    /// Example value shown as a hint
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Name => "Your name",
            Self::Email => "your.email@example.com",
            Self::Url => "https://example.com",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values typed into the form
///
/// Starts empty, is overwritten field by field, and is read at submission
/// time. It is never cleared by a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    /// Requester name
    pub name: String,
    /// Requester email
    pub email: String,
    /// Website URL
    pub url: String,
}

impl FormInput {
    /// Build a form from the three values
    pub fn new(name: impl Into<String>, email: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            url: url.into(),
        }
    }

    /// Overwrite one field
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Url => self.url = value,
        }
    }

    /// Current value of one field
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Url => &self.url,
        }
    }

    /// Check every field, reporting the first violation in display order
    pub fn validate(&self) -> Result<()> {
        for field in Field::ALL {
            validate_field(field, self.get(field))?;
        }
        Ok(())
    }

    /// Snapshot the current values into a payload for `session_id`
    ///
    /// Email and URL are sent trimmed, as a browser sanitizes those inputs.
    pub fn to_payload(&self, session_id: SessionId) -> SubmissionPayload {
        SubmissionPayload {
            name: self.name.clone(),
            email: self.email.trim().to_string(),
            url: self.url.trim().to_string(),
            session_id,
        }
    }
}

/// Check a single value against its field's constraint
pub fn validate_field(field: Field, value: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidField {
        field: field.as_str(),
        reason: reason.to_string(),
    };

    match field {
        Field::Name => {
            if value.is_empty() {
                return Err(invalid("please fill out this field"));
            }
        }
        Field::Email => {
            let value = value.trim();
            if value.is_empty() {
                return Err(invalid("please fill out this field"));
            }
            if !email_regex().is_match(value) {
                return Err(invalid("please enter an email address"));
            }
        }
        Field::Url => {
            let value = value.trim();
            if value.is_empty() {
                return Err(invalid("please fill out this field"));
            }
            url::Url::parse(value).map_err(|_| invalid("please enter a URL"))?;
        }
    }

    Ok(())
}

/// The "valid email address" production browsers use for `type=email`.
fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("hardcoded email pattern is valid")
    })
}
