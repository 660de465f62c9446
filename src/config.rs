//! API base origin configuration

use crate::error::{Error, Result};
use std::env;
use url::Url;

/// Environment variable holding the API base origin
pub const API_BASE_ENV: &str = "SITE_AUDIT_API_BASE_URL";

/// Variable used by the web build, honored as a fallback
pub const API_BASE_ENV_FALLBACK: &str = "VITE_API_BASE_URL";

/// Where the API base was obtained from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--api-base` command line flag
    Flag,
    /// Named environment variable
    EnvVar(&'static str),
}

/// Location of the audit API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: Url,
    /// Where `base_url` came from
    pub source: ConfigSource,
}

impl ApiConfig {
    /// Parse an explicit base URL
    pub fn new(raw: &str, source: ConfigSource) -> Result<Self> {
        let base_url = Url::parse(raw.trim())
            .map_err(|e| Error::Config(format!("invalid API base URL `{raw}`: {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API base URL must use http or https, got `{}`",
                base_url.scheme()
            )));
        }
        if base_url.cannot_be_a_base() || base_url.host_str().is_none() {
            return Err(Error::Config(format!(
                "API base URL `{raw}` has no host"
            )));
        }
        if base_url.query().is_some() || base_url.fragment().is_some() {
            return Err(Error::Config(format!(
                "API base URL `{raw}` must not carry a query or fragment"
            )));
        }

        Ok(Self { base_url, source })
    }

    /// Resolve the API base
    ///
    /// Priority:
    /// 1. `--api-base` flag
    /// 2. `SITE_AUDIT_API_BASE_URL` environment variable
    /// 3. `VITE_API_BASE_URL` environment variable
    pub fn resolve(flag: Option<&str>) -> Result<Self> {
        Self::resolve_with(flag, |var| env::var(var).ok())
    }

    /// Resolve the API base, reading variables through `lookup`
    pub fn resolve_with(
        flag: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(raw) = flag {
            return Self::new(raw, ConfigSource::Flag);
        }

        for var in [API_BASE_ENV, API_BASE_ENV_FALLBACK] {
            if let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) {
                return Self::new(&raw, ConfigSource::EnvVar(var));
            }
        }

        Err(Error::Config(format!(
            "no API base URL configured. Pass --api-base or set {API_BASE_ENV}"
        )))
    }

    /// The parsed base URL
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of an endpoint below the base, `path` starting with `/`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}
