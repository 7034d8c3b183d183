//! Probe strategies: how one HTTP exchange becomes an availability verdict.
//!
//! A probe is split in two halves. [`ProbeRequest::build`] turns a platform
//! definition into the concrete request to send, and the strategy's
//! classifier turns the captured [`ProbeResponse`] into an [`Availability`].
//! Classifiers are pure functions, looked up from the strategy kind, so they
//! can be tested without a network.

mod http;
mod strategies;

pub use http::HttpProber;
pub use strategies::{
    classify_api, classify_content, classify_markup, classify_redirect, classify_status,
    status_verdict,
};

use crate::catalog::PlatformDefinition;
use crate::error::HandleCheckError;
use crate::types::Availability;
use reqwest::Method;
use std::collections::BTreeMap;
use std::fmt;

/// Pure classification function shared by every strategy.
pub type Classifier = fn(&str, &PlatformDefinition, &ProbeResponse) -> Availability;

/// Interpretation policy selected by a platform's `checker_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStrategy {
    /// 404 means available, 200 means taken
    StatusCode,
    /// Keyword search in the page body
    Content,
    /// Existence field in a JSON API response
    Api,
    /// Where the profile URL ends up after redirects
    Redirect,
    /// Page title inspection for sites that answer 200 for everything
    Markup,
}

impl ProbeStrategy {
    pub const ALL: [ProbeStrategy; 5] = [
        ProbeStrategy::StatusCode,
        ProbeStrategy::Content,
        ProbeStrategy::Api,
        ProbeStrategy::Redirect,
        ProbeStrategy::Markup,
    ];

    /// Selector name used in catalog files.
    pub fn name(&self) -> &'static str {
        match self {
            ProbeStrategy::StatusCode => "standard",
            ProbeStrategy::Content => "profile",
            ProbeStrategy::Api => "api",
            ProbeStrategy::Redirect => "redirect",
            ProbeStrategy::Markup => "social_media",
        }
    }

    /// Look up a strategy by its catalog selector name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(name))
    }

    /// Strategy for an optional selector; absent or unrecognized selectors
    /// fall back to status-code probing.
    pub fn resolve(selector: Option<&str>) -> Self {
        match selector {
            Some(name) => Self::from_name(name).unwrap_or_else(|| {
                tracing::debug!(checker_type = name, "unrecognized checker_type, using status codes");
                ProbeStrategy::StatusCode
            }),
            None => ProbeStrategy::StatusCode,
        }
    }

    /// Whether the classifier needs the response body.
    pub fn reads_body(&self) -> bool {
        matches!(
            self,
            ProbeStrategy::Content | ProbeStrategy::Api | ProbeStrategy::Markup
        )
    }

    pub fn classifier(&self) -> Classifier {
        match self {
            ProbeStrategy::StatusCode => classify_status,
            ProbeStrategy::Content => classify_content,
            ProbeStrategy::Api => classify_api,
            ProbeStrategy::Redirect => classify_redirect,
            ProbeStrategy::Markup => classify_markup,
        }
    }

    pub fn classify(
        &self,
        platform: &str,
        definition: &PlatformDefinition,
        response: &ProbeResponse,
    ) -> Availability {
        (self.classifier())(platform, definition, response)
    }
}

impl fmt::Display for ProbeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The concrete exchange to perform for one platform and username.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub strategy: ProbeStrategy,
    /// Human-facing profile URL, reported in the outcome
    pub profile_url: String,
    /// Rendered API URL, when the platform defines one
    pub api_url: Option<String>,
    /// URL actually requested
    pub target_url: String,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
}

impl ProbeRequest {
    /// Resolve the request for `username` on `platform`.
    ///
    /// Fails with a configuration error when the definition lacks a field
    /// its strategy needs, or names an invalid HTTP method.
    pub fn build(
        platform: &str,
        definition: &PlatformDefinition,
        username: &str,
    ) -> Result<Self, HandleCheckError> {
        let strategy = definition.strategy();
        let profile_url = definition.profile_url(platform, username)?;
        let api_url = definition.api_url_for(username);

        let target_url = match strategy {
            ProbeStrategy::Api => api_url.clone().ok_or_else(|| {
                HandleCheckError::config(format!(
                    "platform '{}' uses the api checker but has no api_url",
                    platform
                ))
            })?,
            _ => profile_url.clone(),
        };

        let method = Method::from_bytes(definition.method.trim().to_uppercase().as_bytes())
            .map_err(|_| {
                HandleCheckError::config(format!(
                    "platform '{}' has invalid HTTP method '{}'",
                    platform, definition.method
                ))
            })?;

        Ok(Self {
            strategy,
            profile_url,
            api_url,
            target_url,
            method,
            headers: definition.headers.clone(),
        })
    }

    pub fn reads_body(&self) -> bool {
        self.strategy.reads_body()
    }
}

/// What a classifier gets to see of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub requested_url: String,
    /// URL after redirects were followed
    pub final_url: String,
    pub status: u16,
    /// Body text, captured only for strategies that inspect it
    pub body: Option<String>,
}

impl ProbeResponse {
    /// A response that was not redirected.
    pub fn new<U: Into<String>>(url: U, status: u16, body: Option<String>) -> Self {
        let url = url.into();
        Self {
            requested_url: url.clone(),
            final_url: url,
            status,
            body,
        }
    }

    pub fn redirected_to<U: Into<String>>(mut self, final_url: U) -> Self {
        self.final_url = final_url.into();
        self
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}
