//! HTTP transport for probes.

use super::{ProbeRequest, ProbeResponse};
use crate::error::HandleCheckError;
use crate::types::CheckConfig;
use std::time::Duration;

/// Performs the single HTTP exchange behind every probe.
///
/// The underlying client follows redirects and is cheap to clone; one
/// prober is shared by all workers of a session.
#[derive(Clone, Debug)]
pub struct HttpProber {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    /// Create a prober honoring the session's timeout and User-Agent.
    pub fn new(config: &CheckConfig) -> Result<Self, HandleCheckError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| {
                HandleCheckError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            timeout: config.timeout,
        })
    }

    /// Send `request` and capture what its strategy needs to classify it.
    pub async fn fetch(
        &self,
        platform: &str,
        request: &ProbeRequest,
    ) -> Result<ProbeResponse, HandleCheckError> {
        let exchange = tokio::time::timeout(self.timeout, self.exchange(platform, request)).await;

        match exchange {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(HandleCheckError::Timeout { .. })) | Err(_) => {
                tracing::debug!(platform, url = %request.target_url, timeout = ?self.timeout, "probe timed out");
                Err(HandleCheckError::timeout(
                    format!("{} {}", request.method, request.target_url),
                    self.timeout,
                ))
            }
            Ok(Err(e)) => {
                tracing::debug!(platform, url = %request.target_url, error = %e, "probe failed");
                Err(e)
            }
        }
    }

    async fn exchange(
        &self,
        platform: &str,
        request: &ProbeRequest,
    ) -> Result<ProbeResponse, HandleCheckError> {
        let mut builder = self
            .http_client
            .request(request.method.clone(), request.target_url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| exchange_error(platform, e, None))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let body = if request.reads_body() {
            let text = response
                .text()
                .await
                .map_err(|e| exchange_error(platform, e, Some(status)))?;
            Some(text)
        } else {
            None
        };

        Ok(ProbeResponse {
            requested_url: request.target_url.clone(),
            final_url,
            status,
            body,
        })
    }
}

/// Failures after the platform was reached become `HttpError`; everything
/// else keeps the transport mapping.
fn exchange_error(platform: &str, err: reqwest::Error, status: Option<u16>) -> HandleCheckError {
    let message = if err.is_redirect() {
        "Too many redirects"
    } else if err.is_body() || err.is_decode() {
        "Malformed response body"
    } else {
        return HandleCheckError::from(err);
    };

    HandleCheckError::HttpError {
        platform: platform.to_string(),
        message: format!("{}: {}", message, err),
        status_code: status.or_else(|| err.status().map(|code| code.as_u16())),
    }
}
