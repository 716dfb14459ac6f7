//! HTTP client for CalDAV operations.
//!
//! Speaks the two WebDAV verbs read-only access needs (PROPFIND, REPORT)
//! with preemptive Basic authentication (RFC 7617). Credentials are fixed
//! per source, so there is no challenge negotiation.

use base64::Engine;
use reqwest::{Client, Method, Response, StatusCode};
use tracing::trace;

use crate::error::{SourceError, SourceResult};

use super::config::CalDavConfig;

/// HTTP client for CalDAV operations.
#[derive(Debug)]
pub struct CalDavClient {
    /// The underlying HTTP client.
    client: Client,
    /// Configuration.
    config: CalDavConfig,
}

impl CalDavClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: CalDavConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| SourceError::connection(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Performs a PROPFIND request (calendar discovery, probing).
    pub async fn propfind(&self, url: &str, body: &str, depth: u8) -> SourceResult<String> {
        self.request("PROPFIND", url, body, depth).await
    }

    /// Performs a REPORT request (calendar-query).
    pub async fn report(&self, url: &str, body: &str) -> SourceResult<String> {
        self.request("REPORT", url, body, 1).await
    }

    async fn request(&self, method: &str, url: &str, body: &str, depth: u8) -> SourceResult<String> {
        let http_method = Method::from_bytes(method.as_bytes())
            .map_err(|_| SourceError::fetch(format!("invalid HTTP method: {method}")))?;

        trace!(method = %method, url = %url, depth = depth, "Sending CalDAV request");

        let response = self
            .client
            .request(http_method, url)
            .header(
                "Authorization",
                basic_auth(&self.config.username, &self.config.password),
            )
            .header("Depth", depth.to_string())
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| SourceError::connection(format!("request to {url} failed: {e}")))?;

        handle_response(response).await
    }

    /// Returns the base URL from the configuration.
    pub fn base_url(&self) -> &str {
        self.config.url_str()
    }
}

/// Maps the response status onto the source error taxonomy and extracts the
/// body.
async fn handle_response(response: Response) -> SourceResult<String> {
    let status = response.status();
    trace!(status = %status, "Received CalDAV response");

    match status {
        StatusCode::OK | StatusCode::MULTI_STATUS => response
            .text()
            .await
            .map_err(|e| SourceError::connection(format!("failed to read response: {e}"))),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::authentication(
            "credentials rejected by CalDAV endpoint",
        )),
        s => {
            let body = response.text().await.unwrap_or_default();
            Err(SourceError::fetch(format!("unexpected status {s}: {body}")))
        }
    }
}

/// Builds an RFC 7617 Basic authentication header value.
fn basic_auth(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}
