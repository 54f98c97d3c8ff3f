//! Shared HTTP plumbing

use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// User agent for requests (standard Chrome on Windows)
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Build the HTTP client used by every auditor
///
/// `timeout` is the default per-request timeout; the performance auditor
/// overrides it for its single long-running call.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .danger_accept_invalid_certs(false)
        .build()
        .map_err(|e| Error::HttpClient(e.to_string()))
}

/// Fetch a page and return its body
///
/// Non-2xx responses are reported as [`Error::HttpStatus`].
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::HttpRequest(e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::HttpStatus(response.status().as_u16()));
    }

    response
        .text()
        .await
        .map_err(|e| Error::HttpRequest(e.to_string()))
}
