//! Shared HTTP plumbing for the provider clients.

use reqwest::RequestBuilder;

use super::types::LlmError;
use crate::config::LlmSettings;

/// Client with the configured request and connect timeouts.
pub(super) fn client(settings: &LlmSettings) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .connect_timeout(settings.connect_timeout)
        .build()
        .map_err(|e| LlmError::HttpClientBuild(e.to_string()))
}

/// Send and return the body of a 200 response.
pub(super) async fn send(request: RequestBuilder) -> Result<String, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
    match status {
        200 => Ok(body),
        status => Err(LlmError::ApiResponse { status, body }),
    }
}
