//! HTTP client for the drawwy server.

use std::fmt::Write;

use canvas::grid::Grid;
use canvas::protocol::{AiRequest, AiResponse};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CliError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishBody<'a> {
    pub creator_name: &'a str,
    pub artwork_name: &'a str,
    pub grid: &'a Grid,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub image_id: String,
    pub grid_data_id: String,
    pub manifest_id: String,
    pub link: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridMetadata {
    pub creator: String,
    pub artwork_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridDataFile {
    pub grid: Grid,
    pub metadata: GridMetadata,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_string() }
    }

    /// # Errors
    ///
    /// Transport errors or a non-2xx status.
    pub async fn ping(&self) -> Result<(), CliError> {
        let response = self
            .http
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CliError::Server { status: status.as_u16(), message: "health check failed".to_owned() });
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Transport errors or a non-2xx status.
    pub async fn generate(&self, request: &AiRequest) -> Result<AiResponse, CliError> {
        self.request(Method::POST, "/api/ai", Some(request)).await
    }

    /// # Errors
    ///
    /// Transport errors or a non-2xx status.
    pub async fn publish(&self, body: &PublishBody<'_>) -> Result<PublishReceipt, CliError> {
        self.request(Method::POST, "/api/publish", Some(body)).await
    }

    /// # Errors
    ///
    /// Transport errors or a non-2xx status.
    pub async fn gallery(&self, first: u32, query: Option<&str>) -> Result<Vec<GalleryItem>, CliError> {
        let mut path = format!("/api/gallery?first={first}");
        if let Some(q) = query {
            path.push_str("&q=");
            path.push_str(&encode_query(q));
        }
        self.request::<(), _>(Method::GET, &path, None).await
    }

    /// # Errors
    ///
    /// Transport errors or a non-2xx status.
    pub async fn artwork_grid(&self, id: &str) -> Result<GridDataFile, CliError> {
        self.request::<(), _>(Method::GET, &format!("/api/artwork/{id}/grid"), None)
            .await
    }

    async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, CliError> {
        let url = format!("{}{path}", self.base_url);
        let request = self.http.request(method, &url);
        let request = if let Some(json) = body { request.json(json) } else { request };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(CliError::Server { status: status.as_u16(), message: error_message(&text) });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// The `error` field of an error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| body.to_string())
}

/// Percent-encode a query value.
fn encode_query(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
