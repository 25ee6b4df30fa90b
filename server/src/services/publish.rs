//! Publish service: grid → PNG + grid-data file + path manifest.
//!
//! DESIGN
//! ======
//! Three uploads, in order: the PNG image, `grid-data.json` (which records
//! the image id), then a manifest mapping both paths. The manifest id is the
//! shareable link. Uploads go through the [`Uploader`] trait so the storage
//! network can be mocked; the shipped [`HttpUploader`] posts raw bytes to a
//! bundling service that answers `{ "id": ... }`.
//!
//! All three files are sized against the free-tier limit before the first
//! upload. The grid-data file and manifest embed ids that don't exist yet, so
//! they are sized with [`TX_ID_PLACEHOLDER`] in place of each id. A rejected
//! artwork therefore never leaves a partial upload behind unless the failure
//! happens on the network.

use std::io::Cursor;

use canvas::consts::BACKGROUND;
use canvas::grid::{Grid, hex_rgb};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::ErrorCode;

pub const IMAGE_PATH: &str = "image.png";
pub const GRID_DATA_PATH: &str = "grid-data.json";
pub const MANIFEST_PATH: &str = "manifest.json";
pub const TAG_VERSION: &str = "1.0.0";

/// Stand-in for a not-yet-known transaction id when sizing files. Storage
/// ids are 43 base64url characters.
pub const TX_ID_PLACEHOLDER: &str = "0000000000000000000000000000000000000000000";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("publishing is not configured")]
    NotConfigured,
    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: &'static str, size: usize, limit: usize },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("upload request failed: {0}")]
    Request(String),
    #[error("upload rejected: status {status}")]
    Rejected { status: u16, body: String },
    #[error("upload response parse failed: {0}")]
    Parse(String),
}

impl ErrorCode for PublishError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "E_MISSING_FIELD",
            Self::NotConfigured => "E_PUBLISH_NOT_CONFIGURED",
            Self::TooLarge { .. } => "E_UPLOAD_TOO_LARGE",
            Self::Encode(_) => "E_PNG_ENCODE",
            Self::Request(_) => "E_UPLOAD_REQUEST",
            Self::Rejected { .. } => "E_UPLOAD_REJECTED",
            Self::Parse(_) => "E_UPLOAD_PARSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Rejected { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// UPLOADER
// =============================================================================

/// A name/value tag attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    #[must_use]
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self { name: name.to_string(), value: value.into() }
    }
}

/// Permanent storage. Returns the transaction id of the stored bytes.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// # Errors
    ///
    /// Transport failures or a rejection by the storage service.
    async fn upload(&self, data: Vec<u8>, tags: &[Tag]) -> Result<String, PublishError>;
}

/// Posts raw bytes to an upload endpoint. Tags travel as a JSON array in
/// the `x-tags` header; the content type is also set as `Content-Type`.
pub struct HttpUploader {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpUploader {
    #[must_use]
    pub fn new(http: reqwest::Client, url: String, token: Option<String>) -> Self {
        Self { http, url, token }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
}

#[async_trait::async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, data: Vec<u8>, tags: &[Tag]) -> Result<String, PublishError> {
        let tag_header = serde_json::to_string(tags).map_err(|e| PublishError::Request(e.to_string()))?;
        let content_type = tags
            .iter()
            .find(|t| t.name == "Content-Type")
            .map_or("application/octet-stream", |t| t.value.as_str());

        let mut request = self
            .http
            .post(&self.url)
            .header("content-type", content_type)
            .header("x-tags", tag_header)
            .body(data);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PublishError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| PublishError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(PublishError::Rejected { status, body: text });
        }
        let parsed: UploadResponse = serde_json::from_str(&text).map_err(|e| PublishError::Parse(e.to_string()))?;
        Ok(parsed.id)
    }
}

// =============================================================================
// WIRE + FILE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    pub app_name: String,
    pub gateway_url: String,
    pub max_upload_bytes: usize,
    pub export_scale: u32,
}

impl From<&ServerConfig> for PublishSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            gateway_url: config.gateway_url.clone(),
            max_upload_bytes: config.max_upload_bytes,
            export_scale: config.export_scale,
        }
    }
}

/// Body of `POST /api/publish`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub creator_name: String,
    pub artwork_name: String,
    pub grid: Grid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub image_id: String,
    pub grid_data_id: String,
    pub manifest_id: String,
    pub link: String,
    pub size: usize,
}

/// Contents of `grid-data.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDataFile {
    pub grid: Grid,
    pub metadata: GridMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridMetadata {
    pub image_tx_id: String,
    pub creator: String,
    pub artwork_name: String,
    pub size: usize,
    pub created_at: String,
}

/// Path manifest body for an image id and a grid-data id.
#[must_use]
pub fn manifest_json(image_id: &str, grid_data_id: &str) -> serde_json::Value {
    serde_json::json!({
        "manifest": "arweave/paths",
        "version": "0.2.0",
        "index": { "path": IMAGE_PATH },
        "paths": {
            IMAGE_PATH: { "id": image_id },
            GRID_DATA_PATH: { "id": grid_data_id },
        },
    })
}

// =============================================================================
// PNG
// =============================================================================

/// Render each cell as a `scale`×`scale` block. Unparsable cells paint as
/// the background.
///
/// # Errors
///
/// Returns [`PublishError::Encode`] if the PNG encoder fails.
#[allow(clippy::cast_possible_truncation)]
pub fn render_png(grid: &Grid, scale: u32) -> Result<Vec<u8>, PublishError> {
    let background = hex_rgb(BACKGROUND).unwrap_or([255, 255, 255]);
    let side = u32::try_from(grid.side()).map_err(|e| PublishError::Encode(e.to_string()))?;
    let dim = side
        .checked_mul(scale)
        .ok_or_else(|| PublishError::Encode(format!("{side}x{side} grid at scale {scale} overflows")))?;
    let mut img = image::RgbImage::from_pixel(dim, dim, image::Rgb(background));
    for (y, row) in grid.rows().iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let rgb = image::Rgb(hex_rgb(cell).unwrap_or(background));
            // Both indices are below `side`, which fits in u32.
            let (px, py) = (x as u32 * scale, y as u32 * scale);
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(px + dx, py + dy, rgb);
                }
            }
        }
    }
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PublishError::Encode(e.to_string()))?;
    Ok(buf)
}

// =============================================================================
// PUBLISH
// =============================================================================

fn base_tags(settings: &PublishSettings, request: &PublishRequest, content_type: &str) -> Vec<Tag> {
    vec![
        Tag::new("Version", TAG_VERSION),
        Tag::new("Artist", request.creator_name.as_str()),
        Tag::new("Art-Name", request.artwork_name.as_str()),
        Tag::new("Content-Type", content_type),
        Tag::new("App-Name", settings.app_name.as_str()),
    ]
}

fn check_size(path: &'static str, data: &[u8], limit: usize) -> Result<(), PublishError> {
    if data.len() > limit {
        warn!(path, size = data.len(), limit, "publish: file too large");
        return Err(PublishError::TooLarge { path, size: data.len(), limit });
    }
    Ok(())
}

fn grid_data_bytes(request: &PublishRequest, image_id: &str, created_at: &str) -> Result<Vec<u8>, PublishError> {
    let file = GridDataFile {
        grid: request.grid.clone(),
        metadata: GridMetadata {
            image_tx_id: image_id.to_string(),
            creator: request.creator_name.clone(),
            artwork_name: request.artwork_name.clone(),
            size: request.grid.side(),
            created_at: created_at.to_string(),
        },
    };
    serde_json::to_vec(&file).map_err(|e| PublishError::Encode(e.to_string()))
}

fn manifest_bytes(image_id: &str, grid_data_id: &str) -> Result<Vec<u8>, PublishError> {
    serde_json::to_vec(&manifest_json(image_id, grid_data_id)).map_err(|e| PublishError::Encode(e.to_string()))
}

/// Upload image, grid data and manifest for one artwork.
///
/// # Errors
///
/// Missing names, oversized files, encoding failures and upload failures.
pub async fn publish(
    uploader: &dyn Uploader,
    settings: &PublishSettings,
    request: &PublishRequest,
) -> Result<PublishReceipt, PublishError> {
    if request.creator_name.trim().is_empty() {
        return Err(PublishError::MissingField("creatorName"));
    }
    if request.artwork_name.trim().is_empty() {
        return Err(PublishError::MissingField("artworkName"));
    }
    info!(
        creator = %request.creator_name,
        artwork = %request.artwork_name,
        size = %request.grid.size(),
        "publish: started"
    );

    let created_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| PublishError::Encode(e.to_string()))?;
    let png = render_png(&request.grid, settings.export_scale)?;
    check_size(IMAGE_PATH, &png, settings.max_upload_bytes)?;
    let sized_grid_data = grid_data_bytes(request, TX_ID_PLACEHOLDER, &created_at)?;
    check_size(GRID_DATA_PATH, &sized_grid_data, settings.max_upload_bytes)?;
    let sized_manifest = manifest_bytes(TX_ID_PLACEHOLDER, TX_ID_PLACEHOLDER)?;
    check_size(MANIFEST_PATH, &sized_manifest, settings.max_upload_bytes)?;

    let image_id = uploader
        .upload(png, &base_tags(settings, request, "image/png"))
        .await?;
    info!(%image_id, "publish: image uploaded");

    let grid_bytes = grid_data_bytes(request, &image_id, &created_at)?;
    check_size(GRID_DATA_PATH, &grid_bytes, settings.max_upload_bytes)?;
    let grid_data_id = uploader
        .upload(grid_bytes, &base_tags(settings, request, "application/json"))
        .await?;
    info!(%grid_data_id, "publish: grid data uploaded");

    let manifest_bytes = manifest_bytes(&image_id, &grid_data_id)?;
    let mut manifest_tags = base_tags(settings, request, "application/x.arweave-manifest+json");
    manifest_tags.push(Tag::new("Type", "manifest"));
    let manifest_id = uploader.upload(manifest_bytes, &manifest_tags).await?;

    let link = format!("{}/{manifest_id}", settings.gateway_url);
    info!(%manifest_id, %link, "publish: uploaded");

    Ok(PublishReceipt { image_id, grid_data_id, manifest_id, link, size: request.grid.side() })
}

#[cfg(test)]
#[path = "publish_test.rs"]
mod tests;
