//! Gallery service: community artwork listing and load-from-link.
//!
//! DESIGN
//! ======
//! Artwork is discovered through a GraphQL indexer: transactions tagged with
//! our `App-Name` and `Content-Type: image/png`, newest block first. The
//! listing walks `pageInfo.hasNextPage` using the last edge's cursor and
//! pauses between pages to stay polite to the public gateway.
//!
//! Loading an artwork back into the editor fetches `<id>/grid-data.json`
//! from the gateway; the grid is shape-checked by its deserializer, so a
//! malformed file is an error rather than a broken canvas.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::publish::{GRID_DATA_PATH, GridDataFile, Tag};
use crate::config::ServerConfig;
use crate::error::ErrorCode;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const PAGE_PAUSE: Duration = Duration::from_millis(100);
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNTITLED: &str = "untitled";

const TRANSACTIONS_QUERY: &str = "query GetDrawwyTransactions($first: Int!, $after: String, $app: [String!]!) { \
     transactions(tags: [{ name: \"App-Name\", values: $app }, { name: \"Content-Type\", values: [\"image/png\"] }] \
     first: $first after: $after sort: HEIGHT_DESC) { pageInfo { hasNextPage } edges { cursor node { id owner { address } \
     data { size type } tags { name value } block { id timestamp height } } } } }";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("indexer request failed: {0}")]
    Request(String),
    #[error("indexer returned status {status}")]
    Status { status: u16 },
    #[error("indexer response parse failed: {0}")]
    Parse(String),
    #[error("indexer query failed: {0}")]
    Query(String),
    #[error("artwork {0} not found")]
    NotFound(String),
    #[error("invalid artwork id: {0:?}")]
    InvalidId(String),
}

impl ErrorCode for GalleryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_INDEXER_REQUEST",
            Self::Status { .. } => "E_INDEXER_STATUS",
            Self::Parse(_) => "E_INDEXER_PARSE",
            Self::Query(_) => "E_INDEXER_QUERY",
            Self::NotFound(_) => "E_ARTWORK_NOT_FOUND",
            Self::InvalidId(_) => "E_INVALID_ARTWORK_ID",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599 })
    }
}

// =============================================================================
// INDEXER TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Owner {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub height: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TxNode {
    pub id: String,
    pub owner: Owner,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Pending transactions have no block yet.
    #[serde(default)]
    pub block: Option<Block>,
}

impl TxNode {
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.iter().find(|t| t.name == name).map(|t| t.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Edge {
    pub cursor: String,
    pub node: TxNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionPage {
    pub has_next_page: bool,
    pub edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<GraphqlData>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorItem>>,
}

#[derive(Deserialize)]
struct GraphqlData {
    transactions: Transactions,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Transactions {
    page_info: PageInfo,
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}

#[derive(Deserialize)]
struct GraphqlErrorItem {
    message: String,
}

/// Parse one page of the transactions query.
///
/// # Errors
///
/// [`GalleryError::Query`] when the body carries GraphQL `errors`,
/// [`GalleryError::Parse`] when it is not the expected shape.
pub fn parse_page(body: &str) -> Result<TransactionPage, GalleryError> {
    let resp: GraphqlResponse = serde_json::from_str(body).map_err(|e| GalleryError::Parse(e.to_string()))?;
    if let Some(errors) = resp.errors.filter(|e| !e.is_empty()) {
        let joined = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(GalleryError::Query(joined));
    }
    let Some(data) = resp.data else {
        return Err(GalleryError::Parse("missing data".into()));
    };
    Ok(TransactionPage { has_next_page: data.transactions.page_info.has_next_page, edges: data.transactions.edges })
}

// =============================================================================
// INDEXER
// =============================================================================

/// Read side of the storage network.
#[async_trait::async_trait]
pub trait Indexer: Send + Sync {
    /// # Errors
    ///
    /// Transport, status, or GraphQL errors.
    async fn fetch_page(&self, first: u32, after: Option<&str>) -> Result<TransactionPage, GalleryError>;

    /// # Errors
    ///
    /// Transport errors, a missing file, or a grid that fails validation.
    async fn fetch_grid(&self, id: &str) -> Result<GridDataFile, GalleryError>;
}

pub struct GraphqlIndexer {
    http: reqwest::Client,
    graphql_url: String,
    gateway_url: String,
    app_name: String,
}

impl GraphqlIndexer {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &ServerConfig) -> Self {
        Self {
            http,
            graphql_url: config.graphql_url.clone(),
            gateway_url: config.gateway_url.clone(),
            app_name: config.app_name.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Indexer for GraphqlIndexer {
    async fn fetch_page(&self, first: u32, after: Option<&str>) -> Result<TransactionPage, GalleryError> {
        let body = serde_json::json!({
            "query": TRANSACTIONS_QUERY,
            "variables": { "first": first, "after": after, "app": [self.app_name] },
        });
        let response = self
            .http
            .post(&self.graphql_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GalleryError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(GalleryError::Status { status });
        }
        let text = response
            .text()
            .await
            .map_err(|e| GalleryError::Request(e.to_string()))?;
        parse_page(&text)
    }

    async fn fetch_grid(&self, id: &str) -> Result<GridDataFile, GalleryError> {
        let url = format!("{}/{id}/{GRID_DATA_PATH}", self.gateway_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GalleryError::Request(e.to_string()))?;
        match response.status().as_u16() {
            200 => {}
            404 => return Err(GalleryError::NotFound(id.to_string())),
            status => return Err(GalleryError::Status { status }),
        }
        let text = response
            .text()
            .await
            .map_err(|e| GalleryError::Request(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| GalleryError::Parse(e.to_string()))
    }
}

// =============================================================================
// LISTING
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub link: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl GalleryItem {
    #[must_use]
    pub fn from_node(node: TxNode, gateway_url: &str) -> Self {
        let artist = node.tag("Artist").unwrap_or(UNKNOWN_ARTIST).to_string();
        let title = node.tag("Art-Name").unwrap_or(UNTITLED).to_string();
        Self {
            link: format!("{gateway_url}/{}", node.id),
            timestamp: node.block.as_ref().and_then(|b| b.timestamp),
            owner: node.owner.address,
            id: node.id,
            artist,
            title,
        }
    }

    /// Case-insensitive substring match on artist or title.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.artist.to_lowercase().contains(&query) || self.title.to_lowercase().contains(&query)
    }
}

/// Walk every page, `first` transactions at a time.
///
/// # Errors
///
/// The first page error aborts the walk.
pub async fn list_all(
    indexer: &dyn Indexer,
    gateway_url: &str,
    first: u32,
    pause: Duration,
) -> Result<Vec<GalleryItem>, GalleryError> {
    let first = first.clamp(1, MAX_PAGE_SIZE);
    let mut items = Vec::new();
    let mut after: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = indexer.fetch_page(first, after.as_deref()).await.map_err(|e| {
            warn!(error = %e, pages, "gallery: page fetch failed");
            e
        })?;
        pages += 1;
        let next = page.edges.last().map(|edge| edge.cursor.clone());
        items.extend(
            page.edges
                .into_iter()
                .map(|edge| GalleryItem::from_node(edge.node, gateway_url)),
        );
        match next {
            Some(cursor) if page.has_next_page => {
                after = Some(cursor);
                tokio::time::sleep(pause).await;
            }
            _ => break,
        }
    }
    info!(pages, items = items.len(), "gallery: listed");
    Ok(items)
}

/// Load an artwork's grid by transaction id.
///
/// # Errors
///
/// [`GalleryError::InvalidId`] for ids with characters outside base64url,
/// otherwise whatever the indexer reports.
pub async fn load_grid(indexer: &dyn Indexer, id: &str) -> Result<GridDataFile, GalleryError> {
    let Some(id) = canvas::protocol::artwork_id(id) else {
        return Err(GalleryError::InvalidId(id.to_string()));
    };
    let file = indexer.fetch_grid(id).await?;
    info!(%id, size = %file.grid.size(), artwork = %file.metadata.artwork_name, "gallery: grid loaded");
    Ok(file)
}

#[cfg(test)]
#[path = "gallery_test.rs"]
mod tests;
