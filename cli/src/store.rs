//! Local persistence: drafts, export history and the chat log.
//!
//! Each collection is one pretty-printed JSON file in the data directory.
//! Reads never fail: a missing, unreadable or corrupt file reads as empty so
//! a bad file can't lock the user out of the editor. Writes create the
//! directory on demand and report I/O errors.

use std::fs;
use std::path::{Path, PathBuf};

use canvas::grid::Grid;
use canvas::protocol::ChatMessage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const DRAFTS_FILE: &str = "drafts.json";
const EXPORTS_FILE: &str = "export-history.json";
const CHAT_FILE: &str = "chat.json";

/// Export history keeps this many entries, newest first.
pub const MAX_EXPORTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    pub name: String,
    pub grid: Grid,
    pub size: usize,
    /// Unix milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntry {
    pub id: String,
    pub creator_name: String,
    pub turbo_link: String,
    pub artwork_name: String,
    pub size: usize,
    pub exported_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_id: Option<String>,
}

#[must_use]
pub fn now_millis() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(nanos).unwrap_or(i64::MAX)
}

/// Default data directory: the platform data dir plus `drawwy`.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".drawwy"), |dir| dir.join("drawwy"))
}

pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned + Default>(&self, file: &str) -> T {
        fs::read_to_string(self.dir.join(file))
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(file), json)
    }

    // -------------------------------------------------------------------------
    // drafts
    // -------------------------------------------------------------------------

    /// All drafts, most recently updated first.
    #[must_use]
    pub fn drafts(&self) -> Vec<Draft> {
        let mut drafts: Vec<Draft> = self.read(DRAFTS_FILE);
        drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        drafts
    }

    #[must_use]
    pub fn draft(&self, id: &str) -> Option<Draft> {
        self.drafts().into_iter().find(|d| d.id == id)
    }

    /// Insert or update by id. An update keeps the original `created_at`.
    ///
    /// # Errors
    ///
    /// I/O errors writing the drafts file.
    pub fn save_draft(&self, id: Option<&str>, name: &str, grid: &Grid) -> std::io::Result<Draft> {
        let mut drafts: Vec<Draft> = self.read(DRAFTS_FILE);
        let now = now_millis();
        let existing = id.and_then(|id| drafts.iter().position(|d| d.id == id));
        let draft = if let Some(idx) = existing {
            let draft = &mut drafts[idx];
            draft.name = name.to_string();
            draft.grid = grid.clone();
            draft.size = grid.side();
            draft.updated_at = now;
            draft.clone()
        } else {
            let draft = Draft {
                id: id.map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string),
                name: name.to_string(),
                grid: grid.clone(),
                size: grid.side(),
                created_at: now,
                updated_at: now,
            };
            drafts.push(draft.clone());
            draft
        };
        self.write(DRAFTS_FILE, &drafts)?;
        Ok(draft)
    }

    /// Returns whether a draft was removed.
    ///
    /// # Errors
    ///
    /// I/O errors writing the drafts file.
    pub fn delete_draft(&self, id: &str) -> std::io::Result<bool> {
        let mut drafts: Vec<Draft> = self.read(DRAFTS_FILE);
        let before = drafts.len();
        drafts.retain(|d| d.id != id);
        if drafts.len() == before {
            return Ok(false);
        }
        self.write(DRAFTS_FILE, &drafts)?;
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // export history
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn exports(&self) -> Vec<ExportEntry> {
        self.read(EXPORTS_FILE)
    }

    /// Prepend `entry`, keeping the newest [`MAX_EXPORTS`].
    ///
    /// # Errors
    ///
    /// I/O errors writing the history file.
    pub fn record_export(&self, entry: ExportEntry) -> std::io::Result<()> {
        let mut exports = self.exports();
        exports.insert(0, entry);
        exports.truncate(MAX_EXPORTS);
        self.write(EXPORTS_FILE, &exports)
    }

    /// # Errors
    ///
    /// I/O errors writing the history file.
    pub fn clear_exports(&self) -> std::io::Result<()> {
        self.write(EXPORTS_FILE, &[] as &[ExportEntry])
    }

    // -------------------------------------------------------------------------
    // chat log
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn chat(&self) -> Vec<ChatMessage> {
        self.read(CHAT_FILE)
    }

    /// # Errors
    ///
    /// I/O errors writing the chat file.
    pub fn save_chat(&self, messages: &[ChatMessage]) -> std::io::Result<()> {
        self.write(CHAT_FILE, messages)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
