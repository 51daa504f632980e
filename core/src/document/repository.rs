//! Whole-list persistence of a user's documents

use super::Document;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Saves and loads the full document list under a per-user key
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Load the documents saved for `user`; an unknown user has none
    async fn load(&self, user: &str) -> Result<Vec<Document>>;

    /// Replace everything saved for `user` with `documents`
    async fn save(&self, user: &str, documents: &[Document]) -> Result<()>;
}

/// On-disk format of a user's document list
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SavedDocuments {
    user: String,
    saved_at: DateTime<Utc>,
    documents: Vec<Document>,
}

/// One JSON file per user inside a data directory
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    root: PathBuf,
}

impl JsonFileRepository {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `user`'s documents.
    ///
    /// ASCII letters, digits, `-`, `_` and `.` are kept; every other byte,
    /// `%` included, is written as `%XX`, so distinct keys never share a file.
    pub fn path_for(&self, user: &str) -> PathBuf {
        let mut key = String::with_capacity(user.len());
        for byte in user.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                    key.push(char::from(byte))
                }
                _ => key.push_str(&format!("%{:02X}", byte)),
            }
        }
        self.root.join(format!("documents_{}.json", key))
    }
}

#[async_trait]
impl DocumentRepository for JsonFileRepository {
    async fn load(&self, user: &str) -> Result<Vec<Document>> {
        let path = self.path_for(user);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let saved: SavedDocuments = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} documents for {} (saved {})",
            saved.documents.len(),
            user,
            saved.saved_at
        );
        Ok(saved.documents)
    }

    async fn save(&self, user: &str, documents: &[Document]) -> Result<()> {
        let path = self.path_for(user);

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let saved = SavedDocuments {
            user: user.to_string(),
            saved_at: Utc::now(),
            documents: documents.to_vec(),
        };
        let content = serde_json::to_string_pretty(&saved)?;

        // Write next to the target, then rename over it
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                tracing::warn!("Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }

        Ok(())
    }
}
