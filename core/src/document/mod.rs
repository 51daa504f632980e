//! Documents, the in-memory store, extraction and persistence

pub mod extract;
pub mod repository;
pub mod store;

pub use extract::{extract_file, ingest_path};
pub use repository::{DocumentRepository, JsonFileRepository};
pub use store::DocumentStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Lifecycle of a document from upload to searchable text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Uploading => write!(f, "uploading"),
            DocumentStatus::Processing => write!(f, "processing"),
            DocumentStatus::Ready => write!(f, "ready"),
            DocumentStatus::Error => write!(f, "error"),
        }
    }
}

/// An uploaded document and its extracted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,

    /// Display name, usually the file name
    pub name: String,

    /// MIME type tag
    pub doc_type: String,

    /// Size of the source file in bytes
    pub size: u64,

    /// Full extracted text
    pub content: String,

    pub status: DocumentStatus,

    pub uploaded_at: DateTime<Utc>,

    /// Where the document was read from, when it came from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

impl Document {
    /// A ready document built from text already in memory
    pub fn from_text(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: DocumentId::new(),
            name: name.into(),
            doc_type: mime::TEXT_PLAIN.to_string(),
            size: content.len() as u64,
            content,
            status: DocumentStatus::Ready,
            uploaded_at: Utc::now(),
            source_path: None,
        }
    }

    /// A document that has been created but not yet read
    pub fn uploading(name: impl Into<String>, doc_type: impl Into<String>, size: u64) -> Self {
        Self {
            id: DocumentId::new(),
            name: name.into(),
            doc_type: doc_type.into(),
            size,
            content: String::new(),
            status: DocumentStatus::Uploading,
            uploaded_at: Utc::now(),
            source_path: None,
        }
    }

    /// Number of whitespace separated words in the content
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}
