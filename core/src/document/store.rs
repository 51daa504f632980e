//! In-memory document store

use super::{Document, DocumentId, DocumentStatus};
use crate::config::EngineConfig;

/// Holds the documents of one user session, in upload order
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    /// Add a document, replacing any existing document with the same id
    pub fn insert(&mut self, document: Document) {
        match self.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    pub fn remove(&mut self, id: DocumentId) -> Option<Document> {
        let index = self.documents.iter().position(|d| d.id == id)?;
        Some(self.documents.remove(index))
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }

    /// Replace a document's content; returns false when the id is unknown
    pub fn update_content(&mut self, id: DocumentId, content: String) -> bool {
        match self.get_mut(id) {
            Some(document) => {
                document.content = content;
                true
            }
            None => false,
        }
    }

    /// Documents that are ready and carry real extracted text
    pub fn searchable<'a>(&'a self, config: &'a EngineConfig) -> impl Iterator<Item = &'a Document> {
        self.documents
            .iter()
            .filter(move |d| d.status == DocumentStatus::Ready && config.is_searchable(&d.content))
    }

    /// Resolve a user supplied reference: full id, id prefix, or exact name
    pub fn resolve(&self, reference: &str) -> Option<&Document> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        if let Some(doc) = self.documents.iter().find(|d| d.id.to_string() == reference) {
            return Some(doc);
        }

        let mut by_prefix = self
            .documents
            .iter()
            .filter(|d| d.id.to_string().starts_with(reference));
        if let (Some(doc), None) = (by_prefix.next(), by_prefix.next()) {
            return Some(doc);
        }

        self.documents.iter().find(|d| d.name == reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EXTRACTION_FAILED_SENTINEL;

    #[test]
    fn test_insert_get_remove() {
        let mut store = DocumentStore::new();
        let doc = Document::from_text("a.txt", "alpha beta gamma delta epsilon");
        let id = doc.id;
        store.insert(doc);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().name, "a.txt");
        assert!(store.remove(id).is_some());
        assert!(store.is_empty());
        assert!(store.remove(id).is_none());
    }

    #[test]
    fn test_insert_same_id_replaces() {
        let mut store = DocumentStore::new();
        let mut doc = Document::from_text("a.txt", "first version of the text");
        store.insert(doc.clone());
        doc.content = "second version of the text".to_string();
        store.insert(doc.clone());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(doc.id).unwrap().content, "second version of the text");
    }

    #[test]
    fn test_searchable_excludes_failed_and_short() {
        let config = EngineConfig::default();
        let mut store = DocumentStore::new();
        store.insert(Document::from_text("good.txt", "plenty of words to search through"));
        store.insert(Document::from_text("short.txt", "tiny"));
        store.insert(Document::from_text(
            "failed.pdf",
            format!("{} for failed.pdf", EXTRACTION_FAILED_SENTINEL),
        ));
        let mut pending = Document::from_text("pending.txt", "this one is still being processed");
        pending.status = DocumentStatus::Processing;
        store.insert(pending);

        let names: Vec<_> = store.searchable(&config).map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["good.txt"]);
    }

    #[test]
    fn test_resolve_by_id_prefix_and_name() {
        let mut store = DocumentStore::new();
        let doc = Document::from_text("notes.md", "some notes worth keeping around");
        let id = doc.id;
        store.insert(doc);

        assert_eq!(store.resolve(&id.to_string()).unwrap().id, id);
        assert_eq!(store.resolve(&id.to_string()[..8]).unwrap().id, id);
        assert_eq!(store.resolve("notes.md").unwrap().id, id);
        assert!(store.resolve("missing.md").is_none());
        assert!(store.resolve("").is_none());
    }
}
