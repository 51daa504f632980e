//! Text extraction from files on disk
//!
//! Text-like formats are read as UTF-8. Anything else still becomes a
//! document, but its content is the extraction failure sentinel so the
//! matcher skips it.

use super::{Document, DocumentStatus};
use crate::config::EXTRACTION_FAILED_SENTINEL;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions read as plain text, with the MIME tag recorded for them
const TEXT_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("log", "text/plain"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    ("json", "application/json"),
    ("xml", "text/xml"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("toml", "application/toml"),
    ("rst", "text/x-rst"),
    ("rtf", "application/rtf"),
];

/// MIME tag for a path based on its extension
pub fn detect_type(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if let Some((_, tag)) = TEXT_TYPES.iter().find(|(e, _)| *e == ext) {
        return tag.to_string();
    }

    match ext.as_str() {
        "pdf" => mime::APPLICATION_PDF.to_string(),
        "png" => mime::IMAGE_PNG.to_string(),
        "jpg" | "jpeg" => mime::IMAGE_JPEG.to_string(),
        "docx" => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string()
        }
        _ => mime::APPLICATION_OCTET_STREAM.to_string(),
    }
}

fn is_text_type(doc_type: &str) -> bool {
    TEXT_TYPES.iter().any(|(_, tag)| *tag == doc_type)
}

/// Read one file into a document.
///
/// IO failures (missing file, permissions) are errors. Unsupported or
/// undecodable content is not: the document comes back with status `Error`.
pub async fn extract_file(path: &Path) -> Result<Document> {
    let metadata = tokio::fs::metadata(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let doc_type = detect_type(path);

    let mut document = Document::uploading(name, doc_type, metadata.len());
    document.source_path = Some(path.to_path_buf());

    let bytes = tokio::fs::read(path).await?;
    document.status = DocumentStatus::Processing;

    if !is_text_type(&document.doc_type) {
        warn!(
            "No text extractor for {} ({})",
            document.name, document.doc_type
        );
        document.content = format!(
            "{} for {}: unsupported type {}",
            EXTRACTION_FAILED_SENTINEL, document.name, document.doc_type
        );
        document.status = DocumentStatus::Error;
        return Ok(document);
    }

    match String::from_utf8(bytes) {
        Ok(text) => {
            debug!("Extracted {} bytes from {}", text.len(), document.name);
            document.content = text;
            document.status = DocumentStatus::Ready;
        }
        Err(e) => {
            warn!("{} is not valid UTF-8: {}", document.name, e);
            document.content = format!(
                "{} for {}: content is not valid UTF-8",
                EXTRACTION_FAILED_SENTINEL, document.name
            );
            document.status = DocumentStatus::Error;
        }
    }

    Ok(document)
}

/// Extract a file, or every file below a directory (hidden entries skipped)
pub async fn ingest_path(path: &Path) -> Result<Vec<Document>> {
    if path.is_file() {
        return Ok(vec![extract_file(path).await?]);
    }

    let files: Vec<PathBuf> = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    if files.is_empty() && !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )
        .into());
    }

    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        documents.push(extract_file(&file).await?);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_detect_type() {
        assert_eq!(detect_type(Path::new("a.TXT")), "text/plain");
        assert_eq!(detect_type(Path::new("a.md")), "text/markdown");
        assert_eq!(detect_type(Path::new("a.pdf")), "application/pdf");
        assert_eq!(detect_type(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_extract_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("letter.txt");
        tokio::fs::write(&path, "Dear reader,\nthe cat sat on the mat.\n")
            .await
            .unwrap();

        let doc = extract_file(&path).await.unwrap();
        assert_eq!(doc.name, "letter.txt");
        assert_eq!(doc.doc_type, "text/plain");
        assert_eq!(doc.status, DocumentStatus::Ready);
        assert_eq!(doc.size, doc.content.len() as u64);
        assert!(doc.content.contains("cat sat"));
        assert_eq!(doc.source_path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_unsupported_type_yields_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        tokio::fs::write(&path, b"%PDF-1.4 binary").await.unwrap();

        let doc = extract_file(&path).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Error);
        assert!(doc.content.contains(EXTRACTION_FAILED_SENTINEL));
    }

    #[tokio::test]
    async fn test_invalid_utf8_yields_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        tokio::fs::write(&path, [0xff, 0xfe, 0xfd]).await.unwrap();

        let doc = extract_file(&path).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Error);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(extract_file(&dir.path().join("nope.txt")).await.is_err());
        assert!(ingest_path(&dir.path().join("nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_ingest_directory_skips_hidden() {
        let dir = tempdir().unwrap();
        tokio::fs::write(dir.path().join("b.txt"), "second file with text")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("a.md"), "# first file with text")
            .await
            .unwrap();
        tokio::fs::create_dir(dir.path().join(".git")).await.unwrap();
        tokio::fs::write(dir.path().join(".git").join("HEAD"), "ref: main")
            .await
            .unwrap();

        let docs = ingest_path(dir.path()).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.txt"]);
    }
}
