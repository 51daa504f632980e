//! Plain-text rendering of documents, matches and previews

use colored::Colorize;
use docshift_core::{
    Approval, Document, DocumentStatus, DocumentStore, Match, ReplacementPreview, SearchResult,
};

/// Characters of surrounding text shown next to a match
const SNIPPET_RADIUS: usize = 40;

pub fn short_id(document: &Document) -> String {
    document.id.to_string().chars().take(8).collect()
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn status_label(status: DocumentStatus) -> String {
    match status {
        DocumentStatus::Ready => status.to_string().green().to_string(),
        DocumentStatus::Error => status.to_string().red().to_string(),
        _ => status.to_string().yellow().to_string(),
    }
}

/// Collapse line breaks so a snippet stays on one line
fn one_line(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect()
}

/// Text before and after `start..end`, at most `radius` characters each
fn surroundings(content: &str, start: usize, end: usize, radius: usize) -> (String, String) {
    let before = content
        .get(..start)
        .unwrap_or_default()
        .chars()
        .rev()
        .take(radius)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<String>();
    let after = content
        .get(end..)
        .unwrap_or_default()
        .chars()
        .take(radius)
        .collect::<String>();
    (one_line(&before), one_line(&after))
}

pub fn print_document_table(documents: &[Document]) {
    if documents.is_empty() {
        println!("No documents loaded");
        return;
    }

    println!(
        "{:<10} {:<32} {:<18} {:>10} {:>8}  {:<10} {}",
        "ID".bold(),
        "NAME".bold(),
        "TYPE".bold(),
        "SIZE".bold(),
        "WORDS".bold(),
        "STATUS".bold(),
        "ADDED".bold()
    );
    for document in documents {
        println!(
            "{:<10} {:<32} {:<18} {:>10} {:>8}  {:<10} {}",
            short_id(document),
            document.name,
            document.doc_type,
            format_size(document.size),
            document.word_count(),
            status_label(document.status),
            document.uploaded_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!("{} documents", documents.len());
}

pub fn print_document(document: &Document) {
    println!("{} {}", "Name:".bold(), document.name);
    println!("{} {}", "ID:".bold(), document.id);
    println!("{} {}", "Type:".bold(), document.doc_type);
    println!("{} {}", "Size:".bold(), format_size(document.size));
    println!("{} {}", "Words:".bold(), document.word_count());
    println!("{} {}", "Status:".bold(), status_label(document.status));
    println!("{} {}", "Added:".bold(), document.uploaded_at.to_rfc3339());
    if let Some(path) = &document.source_path {
        println!("{} {}", "Source:".bold(), path.display());
    }
    println!();
    println!("{}", document.content);
}

fn print_match_line(content: &str, m: &Match) {
    let (before, after) = surroundings(content, m.position, m.end(), SNIPPET_RADIUS);
    let mut line = format!(
        "  {} …{}{}{}…",
        format!("L{}", m.line_number).dimmed(),
        before,
        m.original_text.yellow().bold(),
        after
    );
    if let Some(relevance) = m.relevance {
        line.push_str(&format!(" {}", format!("[{}/10]", relevance).cyan()));
    }
    println!("{}", line);
    if let Some(reason) = &m.reason {
        println!("      {}", reason.dimmed());
    }
}

pub fn print_results(store: &DocumentStore, results: &[SearchResult], query: &str) {
    if results.is_empty() {
        println!("No matches found for \"{}\"", query);
        return;
    }

    for result in results {
        println!(
            "{} ({} matches, {})",
            result.document_name.bold(),
            result.matches.len(),
            result.strategy
        );
        let content = store
            .get(result.document_id)
            .map(|d| d.content.as_str())
            .unwrap_or_default();
        for m in &result.matches {
            print_match_line(content, m);
        }
        println!();
    }

    let total: usize = results.iter().map(|r| r.matches.len()).sum();
    println!(
        "Found {} matches in {} documents",
        total,
        results.len()
    );
}

fn approval_marker(approval: Approval) -> String {
    match approval {
        Approval::Pending => "?".yellow().to_string(),
        Approval::Approved => "✓".green().to_string(),
        Approval::Rejected => "✗".red().to_string(),
    }
}

/// One planned edit: original struck through, replacement highlighted
pub fn print_planned_edit(preview: &ReplacementPreview, m: &Match) {
    let (before, after) = surroundings(
        &preview.original_content,
        m.position,
        m.end(),
        SNIPPET_RADIUS,
    );
    let replacement = m.effective_replacement().unwrap_or(&m.original_text);
    println!(
        "  {} {} …{}{}{}{}…",
        approval_marker(m.approval),
        format!("L{}", m.line_number).dimmed(),
        before,
        format!("[-{}-]", m.original_text).red(),
        format!("{{+{}+}}", replacement).green(),
        after
    );
    if let Some(explanation) = &m.explanation {
        println!("      {}", explanation.dimmed());
    }
}

pub fn print_preview(preview: &ReplacementPreview) {
    println!(
        "{} ({} replacements)",
        preview.document_name.bold(),
        preview.matches.len()
    );
    for m in &preview.matches {
        print_planned_edit(preview, m);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_surroundings_are_char_safe_and_single_line() {
        let content = "über\nline cat straße";
        let start = content.find("cat").unwrap();
        let (before, after) = surroundings(content, start, start + 3, 6);
        assert_eq!(before, "\nline ".replace('\n', " "));
        assert_eq!(after, " straß");
    }
}
