//! Case-insensitive substring scan

use super::Match;
use crate::document::DocumentId;
use regex::RegexBuilder;

/// Byte spans of every non-overlapping, case-insensitive occurrence of `needle`
pub fn find_spans(content: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }

    match RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern
            .find_iter(content)
            .map(|m| (m.start(), m.end()))
            .collect(),
        Err(e) => {
            tracing::warn!("Cannot scan for {:?}: {}", needle, e);
            Vec::new()
        }
    }
}

/// Snippet of up to `radius` characters either side of `start..end`
pub fn context_window(content: &str, start: usize, end: usize, radius: usize) -> String {
    let from = content[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = content[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(content.len());
    content[from..to].to_string()
}

/// 1-based line number of a byte offset
pub fn line_number_at(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Every occurrence of `query` in `content`, in position order
pub fn literal_scan(
    document_id: DocumentId,
    content: &str,
    query: &str,
    context_radius: usize,
) -> Vec<Match> {
    find_spans(content, query)
        .into_iter()
        .map(|(start, end)| {
            Match::new(
                document_id,
                &content[start..end],
                context_window(content, start, end, context_radius),
                start,
                line_number_at(content, start),
            )
        })
        .collect()
}
