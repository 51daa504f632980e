//! Offset-based splicing of edits into document content
//!
//! Edits are validated as a set before anything is written, then applied from
//! the highest offset down so that each splice leaves the offsets of the
//! remaining edits untouched.

use crate::error::SpliceError;

/// Replace `len` bytes at `offset` with `replacement`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub len: usize,
    pub replacement: String,
}

impl Edit {
    pub fn new(offset: usize, len: usize, replacement: impl Into<String>) -> Self {
        Self {
            offset,
            len,
            replacement: replacement.into(),
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Check that `expected` still sits at `offset` in `content`
pub fn check_original(content: &str, offset: usize, expected: &str) -> Result<(), SpliceError> {
    match content.get(offset..offset + expected.len()) {
        Some(found) if found == expected => Ok(()),
        _ => Err(SpliceError::Stale {
            offset,
            expected: expected.to_string(),
        }),
    }
}

/// Validate `edits` against `content` and return them in descending offset order
pub fn order_edits<'a>(content: &str, edits: &'a [Edit]) -> Result<Vec<&'a Edit>, SpliceError> {
    for edit in edits {
        let end = edit.end();
        if end > content.len() {
            return Err(SpliceError::OutOfBounds {
                offset: edit.offset,
                end,
                len: content.len(),
            });
        }
        if !content.is_char_boundary(edit.offset) {
            return Err(SpliceError::NotCharBoundary {
                offset: edit.offset,
            });
        }
        if !content.is_char_boundary(end) {
            return Err(SpliceError::NotCharBoundary { offset: end });
        }
    }

    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|edit| edit.offset);

    // Two edits at one offset have no defined order, so they count as overlapping
    for pair in ordered.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if first.end() > second.offset || first.offset == second.offset {
            return Err(SpliceError::Overlap {
                first: first.offset,
                second: second.offset,
            });
        }
    }

    ordered.reverse();
    Ok(ordered)
}

/// Apply every edit to a copy of `content`.
///
/// The input order of `edits` does not matter. On error nothing is applied.
pub fn apply_edits(content: &str, edits: &[Edit]) -> Result<String, SpliceError> {
    let ordered = order_edits(content, edits)?;

    let mut result = content.to_string();
    for edit in ordered {
        result.replace_range(edit.offset..edit.end(), &edit.replacement);
    }
    Ok(result)
}
