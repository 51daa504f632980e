//! Best-effort extraction of JSON embedded in generated prose
//!
//! Models wrap their JSON in explanations and code fences. The decoders here
//! take the first `[` (or `{`) through the last `]` (or `}`), refuse fragments
//! above a size bound, and return `None` for anything that does not decode.
//! They never return an error: `None` is the "no structured result" answer.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

static ARRAY_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"));

static OBJECT_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));

fn decode_fragment<T: DeserializeOwned>(
    pattern: &Regex,
    text: &str,
    max_bytes: usize,
) -> Option<T> {
    let fragment = pattern.find(text)?.as_str();
    if fragment.len() > max_bytes {
        tracing::debug!(
            "Ignoring {} byte JSON fragment (limit {})",
            fragment.len(),
            max_bytes
        );
        return None;
    }

    match serde_json::from_str(fragment) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Embedded JSON did not decode: {}", e);
            None
        }
    }
}

/// Decode the first bracketed JSON array in `text`
pub fn extract_json_array<T: DeserializeOwned>(text: &str, max_bytes: usize) -> Option<Vec<T>> {
    decode_fragment(&ARRAY_FRAGMENT, text, max_bytes)
}

/// Decode the first braced JSON object in `text`
pub fn extract_json_object<T: DeserializeOwned>(text: &str, max_bytes: usize) -> Option<T> {
    decode_fragment(&OBJECT_FRAGMENT, text, max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        text: String,
    }

    const LIMIT: usize = 1024;

    #[test]
    fn test_array_inside_prose_and_fences() {
        let reply = "Here you go:\n```json\n[{\"text\": \"cat\"}, {\"text\": \"dog\"}]\n```\nHope it helps.";
        let items: Vec<Item> = extract_json_array(reply, LIMIT).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].text, "dog");
    }

    #[test]
    fn test_empty_array() {
        let items: Vec<Item> = extract_json_array("No matches: []", LIMIT).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_malformed_array_is_none() {
        assert!(extract_json_array::<Item>("[{\"text\": \"cat\",]", LIMIT).is_none());
        assert!(extract_json_array::<Item>("no json at all", LIMIT).is_none());
        assert!(extract_json_array::<Item>("[{\"wrong\": 1}]", LIMIT).is_none());
    }

    #[test]
    fn test_trailing_brackets_break_decode() {
        // The fragment runs to the last bracket, so later bracketed prose spoils it
        let reply = "[{\"text\": \"cat\"}] see [1]";
        assert!(extract_json_array::<Item>(reply, LIMIT).is_none());
    }

    #[test]
    fn test_oversized_fragment_is_none() {
        let reply = format!("[{{\"text\": \"{}\"}}]", "x".repeat(64));
        assert!(extract_json_array::<Item>(&reply, 16).is_none());
        assert!(extract_json_array::<Item>(&reply, LIMIT).is_some());
    }

    #[test]
    fn test_object_extraction() {
        let reply = "Sure! {\"text\": \"kitten\"} is better here.";
        let item: Item = extract_json_object(reply, LIMIT).unwrap();
        assert_eq!(item.text, "kitten");
        assert!(extract_json_object::<Item>("{broken", LIMIT).is_none());
    }
}
