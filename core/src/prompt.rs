//! Prompt templates sent to the text-generation delegate

use crate::error::{Error, Result};
use handlebars::Handlebars;
use serde_json::json;

const SEARCH_TEMPLATE_NAME: &str = "semantic_search";
const REPLACE_TEMPLATE_NAME: &str = "contextual_replace";

/// Asks for a scored list of passages matching the query
pub const SEARCH_TEMPLATE: &str = r#"You are helping a user find content inside a document.

Find every passage in the document below that matches the query, either literally or in meaning.

Query: "{{query}}"

Document "{{document_name}}":
"""
{{content}}
"""

Respond with a JSON array only. Each element must be an object with:
- "text": the passage exactly as it appears in the document, copied verbatim
- "context": the sentence around the passage
- "relevance": an integer from 1 to 10 for how well the passage matches the query
- "reason": a short explanation of why it matches

If nothing matches, respond with []."#;

/// Asks for one replacement fitted to the surrounding text
pub const REPLACE_TEMPLATE: &str = r#"You are editing a document. Rewrite the desired replacement so it reads naturally in place of the original text.

Context: "{{context}}"
Original text: "{{original}}"
Desired replacement: "{{replacement}}"
{{#if preserve_structure}}
Keep the sentence structure of the surrounding text intact.
{{/if}}{{#if preserve_tense}}
Match the tense, number and grammatical form of the original text.
{{/if}}
Respond with a JSON object only:
{"replacement": "<text that takes the place of the original text>", "explanation": "<one sentence on what was adjusted>"}"#;

/// Renders the delegate prompts. Output is plain text, so escaping is off.
pub struct PromptRenderer {
    registry: Handlebars<'static>,
}

impl PromptRenderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        registry
            .register_template_string(SEARCH_TEMPLATE_NAME, SEARCH_TEMPLATE)
            .map_err(|e| Error::Prompt {
                message: e.to_string(),
            })?;
        registry
            .register_template_string(REPLACE_TEMPLATE_NAME, REPLACE_TEMPLATE)
            .map_err(|e| Error::Prompt {
                message: e.to_string(),
            })?;
        Ok(Self { registry })
    }

    pub fn semantic_search(&self, query: &str, document_name: &str, content: &str) -> Result<String> {
        self.render(
            SEARCH_TEMPLATE_NAME,
            json!({
                "query": query,
                "document_name": document_name,
                "content": content,
            }),
        )
    }

    pub fn contextual_replacement(
        &self,
        context: &str,
        original: &str,
        replacement: &str,
        preserve_structure: bool,
        preserve_tense: bool,
    ) -> Result<String> {
        self.render(
            REPLACE_TEMPLATE_NAME,
            json!({
                "context": context,
                "original": original,
                "replacement": replacement,
                "preserve_structure": preserve_structure,
                "preserve_tense": preserve_tense,
            }),
        )
    }

    fn render(&self, name: &str, data: serde_json::Value) -> Result<String> {
        self.registry.render(name, &data).map_err(|e| Error::Prompt {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_prompt_embeds_document_verbatim() {
        let renderer = PromptRenderer::new().unwrap();
        let prompt = renderer
            .semantic_search("felines", "pets.txt", "The <cat> & \"dog\" sat.")
            .unwrap();
        assert!(prompt.contains("Query: \"felines\""));
        assert!(prompt.contains("Document \"pets.txt\""));
        assert!(prompt.contains("The <cat> & \"dog\" sat."));
        assert!(prompt.contains("relevance"));
    }

    #[test]
    fn test_replacement_prompt_flags() {
        let renderer = PromptRenderer::new().unwrap();

        let plain = renderer
            .contextual_replacement("the cat sat", "cat", "dog", false, false)
            .unwrap();
        assert!(!plain.contains("sentence structure"));
        assert!(!plain.contains("tense"));

        let both = renderer
            .contextual_replacement("the cats sat", "cats", "dog", true, true)
            .unwrap();
        assert!(both.contains("Keep the sentence structure"));
        assert!(both.contains("Match the tense"));
        assert!(both.contains("Desired replacement: \"dog\""));
        assert!(both.contains("{\"replacement\""));
    }
}
