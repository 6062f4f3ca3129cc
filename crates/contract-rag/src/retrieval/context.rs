//! Turns ranked matches into LLM context and citations

use crate::providers::IndexMatch;
use crate::types::{truncate_chars, CharRange, Citation};

/// Separator between consecutive chunk texts in the context
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Context text plus one citation per match, in retrieval order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl AssembledContext {
    /// Nothing was retrieved
    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }
}

/// Context assembler
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    preview_chars: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self { preview_chars: 200 }
    }
}

impl ContextAssembler {
    pub fn new(preview_chars: usize) -> Self {
        Self { preview_chars }
    }

    pub fn assemble(&self, matches: &[IndexMatch]) -> AssembledContext {
        let text = matches
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let citations = matches
            .iter()
            .map(|m| Citation {
                document_id: m.metadata.document_id,
                page: m.metadata.page,
                char_range: CharRange {
                    start: m.metadata.char_start,
                    end: m.metadata.char_end,
                },
                text: truncate_chars(&m.text, self.preview_chars).to_string(),
            })
            .collect();

        AssembledContext { text, citations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChunkMetadata;
    use uuid::Uuid;

    fn hit(text: &str, page: u32, start: usize) -> IndexMatch {
        IndexMatch {
            id: format!("chunk{}", start),
            text: text.to_string(),
            metadata: ChunkMetadata {
                document_id: Uuid::nil(),
                page,
                char_start: start,
                char_end: start + text.chars().count(),
            },
            distance: 0.1,
        }
    }

    #[test]
    fn test_empty_matches_give_empty_context() {
        let assembled = ContextAssembler::default().assemble(&[]);
        assert!(assembled.text.is_empty());
        assert!(assembled.is_empty());
    }

    #[test]
    fn test_order_and_separator_preserved() {
        let assembled = ContextAssembler::default()
            .assemble(&[hit("second page text", 2, 30), hit("first page text", 1, 0)]);

        assert_eq!(assembled.text, "second page text\n\nfirst page text");
        assert_eq!(assembled.citations[0].page, 2);
        assert_eq!(assembled.citations[0].char_range, CharRange { start: 30, end: 46 });
        assert_eq!(assembled.citations[1].page, 1);
    }

    #[test]
    fn test_preview_is_bounded_on_char_boundary() {
        let long = "€".repeat(250);
        let assembled = ContextAssembler::default().assemble(&[hit(&long, 1, 0)]);
        assert_eq!(assembled.citations[0].text.chars().count(), 200);
        assert_eq!(assembled.text.chars().count(), 250);
    }
}
