//! Document, page and chunk types with character provenance
//!
//! All offsets in this module count Unicode scalar values (`char`s), not
//! bytes, so they stay meaningful for non-ASCII contract text.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator placed between consecutive pages in `Document::full_text`
pub const PAGE_SEPARATOR: char = '\n';

/// One extracted page of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Extracted text (may be empty)
    pub text: String,
    /// Absolute start offset in the owning document's full text
    pub char_start: usize,
    /// Absolute end offset (exclusive)
    pub char_end: usize,
}

impl Page {
    /// Length of the page text in characters
    pub fn len_chars(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// Ordered page start offsets, parallel to page number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageOffsetTable {
    starts: Vec<usize>,
}

impl PageOffsetTable {
    /// Build the table from pages (must be in page order)
    pub fn from_pages(pages: &[Page]) -> Self {
        Self {
            starts: pages.iter().map(|p| p.char_start).collect(),
        }
    }

    /// Page start offsets
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// Number of pages described by the table
    pub fn page_count(&self) -> usize {
        self.starts.len()
    }

    /// Map an absolute character position to a 1-based page number.
    ///
    /// Out-of-range positions clamp to the first or last page. An empty table
    /// resolves everything to page 1.
    pub fn page_for_offset(&self, char_pos: i64) -> u32 {
        if self.starts.is_empty() || char_pos < 0 {
            return 1;
        }
        let pos = char_pos as usize;
        let preceding = self.starts.partition_point(|&start| start <= pos);
        preceding.max(1) as u32
    }
}

/// A parsed contract with its full text and page layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// Page texts joined with `PAGE_SEPARATOR`
    pub full_text: String,
    /// Pages in order
    pub pages: Vec<Page>,
    /// Start offset of every page
    pub page_offsets: PageOffsetTable,
    /// Length of `full_text` in characters
    pub total_chars: usize,
    /// Extraction timestamp
    pub extracted_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Lay out page texts into a document, computing absolute offsets
    pub fn from_pages(id: Uuid, filename: impl Into<String>, page_texts: Vec<String>) -> Self {
        let mut pages = Vec::with_capacity(page_texts.len());
        let mut full_text = String::new();
        let mut offset = 0usize;

        for (index, text) in page_texts.into_iter().enumerate() {
            if index > 0 {
                full_text.push(PAGE_SEPARATOR);
                offset += 1;
            }
            let len = text.chars().count();
            full_text.push_str(&text);
            pages.push(Page {
                page_number: index as u32 + 1,
                text,
                char_start: offset,
                char_end: offset + len,
            });
            offset += len;
        }

        let page_offsets = PageOffsetTable::from_pages(&pages);

        Self {
            id,
            filename: filename.into(),
            full_text,
            pages,
            page_offsets,
            total_chars: offset,
            extracted_at: chrono::Utc::now(),
        }
    }

    /// Page number containing `char_pos`, clamped to the valid page range
    pub fn page_for_offset(&self, char_pos: i64) -> u32 {
        self.page_offsets.page_for_offset(char_pos)
    }

    /// Look up a page by its 1-based number
    pub fn page(&self, page_number: u32) -> Option<&Page> {
        page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
    }

    /// Text between two absolute character offsets
    pub fn text_range(&self, char_start: usize, char_end: usize) -> &str {
        char_slice(&self.full_text, char_start, char_end)
    }
}

/// A span of one page, the unit that is embedded and searched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic id: document, page and window start
    pub id: String,
    /// Owning document
    pub document_id: Uuid,
    /// Page the chunk was cut from
    pub page_number: u32,
    /// Chunk text
    pub text: String,
    /// Absolute start offset in the document's full text
    pub char_start: usize,
    /// Absolute end offset (exclusive)
    pub char_end: usize,
}

impl Chunk {
    /// Stable id so that re-indexing the same document overwrites its chunks
    pub fn make_id(document_id: &Uuid, page_number: u32, window_start: usize) -> String {
        format!("{}_page{}_chunk{}", document_id, page_number, window_start)
    }
}

/// Slice `text` by character offsets; out-of-range bounds are clamped
pub fn char_slice(text: &str, char_start: usize, char_end: usize) -> &str {
    if char_start >= char_end {
        return "";
    }
    let start = byte_offset(text, char_start);
    let end = byte_offset(text, char_end);
    &text[start..end]
}

/// First `max_chars` characters of `text`, never splitting a character
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    &text[..byte_offset(text, max_chars)]
}

fn byte_offset(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_pages(
            Uuid::new_v4(),
            "contract.pdf",
            vec![
                "Alice agrees to pay Bob $100.".to_string(),
                String::new(),
                "This agreement auto-renews every year with 10 days notice.".to_string(),
            ],
        )
    }

    #[test]
    fn test_pages_partition_full_text() {
        let doc = sample();
        let page_chars: usize = doc.pages.iter().map(|p| p.text.chars().count()).sum();
        assert_eq!(page_chars + doc.pages.len() - 1, doc.full_text.chars().count());
        assert_eq!(doc.total_chars, doc.full_text.chars().count());

        for pair in doc.pages.windows(2) {
            assert_eq!(pair[0].char_end + 1, pair[1].char_start);
        }
        for page in &doc.pages {
            assert_eq!(doc.text_range(page.char_start, page.char_end), page.text);
        }
    }

    #[test]
    fn test_page_for_offset_clamps() {
        let doc = sample();
        assert_eq!(doc.page_for_offset(-5), 1);
        assert_eq!(doc.page_for_offset(0), 1);
        assert_eq!(doc.page_for_offset(doc.total_chars as i64 + 100), 3);
        assert_eq!(doc.page_for_offset(doc.pages[2].char_start as i64), 3);
    }

    #[test]
    fn test_page_for_offset_is_monotonic() {
        let doc = sample();
        let mut last = 0;
        for pos in -3..(doc.total_chars as i64 + 3) {
            let page = doc.page_for_offset(pos);
            assert!(page >= last, "page went backwards at {}", pos);
            last = page;
        }
    }

    #[test]
    fn test_empty_table_resolves_to_first_page() {
        let table = PageOffsetTable::default();
        assert_eq!(table.page_for_offset(42), 1);
    }

    #[test]
    fn test_multibyte_offsets() {
        let doc = Document::from_pages(
            Uuid::new_v4(),
            "vertrag.pdf",
            vec!["Größe €5".to_string(), "Seite zwei".to_string()],
        );
        assert_eq!(doc.pages[0].char_end, 8);
        assert_eq!(doc.pages[1].char_start, 9);
        assert_eq!(doc.text_range(6, 8), "€5");
        assert_eq!(truncate_chars("€€€", 2), "€€");
    }

    #[test]
    fn test_document_serde_round_trip_keeps_offsets() {
        let doc = sample();
        let json = serde_json::to_string(&doc).unwrap();
        let restored: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.pages, doc.pages);
        assert_eq!(restored.page_offsets, doc.page_offsets);
        assert_eq!(restored.total_chars, doc.total_chars);
    }
}
