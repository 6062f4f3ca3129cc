//! Fixed-window chunking with page and offset tracking

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, Document};

/// Sliding-window chunker; windows never cross a page boundary
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Window size in characters
    chunk_size: usize,
    /// Overlap between consecutive windows
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker, rejecting parameters with a stride below one
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
        }
        .validate()?;

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Lazily chunk a document in page order, then window order.
    ///
    /// Calling this again restarts from the first page.
    pub fn chunk<'a>(&self, document: &'a Document) -> Chunks<'a> {
        Chunks {
            document,
            chunk_size: self.chunk_size,
            stride: self.chunk_size - self.chunk_overlap,
            page_index: 0,
            window_start: 0,
            char_bounds: Vec::new(),
            bounds_page: None,
        }
    }
}

/// Iterator over the chunks of one document
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    document: &'a Document,
    chunk_size: usize,
    stride: usize,
    page_index: usize,
    window_start: usize,
    /// Byte offset of every char of the current page, plus the text length
    char_bounds: Vec<usize>,
    bounds_page: Option<usize>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        loop {
            let page = self.document.pages.get(self.page_index)?;

            if self.bounds_page != Some(self.page_index) {
                self.char_bounds = page
                    .text
                    .char_indices()
                    .map(|(byte, _)| byte)
                    .chain(std::iter::once(page.text.len()))
                    .collect();
                self.bounds_page = Some(self.page_index);
            }

            let page_chars = self.char_bounds.len() - 1;
            if self.window_start >= page_chars {
                self.page_index += 1;
                self.window_start = 0;
                continue;
            }

            let start = self.window_start;
            let end = (start + self.chunk_size).min(page_chars);
            self.window_start += self.stride;

            let text = &page.text[self.char_bounds[start]..self.char_bounds[end]];
            if text.trim().is_empty() {
                continue;
            }

            let char_start = page.char_start + start;
            let char_end = (page.char_start + end).min(page.char_end);

            return Some(Chunk {
                id: Chunk::make_id(&self.document.id, page.page_number, start),
                document_id: self.document.id,
                page_number: page.page_number,
                text: text.to_string(),
                char_start,
                char_end,
            });
        }
    }
}
