//! Document ingestion: PDF text extraction, chunking and the batch pipeline

mod chunker;
mod parser;
mod processor;

pub use chunker::{Chunks, TextChunker};
pub use parser::{normalize_page_text, ExtractedPages, ExtractionStrategy, PdfTextExtractor};
pub use processor::{IngestPipeline, IngestReport};
