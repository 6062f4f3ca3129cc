//! PDF text extraction with a secondary parser fallback

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

/// Which parser produced the page texts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// `pdf-extract` (layout-aware, primary)
    PdfExtract,
    /// `lopdf` content-stream text (secondary)
    Lopdf,
}

/// Per-page text of one PDF
#[derive(Debug, Clone)]
pub struct ExtractedPages {
    pub pages: Vec<String>,
    pub strategy: ExtractionStrategy,
}

/// Page-by-page PDF text extractor
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    /// Upper bound for the primary parser; some fonts make it spin
    timeout: Duration,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl PdfTextExtractor {
    /// Create an extractor with the given primary-parser timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Extract page texts, falling back to lopdf when pdf-extract fails
    pub fn extract(&self, filename: &str, data: &[u8]) -> Result<ExtractedPages> {
        let primary_error = match self.extract_primary(data) {
            Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => {
                return Ok(ExtractedPages {
                    pages,
                    strategy: ExtractionStrategy::PdfExtract,
                });
            }
            Ok(pages) => {
                // Text-less (often scanned) PDF. Keep these pages unless lopdf does better.
                tracing::debug!("pdf-extract found no text in '{}', trying lopdf", filename);
                match Self::extract_fallback(data) {
                    Ok(fallback) if fallback.iter().any(|p| !p.trim().is_empty()) => {
                        return Ok(ExtractedPages {
                            pages: fallback,
                            strategy: ExtractionStrategy::Lopdf,
                        });
                    }
                    _ => {
                        return Ok(ExtractedPages {
                            pages,
                            strategy: ExtractionStrategy::PdfExtract,
                        });
                    }
                }
            }
            Err(e) => e,
        };

        tracing::warn!(
            "pdf-extract failed for '{}': {}, trying lopdf fallback",
            filename,
            primary_error
        );

        match Self::extract_fallback(data) {
            Ok(pages) => Ok(ExtractedPages {
                pages,
                strategy: ExtractionStrategy::Lopdf,
            }),
            Err(fallback_error) => Err(Error::extraction(
                filename,
                format!("pdf-extract: {}; lopdf: {}", primary_error, fallback_error),
            )),
        }
    }

    /// Run pdf-extract on a helper thread so a hang or panic cannot take the
    /// caller down with it
    fn extract_primary(&self, data: &[u8]) -> std::result::Result<Vec<String>, String> {
        let data = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem_by_pages(&data);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(pages)) => {
                let _ = handle.join();
                if pages.is_empty() {
                    return Err("document has no pages".to_string());
                }
                Ok(pages.iter().map(|p| normalize_page_text(p)).collect())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e.to_string())
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread cannot be killed; it is left to finish on its own.
                Err(format!("timed out after {:?}", self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err("extraction thread panicked".to_string())
            }
        }
    }

    /// Secondary strategy using lopdf's own text extraction, page by page
    fn extract_fallback(data: &[u8]) -> std::result::Result<Vec<String>, String> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| format!("failed to load PDF: {}", e))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err("document has no pages".to_string());
        }

        let pages = page_numbers
            .iter()
            .map(|&number| match doc.extract_text(&[number]) {
                Ok(text) => normalize_page_text(&text),
                Err(e) => {
                    tracing::debug!("lopdf could not extract page {}: {}", number, e);
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }
}

/// Strip NULs, expand ligature glyphs, drop leading blank lines and
/// trailing whitespace
pub fn normalize_page_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\0' => {}
            '\u{00A0}' => out.push(' '),
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            _ => out.push(c),
        }
    }
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);

    let first_line = match out.find(|c: char| !c.is_whitespace()) {
        Some(first) => out[..first].rfind('\n').map_or(0, |newline| newline + 1),
        None => out.len(),
    };
    out.drain(..first_line);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::testing::text_pdf;

    #[test]
    fn test_normalize_page_text() {
        let raw = "Con\u{FB01}dential\0 terms\u{00A0}apply \n\n";
        assert_eq!(normalize_page_text(raw), "Confidential terms apply");
    }

    #[test]
    fn test_normalize_drops_leading_blank_lines_only() {
        assert_eq!(normalize_page_text("\n\n  \n  Indented clause"), "  Indented clause");
        assert_eq!(normalize_page_text(" \n\t"), "");
    }

    #[test]
    fn test_extracts_text_per_page() {
        let pdf = text_pdf(&["Alice agrees to pay Bob $100.", "Governing law is Delaware."]);
        let extracted = PdfTextExtractor::default().extract("msa.pdf", &pdf).unwrap();

        assert_eq!(extracted.pages.len(), 2);
        assert!(extracted.pages[0].contains("Alice agrees to pay Bob"));
        assert!(extracted.pages[1].contains("Governing law is Delaware"));
        assert!(!extracted.pages[0].starts_with('\n'));
    }

    #[test]
    fn test_primary_timeout_falls_back_to_lopdf() {
        let pdf = text_pdf(&["Alice agrees to pay Bob $100.", "Governing law is Delaware."]);
        let extracted = PdfTextExtractor::new(Duration::ZERO)
            .extract("msa.pdf", &pdf)
            .unwrap();

        assert_eq!(extracted.strategy, ExtractionStrategy::Lopdf);
        assert_eq!(extracted.pages.len(), 2);
        assert!(extracted.pages[0].contains("Alice agrees to pay Bob"));
        assert!(extracted.pages[1].contains("Governing law is Delaware"));
    }

    #[test]
    fn test_garbage_bytes_fail_both_strategies() {
        let extractor = PdfTextExtractor::new(Duration::from_secs(5));
        let err = extractor
            .extract("broken.pdf", b"this is not a pdf at all")
            .unwrap_err();
        match err {
            Error::Extraction { filename, message } => {
                assert_eq!(filename, "broken.pdf");
                assert!(message.contains("lopdf"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
