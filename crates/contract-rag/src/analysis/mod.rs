//! Contract field extraction, risk audit and the per-request orchestrator

pub mod analyzer;
pub mod audit;
pub mod extractor;

pub use analyzer::{AnalysisStage, AuditReport, ContractAnalyzer, ExtractionReport};
pub use audit::AuditEngine;
pub use extractor::{ExtractionOutcome, FieldExtractor};

/// Pull the JSON document out of an LLM reply that may wrap it in a
/// markdown code fence
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.trim_start_matches("json").trim_start_matches("JSON");
    body.strip_suffix("```").unwrap_or(body).trim()
}
