//! Response types for the HTTP surface

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::contract::{Citation, FieldSet, Finding};

/// Answer with the citations of the context it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
}

impl AskResponse {
    /// Answer returned when retrieval found nothing
    pub fn no_relevant_information() -> Self {
        Self {
            answer: "No relevant information found in the uploaded documents.".to_string(),
            citations: Vec::new(),
        }
    }
}

/// Result of a multi-file upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Ids of documents whose text was extracted and persisted
    pub document_ids: Vec<Uuid>,
    /// Per-file failures (siblings are unaffected)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<IngestError>,
    pub message: String,
}

/// Failure for one uploaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestError {
    pub filename: String,
    pub error: String,
}

/// Extracted contract fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub document_id: Uuid,
    #[serde(flatten)]
    pub fields: FieldSet,
    /// True when the deterministic keyword extractor was used
    pub fallback_used: bool,
}

/// Audit findings for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResponse {
    pub document_id: Uuid,
    pub findings: Vec<Finding>,
}
