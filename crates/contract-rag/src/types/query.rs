//! Request types for the HTTP surface

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Question against the ingested corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Natural-language question
    pub question: String,
    /// Restrict retrieval to these documents (all documents when absent)
    #[serde(default)]
    pub document_ids: Option<Vec<Uuid>>,
    /// Override the configured number of retrieved chunks
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Query string of the streaming ask endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AskStreamParams {
    pub question: String,
    /// Comma-separated document ids
    #[serde(default)]
    pub document_ids: Option<String>,
}

impl AskStreamParams {
    /// Parse the comma-separated id list, ignoring malformed entries.
    ///
    /// A blank parameter means no filter. A non-blank one whose ids are all
    /// malformed yields an empty filter, which matches nothing.
    pub fn document_filter(&self) -> Option<Vec<Uuid>> {
        let raw = self.document_ids.as_deref()?;
        if raw.trim().is_empty() {
            return None;
        }
        Some(
            raw.split(',')
                .filter_map(|part| Uuid::parse_str(part.trim()).ok())
                .collect(),
        )
    }
}

/// Request naming a single document (extract, audit)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub document_id: Uuid,
}
