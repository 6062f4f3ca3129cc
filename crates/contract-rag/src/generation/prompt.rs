//! Prompt templates for answers, field extraction and audits

use crate::types::{truncate_chars, FieldSet};

/// System prompt for grounded question answering
pub const ANSWER_SYSTEM_PROMPT: &str =
    "You are a contract analysis assistant. Answer questions based only on the provided contract text.";

/// System prompt for structured field extraction
pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a contract analysis expert. Extract structured information from contracts and return only valid JSON.";

/// System prompt for the risk audit
pub const AUDIT_SYSTEM_PROMPT: &str =
    "You are a contract risk analyst. Identify risky clauses and return JSON.";

/// Prompt builder for contract tasks
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    /// Contract text is cut to this many characters
    max_document_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            max_document_chars: 8000,
        }
    }
}

impl PromptBuilder {
    pub fn new(max_document_chars: usize) -> Self {
        Self { max_document_chars }
    }

    /// Question answering over retrieved context
    pub fn answer_prompt(&self, question: &str, context: &str) -> String {
        format!(
            r#"Answer the following question based only on the provided contract context. If the answer cannot be found in the context, say so.

Context:
{context}

Question: {question}

Answer:"#,
            context = context,
            question = question
        )
    }

    /// Structured field extraction
    pub fn extraction_prompt(&self, document_text: &str) -> String {
        format!(
            r#"Extract the following structured information from this contract text. Return a JSON object with these fields:
- parties: array of objects with "name" and "role" (e.g., "Buyer", "Seller", "Licensor", "Licensee")
- effective_date: string date
- term: string describing the contract term/duration
- governing_law: string describing governing law/jurisdiction
- payment_terms: string describing payment terms
- termination: string describing termination conditions
- auto_renewal: boolean indicating if contract auto-renews
- confidentiality: string describing confidentiality obligations
- indemnity: string describing indemnity provisions
- liability_cap: object with "amount" (number) and "currency" (string) if there's a liability cap, null otherwise
- signatories: array of objects with "name" and "title"

Contract text:
{text}

Return only valid JSON, no markdown formatting."#,
            text = truncate_chars(document_text, self.max_document_chars)
        )
    }

    /// LLM-assisted risk audit
    pub fn audit_prompt(&self, document_text: &str, fields: &FieldSet) -> String {
        let fields_json =
            serde_json::to_string_pretty(fields).unwrap_or_else(|_| "{}".to_string());

        format!(
            r#"Analyze this contract for risky clauses. Check for:
1. Auto-renewal with less than 30 days notice
2. Unlimited liability
3. Broad indemnity clauses
4. Unfavorable termination terms
5. Missing confidentiality protections

Contract text (first {limit} chars):
{text}

Extracted fields:
{fields}

Return a JSON object {{"findings": [...]}} where each finding has:
- severity: "high", "medium", or "low"
- category: string describing the category
- description: string describing the issue
- evidence: string with relevant text excerpt
- char_range: optional object with "start" and "end" character offsets of the evidence

Return only valid JSON."#,
            limit = self.max_document_chars,
            text = truncate_chars(document_text, self.max_document_chars),
            fields = fields_json
        )
    }
}
