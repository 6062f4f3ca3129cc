//! Structured field extraction with a deterministic keyword fallback

use std::sync::Arc;

use crate::generation::prompt::{PromptBuilder, EXTRACTION_SYSTEM_PROMPT};
use crate::providers::{CompletionOptions, LlmProvider};
use crate::types::FieldSet;

use super::strip_code_fence;

/// Which path produced a `FieldSet`
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// Parsed from the LLM reply
    Llm(FieldSet),
    /// Keyword extractor used because the LLM was unavailable or unparseable
    Fallback(FieldSet),
}

impl ExtractionOutcome {
    pub fn fields(&self) -> &FieldSet {
        match self {
            Self::Llm(fields) | Self::Fallback(fields) => fields,
        }
    }

    pub fn into_fields(self) -> FieldSet {
        match self {
            Self::Llm(fields) | Self::Fallback(fields) => fields,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Field extractor
pub struct FieldExtractor {
    llm: Option<Arc<dyn LlmProvider>>,
    prompts: PromptBuilder,
    temperature: f32,
}

impl FieldExtractor {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, prompts: PromptBuilder, temperature: f32) -> Self {
        Self {
            llm,
            prompts,
            temperature,
        }
    }

    /// Extract fields from contract text. Never fails.
    pub async fn extract(&self, document_text: &str) -> ExtractionOutcome {
        let Some(llm) = &self.llm else {
            tracing::debug!("No LLM configured, using keyword extraction");
            return ExtractionOutcome::Fallback(keyword_fields(document_text));
        };

        let reply = match llm
            .complete(
                EXTRACTION_SYSTEM_PROMPT,
                &self.prompts.extraction_prompt(document_text),
                CompletionOptions::json(self.temperature),
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("LLM extraction failed with {}: {}", llm.name(), e);
                return ExtractionOutcome::Fallback(keyword_fields(document_text));
            }
        };

        match serde_json::from_str::<FieldSet>(strip_code_fence(&reply)) {
            Ok(fields) => ExtractionOutcome::Llm(fields),
            Err(e) => {
                tracing::warn!("Unparseable extraction output from {}: {}", llm.name(), e);
                ExtractionOutcome::Fallback(keyword_fields(document_text))
            }
        }
    }
}

/// Keyword extractor: only `auto_renewal`, set when "auto" and "renew" both
/// occur in the text
pub fn keyword_fields(document_text: &str) -> FieldSet {
    let lower = document_text.to_lowercase();
    FieldSet {
        auto_renewal: (lower.contains("auto") && lower.contains("renew")).then_some(true),
        ..FieldSet::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::generation::testing::ScriptedLlm;

    const TEXT: &str = "This agreement AUTO-RENEWS every year with 10 days notice.";

    #[tokio::test]
    async fn test_no_llm_uses_keywords() {
        let extractor = FieldExtractor::new(None, PromptBuilder::default(), 0.1);
        let outcome = extractor.extract(TEXT).await;

        assert!(outcome.is_fallback());
        let fields = outcome.into_fields();
        assert_eq!(fields.auto_renewal, Some(true));
        assert!(fields.parties.is_empty());
        assert!(fields.liability_cap.is_none());
    }

    #[tokio::test]
    async fn test_llm_json_is_parsed() {
        let llm = Arc::new(ScriptedLlm::answering(
            r#"{"parties": [{"name": "Alice", "role": "Buyer"}], "auto_renewal": false,
                "liability_cap": {"amount": 50000, "currency": "USD"}}"#,
        ));
        let extractor = FieldExtractor::new(Some(llm.clone()), PromptBuilder::default(), 0.1);
        let outcome = extractor.extract(TEXT).await;

        assert!(!outcome.is_fallback());
        assert_eq!(outcome.fields().parties[0].name, "Alice");
        assert_eq!(outcome.fields().auto_renewal, Some(false));
        assert!(llm.last_options().unwrap().json_mode);
    }

    #[tokio::test]
    async fn test_bad_llm_output_falls_back() {
        let garbage = FieldExtractor::new(
            Some(Arc::new(ScriptedLlm::answering("I could not find any fields, sorry"))),
            PromptBuilder::default(),
            0.1,
        );
        assert!(garbage.extract(TEXT).await.is_fallback());

        let failing = FieldExtractor::new(
            Some(Arc::new(ScriptedLlm::failing(Error::llm("timeout")))),
            PromptBuilder::default(),
            0.1,
        );
        let outcome = failing.extract(TEXT).await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.fields().auto_renewal, Some(true));
    }

    #[test]
    fn test_keyword_fields_without_renewal() {
        assert_eq!(keyword_fields("Alice agrees to pay Bob $100.").auto_renewal, None);
    }
}
