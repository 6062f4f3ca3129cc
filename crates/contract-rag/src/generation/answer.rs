//! Retrieval-augmented question answering with citations

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::providers::{CompletionOptions, LlmProvider, TextStream};
use crate::retrieval::{AssembledContext, ContextAssembler, Retriever};
use crate::types::AskResponse;

use super::prompt::{PromptBuilder, ANSWER_SYSTEM_PROMPT};

/// Answer returned when the LLM is unconfigured
pub const LLM_NOT_CONFIGURED: &str = "LLM service not configured.";

/// Single streamed fragment for an empty retrieval
pub const NO_RELEVANT_INFORMATION_FRAGMENT: &str = "No relevant information found.";

/// Retriever, context assembler and LLM wired together
pub struct QuestionAnswerer {
    retriever: Arc<Retriever>,
    assembler: ContextAssembler,
    prompts: PromptBuilder,
    llm: Option<Arc<dyn LlmProvider>>,
    top_k: usize,
    temperature: f32,
}

impl QuestionAnswerer {
    pub fn new(
        retriever: Arc<Retriever>,
        assembler: ContextAssembler,
        prompts: PromptBuilder,
        llm: Option<Arc<dyn LlmProvider>>,
        top_k: usize,
        temperature: f32,
    ) -> Self {
        Self {
            retriever,
            assembler,
            prompts,
            llm,
            top_k,
            temperature,
        }
    }

    async fn retrieve(
        &self,
        question: &str,
        document_ids: Option<&[Uuid]>,
        top_k: Option<usize>,
    ) -> Result<AssembledContext> {
        let matches = self
            .retriever
            .search(question, document_ids, top_k.unwrap_or(self.top_k))
            .await?;
        Ok(self.assembler.assemble(&matches))
    }

    /// Answer a question with citations to the chunks it was grounded on
    pub async fn ask(
        &self,
        question: &str,
        document_ids: Option<&[Uuid]>,
        top_k: Option<usize>,
    ) -> Result<AskResponse> {
        let context = self.retrieve(question, document_ids, top_k).await?;

        if context.is_empty() {
            tracing::info!("No relevant chunks for question");
            return Ok(AskResponse::no_relevant_information());
        }

        let Some(llm) = &self.llm else {
            return Ok(AskResponse {
                answer: LLM_NOT_CONFIGURED.to_string(),
                citations: context.citations,
            });
        };

        let prompt = self.prompts.answer_prompt(question, &context.text);
        let answer = match llm
            .complete(
                ANSWER_SYSTEM_PROMPT,
                &prompt,
                CompletionOptions::text(self.temperature),
            )
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Answer generation failed with {}: {}", llm.name(), e);
                format!("Error generating answer: {}", e)
            }
        };

        Ok(AskResponse {
            answer,
            citations: context.citations,
        })
    }

    /// Stream an answer fragment by fragment.
    ///
    /// LLM errors are delivered as a final `Error: ...` fragment so that an
    /// already-open stream can report them.
    pub async fn ask_stream(
        &self,
        question: &str,
        document_ids: Option<&[Uuid]>,
    ) -> Result<TextStream> {
        let context = self.retrieve(question, document_ids, None).await?;

        if context.is_empty() {
            return Ok(single(NO_RELEVANT_INFORMATION_FRAGMENT.to_string()));
        }

        let Some(llm) = &self.llm else {
            return Ok(single(LLM_NOT_CONFIGURED.to_string()));
        };

        let prompt = self.prompts.answer_prompt(question, &context.text);
        match llm
            .complete_stream(
                ANSWER_SYSTEM_PROMPT,
                &prompt,
                CompletionOptions::text(self.temperature),
            )
            .await
        {
            Ok(fragments) => Ok(fragments
                .map(|fragment| Ok(fragment.unwrap_or_else(|e| format!("Error: {}", e))))
                .boxed()),
            Err(e) => {
                tracing::warn!("Answer stream failed with {}: {}", llm.name(), e);
                Ok(single(format!("Error: {}", e)))
            }
        }
    }
}

fn single(fragment: String) -> TextStream {
    stream::once(async move { Ok(fragment) }).boxed()
}
