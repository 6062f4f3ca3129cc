//! Answer generation and prompts, plus the Ollama client behind the providers

pub mod answer;
pub mod ollama;
pub mod prompt;

pub use answer::QuestionAnswerer;
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted LLM for tests

    use async_trait::async_trait;
    use futures::stream::{self, StreamExt};
    use parking_lot::Mutex;

    use crate::error::{Error, Result};
    use crate::providers::{CompletionOptions, LlmProvider, TextStream};

    /// Returns a fixed reply (or error) and records every prompt it saw
    pub struct ScriptedLlm {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<(String, CompletionOptions)>>,
    }

    impl ScriptedLlm {
        pub fn answering(reply: impl Into<String>) -> Self {
            Self {
                reply: Ok(reply.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: Error) -> Self {
            Self {
                reply: Err(error.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().len()
        }

        pub fn last_user_prompt(&self) -> String {
            self.prompts
                .lock()
                .last()
                .map(|(prompt, _)| prompt.clone())
                .unwrap_or_default()
        }

        pub fn last_options(&self) -> Option<CompletionOptions> {
            self.prompts.lock().last().map(|(_, options)| *options)
        }

        fn record(&self, user: &str, options: CompletionOptions) -> Result<String> {
            self.prompts.lock().push((user.to_string(), options));
            self.reply.clone().map_err(Error::Llm)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn complete(
            &self,
            _system: &str,
            user: &str,
            options: CompletionOptions,
        ) -> Result<String> {
            self.record(user, options)
        }

        async fn complete_stream(
            &self,
            _system: &str,
            user: &str,
            options: CompletionOptions,
        ) -> Result<TextStream> {
            let reply = self.record(user, options)?;
            let words: Vec<Result<String>> = reply
                .split_inclusive(' ')
                .map(|word| Ok(word.to_string()))
                .collect();
            Ok(stream::iter(words).boxed())
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }
}
