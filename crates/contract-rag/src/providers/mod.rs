//! Provider abstractions for embeddings, the LLM and vector storage
//!
//! Services receive these as trait objects, so tests can inject fakes and the
//! binary can wire the Ollama and local implementations.

pub mod embedding;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::{CompletionOptions, LlmProvider, TextStream};
pub use local::LocalVectorIndex;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use vector_store::{ChunkMetadata, IndexEntry, IndexMatch, VectorIndex};
