//! Indexing, retrieval and context assembly

pub mod context;
pub mod indexer;
pub mod search;

pub use context::{AssembledContext, ContextAssembler};
pub use indexer::Indexer;
pub use search::Retriever;
