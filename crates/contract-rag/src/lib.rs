//! contract-rag: contract intelligence over uploaded PDFs
//!
//! Ingests PDF contracts with page and character provenance, indexes them for
//! semantic retrieval, answers questions with citations, extracts structured
//! fields and audits contracts for risky clauses. LLM features degrade to
//! deterministic fallbacks when no model is available.

pub mod analysis;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    contract::{Citation, FieldSet, Finding, Severity},
    document::{Chunk, Document, Page, PageOffsetTable},
    response::AskResponse,
};
