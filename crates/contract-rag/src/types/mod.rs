//! Core types for the contract intelligence service

pub mod contract;
pub mod document;
pub mod query;
pub mod response;

pub use contract::{CharRange, Citation, FieldSet, Finding, LiabilityCap, Party, Severity, Signatory};
pub use document::{char_slice, truncate_chars, Chunk, Document, Page, PageOffsetTable, PAGE_SEPARATOR};
pub use query::{AskRequest, AskStreamParams, DocumentRequest};
pub use response::{AskResponse, AuditResponse, ExtractResponse, IngestError, IngestResponse};
