//! Per-request orchestration of text loading, field extraction and audit

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::LocalDocumentStore;
use crate::types::{Document, Finding};

use super::audit::AuditEngine;
use super::extractor::{ExtractionOutcome, FieldExtractor};

/// Progress of one extraction or audit request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Unstarted,
    TextLoaded,
    FieldsExtracted,
    FindingsComputed,
    Done,
}

impl AnalysisStage {
    /// Legal transitions of the stage machine
    pub fn can_advance_to(self, next: AnalysisStage) -> bool {
        use AnalysisStage::*;
        matches!(
            (self, next),
            (Unstarted, TextLoaded)
                | (TextLoaded, FieldsExtracted)
                | (FieldsExtracted, FindingsComputed)
                | (FieldsExtracted, Done)
                | (FindingsComputed, Done)
        )
    }
}

/// Tracks the stage of a single request
struct AnalysisRun {
    document_id: Uuid,
    stage: AnalysisStage,
}

impl AnalysisRun {
    fn new(document_id: Uuid) -> Self {
        Self {
            document_id,
            stage: AnalysisStage::Unstarted,
        }
    }

    fn advance(&mut self, next: AnalysisStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.stage,
            next
        );
        tracing::debug!(
            "Document {}: {:?} -> {:?}",
            self.document_id,
            self.stage,
            next
        );
        self.stage = next;
    }
}

/// Result of a field extraction request
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub document_id: Uuid,
    pub outcome: ExtractionOutcome,
    pub stage: AnalysisStage,
}

/// Result of an audit request
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub document_id: Uuid,
    pub outcome: ExtractionOutcome,
    pub findings: Vec<Finding>,
    pub stage: AnalysisStage,
}

/// Loads documents and runs extraction and audit against them
pub struct ContractAnalyzer {
    store: Arc<LocalDocumentStore>,
    extractor: FieldExtractor,
    auditor: AuditEngine,
}

impl ContractAnalyzer {
    pub fn new(store: Arc<LocalDocumentStore>, extractor: FieldExtractor, auditor: AuditEngine) -> Self {
        Self {
            store,
            extractor,
            auditor,
        }
    }

    async fn load_text(&self, run: &mut AnalysisRun) -> Result<Arc<Document>> {
        let document = self.store.get(run.document_id).await?;
        if document.full_text.trim().is_empty() {
            return Err(Error::not_found(format!(
                "No extracted text for document {}",
                run.document_id
            )));
        }
        run.advance(AnalysisStage::TextLoaded);
        Ok(document)
    }

    /// Extract structured fields for a stored document
    pub async fn extract(&self, document_id: Uuid) -> Result<ExtractionReport> {
        let mut run = AnalysisRun::new(document_id);
        let document = self.load_text(&mut run).await?;

        let outcome = self.extractor.extract(&document.full_text).await;
        run.advance(AnalysisStage::FieldsExtracted);
        run.advance(AnalysisStage::Done);

        tracing::info!(
            "Extracted fields for {} (fallback: {})",
            document_id,
            outcome.is_fallback()
        );

        Ok(ExtractionReport {
            document_id,
            outcome,
            stage: run.stage,
        })
    }

    /// Extract fields, then audit the document for risky clauses
    pub async fn audit(&self, document_id: Uuid) -> Result<AuditReport> {
        let mut run = AnalysisRun::new(document_id);
        let document = self.load_text(&mut run).await?;

        let outcome = self.extractor.extract(&document.full_text).await;
        run.advance(AnalysisStage::FieldsExtracted);

        let mut findings = self
            .auditor
            .audit(&document.full_text, outcome.fields())
            .await;
        resolve_pages(&document, &mut findings);
        run.advance(AnalysisStage::FindingsComputed);
        run.advance(AnalysisStage::Done);

        tracing::info!("Audit of {} produced {} findings", document_id, findings.len());

        Ok(AuditReport {
            document_id,
            outcome,
            findings,
            stage: run.stage,
        })
    }
}

/// Fill `page` for findings that carry a character range
fn resolve_pages(document: &Document, findings: &mut [Finding]) {
    for finding in findings.iter_mut() {
        if let (Some(range), None) = (finding.char_range, finding.page) {
            finding.page = Some(document.page_for_offset(range.start as i64));
        }
    }
}
