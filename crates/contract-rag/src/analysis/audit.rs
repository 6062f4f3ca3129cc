//! Risk audit: deterministic rule checks followed by an optional LLM pass

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

use crate::generation::prompt::{PromptBuilder, AUDIT_SYSTEM_PROMPT};
use crate::providers::{CompletionOptions, LlmProvider};
use crate::types::{truncate_chars, CharRange, FieldSet, Finding, Severity};

use super::strip_code_fence;

/// Notice periods shorter than this are flagged on auto-renewing contracts
pub const MIN_NOTICE_DAYS: u64 = 30;

const EVIDENCE_NOT_FOUND: &str = "Evidence not found in text";
const BROAD_INDEMNITY_TERMS: [&str; 4] = ["all", "any", "every", "unlimited"];

fn notice_period_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d+)\s*days?\b").expect("Invalid regex"))
}

/// Audit engine
pub struct AuditEngine {
    llm: Option<Arc<dyn LlmProvider>>,
    prompts: PromptBuilder,
    temperature: f32,
}

impl AuditEngine {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, prompts: PromptBuilder, temperature: f32) -> Self {
        Self {
            llm,
            prompts,
            temperature,
        }
    }

    /// Rule findings first, then LLM findings. No deduplication.
    pub async fn audit(&self, document_text: &str, fields: &FieldSet) -> Vec<Finding> {
        let mut findings = rule_findings(document_text, fields);
        tracing::debug!("Rule checks produced {} findings", findings.len());

        if let Some(llm) = &self.llm {
            findings.extend(self.llm_findings(llm.as_ref(), document_text, fields).await);
        }

        findings
    }

    async fn llm_findings(
        &self,
        llm: &dyn LlmProvider,
        document_text: &str,
        fields: &FieldSet,
    ) -> Vec<Finding> {
        let reply = match llm
            .complete(
                AUDIT_SYSTEM_PROMPT,
                &self.prompts.audit_prompt(document_text, fields),
                CompletionOptions::json(self.temperature),
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("LLM audit failed with {}: {}", llm.name(), e);
                return Vec::new();
            }
        };

        let findings = parse_llm_findings(&reply);
        tracing::debug!("LLM audit produced {} findings", findings.len());
        findings
    }
}

/// Run every rule check in order
pub fn rule_findings(document_text: &str, fields: &FieldSet) -> Vec<Finding> {
    [
        check_auto_renewal(document_text, fields),
        check_unlimited_liability(document_text),
        check_missing_liability_cap(fields),
        check_broad_indemnity(fields),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn check_auto_renewal(document_text: &str, fields: &FieldSet) -> Option<Finding> {
    if fields.auto_renewal != Some(true) {
        return None;
    }

    let days = notice_period_pattern()
        .captures_iter(document_text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .find(|&days| days < MIN_NOTICE_DAYS)?;

    Some(Finding::new(
        Severity::High,
        "auto_renewal",
        format!("Auto-renewal with only {} days notice", days),
        find_evidence(document_text, &["auto", "renew"]),
    ))
}

fn check_unlimited_liability(document_text: &str) -> Option<Finding> {
    let lower = document_text.to_lowercase();
    if !(lower.contains("unlimited") && lower.contains("liability")) {
        return None;
    }

    Some(Finding::new(
        Severity::High,
        "liability",
        "Unlimited liability clause detected",
        find_evidence(document_text, &["unlimited", "liability"]),
    ))
}

fn check_missing_liability_cap(fields: &FieldSet) -> Option<Finding> {
    if fields
        .liability_cap
        .as_ref()
        .is_some_and(|cap| cap.is_effective())
    {
        return None;
    }

    Some(Finding::new(
        Severity::Medium,
        "liability",
        "No liability cap specified",
        "Liability cap field is null or zero",
    ))
}

fn check_broad_indemnity(fields: &FieldSet) -> Option<Finding> {
    let indemnity = fields.indemnity.as_deref()?;
    let lower = indemnity.to_lowercase();
    if !BROAD_INDEMNITY_TERMS.iter().any(|term| lower.contains(term)) {
        return None;
    }

    Some(Finding::new(
        Severity::High,
        "indemnity",
        "Broad indemnity clause detected",
        truncate_chars(indemnity, 200),
    ))
}

/// The first line containing every keyword (case-insensitive) with up to two
/// lines either side
fn find_evidence(document_text: &str, keywords: &[&str]) -> String {
    let lines: Vec<&str> = document_text.split('\n').collect();

    lines
        .iter()
        .position(|line| {
            let lower = line.to_lowercase();
            keywords.iter().all(|keyword| lower.contains(keyword))
        })
        .map(|index| {
            let start = index.saturating_sub(2);
            let end = (index + 3).min(lines.len());
            lines[start..end].join("\n")
        })
        .unwrap_or_else(|| EVIDENCE_NOT_FOUND.to_string())
}

#[derive(Deserialize)]
struct RawFinding {
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    evidence: Option<String>,
    #[serde(default)]
    char_range: Option<CharRange>,
}

impl From<RawFinding> for Finding {
    fn from(raw: RawFinding) -> Self {
        Self {
            severity: raw
                .severity
                .as_deref()
                .map(Severity::parse_loose)
                .unwrap_or_default(),
            category: raw
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            description: raw.description.unwrap_or_default(),
            evidence: raw.evidence.unwrap_or_default(),
            char_range: raw.char_range.filter(|range| range.start <= range.end),
            page: None,
        }
    }
}

/// Accepts `{"findings": [...]}` or a bare array; anything else yields no
/// findings. Malformed entries are skipped.
fn parse_llm_findings(reply: &str) -> Vec<Finding> {
    let items = match serde_json::from_str::<Value>(strip_code_fence(reply)) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(mut object)) => match object.remove("findings") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!("Unparseable audit output: {}", e);
            Vec::new()
        }
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawFinding>(item).ok())
        .map(Finding::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::generation::testing::ScriptedLlm;
    use crate::types::LiabilityCap;

    fn capped() -> FieldSet {
        FieldSet {
            liability_cap: Some(LiabilityCap {
                amount: Some(1_000_000.0),
                currency: Some("USD".into()),
            }),
            ..FieldSet::default()
        }
    }

    fn categories(findings: &[Finding]) -> Vec<(&str, Severity)> {
        findings
            .iter()
            .map(|f| (f.category.as_str(), f.severity))
            .collect()
    }

    #[test]
    fn test_short_auto_renewal_notice() {
        let text = "Alice agrees to pay Bob $100.\nThis agreement auto-renews every year with 10 days notice.";
        let fields = FieldSet {
            auto_renewal: Some(true),
            ..capped()
        };

        let findings = rule_findings(text, &fields);
        assert_eq!(categories(&findings), vec![("auto_renewal", Severity::High)]);
        assert_eq!(findings[0].description, "Auto-renewal with only 10 days notice");
        assert_eq!(findings[0].evidence, text);
        assert!(findings[0].char_range.is_none());
    }

    #[test]
    fn test_auto_renewal_needs_flag_and_short_notice() {
        let text = "Renews automatically unless cancelled 60 days before expiry.";
        let flagged = FieldSet {
            auto_renewal: Some(true),
            ..capped()
        };
        assert!(rule_findings(text, &flagged).is_empty());

        let short = "Notice: 5 days. Auto renewal applies.";
        assert!(rule_findings(short, &capped()).is_empty());

        let first_short_wins = "Pay within 45 days. Auto-renew unless 7 days or 3 days notice.";
        let findings = rule_findings(first_short_wins, &flagged);
        assert_eq!(findings[0].description, "Auto-renewal with only 7 days notice");
    }

    #[test]
    fn test_unlimited_liability_any_case() {
        let text = "Section 9.\nThe Supplier accepts UNLIMITED Liability for data loss.\nSection 10.";
        let findings = rule_findings(text, &capped());
        assert_eq!(categories(&findings), vec![("liability", Severity::High)]);
        assert!(findings[0].evidence.contains("UNLIMITED Liability"));

        let apart = "Liability is limited.\nUnlimited refills included.";
        let findings = rule_findings(apart, &capped());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].evidence, "Evidence not found in text");
    }

    #[test]
    fn test_missing_or_zero_liability_cap() {
        let findings = rule_findings("Plain text.", &FieldSet::default());
        assert_eq!(categories(&findings), vec![("liability", Severity::Medium)]);
        assert_eq!(findings[0].evidence, "Liability cap field is null or zero");

        let zero = FieldSet {
            liability_cap: Some(LiabilityCap {
                amount: Some(0.0),
                currency: None,
            }),
            ..FieldSet::default()
        };
        assert_eq!(rule_findings("Plain text.", &zero).len(), 1);
    }

    #[test]
    fn test_broad_indemnity_evidence_is_bounded() {
        let indemnity = format!("Customer shall indemnify for any claims. {}", "x".repeat(300));
        let fields = FieldSet {
            indemnity: Some(indemnity),
            ..capped()
        };

        let findings = rule_findings("Plain text.", &fields);
        assert_eq!(categories(&findings), vec![("indemnity", Severity::High)]);
        assert_eq!(findings[0].evidence.chars().count(), 200);

        let narrow = FieldSet {
            indemnity: Some("Mutual, for third-party IP claims".into()),
            ..capped()
        };
        assert!(rule_findings("Plain text.", &narrow).is_empty());
    }

    #[test]
    fn test_parse_llm_findings_shapes() {
        let wrapped = r#"{"findings": [{"severity": "HIGH", "category": "termination",
            "description": "One-sided termination", "evidence": "may terminate at will",
            "char_range": {"start": 10, "end": 31}}]}"#;
        let findings = parse_llm_findings(wrapped);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].char_range, Some(CharRange { start: 10, end: 31 }));

        let bare = r#"[{"description": "Vague confidentiality"}, 42]"#;
        let findings = parse_llm_findings(bare);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].category, "unknown");

        assert!(parse_llm_findings("not json at all").is_empty());
        assert!(parse_llm_findings(r#"{"risks": []}"#).is_empty());
    }

    #[tokio::test]
    async fn test_llm_findings_follow_rules() {
        let llm = Arc::new(ScriptedLlm::answering(
            r#"[{"severity": "low", "category": "confidentiality", "description": "Short term", "evidence": "2 years"}]"#,
        ));
        let engine = AuditEngine::new(Some(llm), PromptBuilder::default(), 0.1);

        let findings = engine.audit("Plain text.", &FieldSet::default()).await;
        assert_eq!(
            categories(&findings),
            vec![("liability", Severity::Medium), ("confidentiality", Severity::Low)]
        );
    }

    #[tokio::test]
    async fn test_llm_failure_keeps_rule_findings() {
        let llm = Arc::new(ScriptedLlm::failing(Error::llm("connection refused")));
        let engine = AuditEngine::new(Some(llm), PromptBuilder::default(), 0.1);

        let findings = engine.audit("Plain text.", &FieldSet::default()).await;
        assert_eq!(categories(&findings), vec![("liability", Severity::Medium)]);
    }
}
