//! Contract fields, audit findings and citations

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Absolute character range in a document's full text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharRange {
    pub start: usize,
    pub end: usize,
}

/// Provenance record linking answer context back to its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Source document
    pub document_id: Uuid,
    /// Page the cited chunk belongs to
    pub page: u32,
    /// Character range of the cited chunk
    pub char_range: CharRange,
    /// Bounded preview of the chunk text
    pub text: String,
}

/// A contracting party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NamedEntry")]
pub struct Party {
    pub name: String,
    pub role: Option<String>,
}

/// A person signing the contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NamedEntry")]
pub struct Signatory {
    pub name: String,
    pub title: Option<String>,
}

/// LLMs return parties and signatories either as bare names or as objects
#[derive(Deserialize)]
#[serde(untagged)]
enum NamedEntry {
    Name(String),
    Entry {
        name: String,
        #[serde(default, alias = "title")]
        role: Option<String>,
    },
}

impl From<NamedEntry> for Party {
    fn from(entry: NamedEntry) -> Self {
        match entry {
            NamedEntry::Name(name) => Self { name, role: None },
            NamedEntry::Entry { name, role } => Self { name, role },
        }
    }
}

impl From<NamedEntry> for Signatory {
    fn from(entry: NamedEntry) -> Self {
        match entry {
            NamedEntry::Name(name) => Self { name, title: None },
            NamedEntry::Entry { name, role } => Self { name, title: role },
        }
    }
}

/// Liability cap as stated in the contract
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LiabilityCap {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub currency: Option<String>,
}

impl LiabilityCap {
    /// A cap with no amount or a zero amount caps nothing
    pub fn is_effective(&self) -> bool {
        matches!(self.amount, Some(amount) if amount > 0.0)
    }
}

/// Structured fields extracted from a contract. Absent fields are `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSet {
    #[serde(deserialize_with = "lenient_list")]
    pub parties: Vec<Party>,
    #[serde(deserialize_with = "lenient_text")]
    pub effective_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub term: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub governing_law: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub payment_terms: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub termination: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub auto_renewal: Option<bool>,
    #[serde(deserialize_with = "lenient_text")]
    pub confidentiality: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub indemnity: Option<String>,
    #[serde(deserialize_with = "lenient_cap")]
    pub liability_cap: Option<LiabilityCap>,
    #[serde(deserialize_with = "lenient_list")]
    pub signatories: Vec<Signatory>,
}

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    /// Parse loosely; anything unrecognised is `Medium`
    pub fn parse_loose(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "high" | "critical" => Self::High,
            "low" | "info" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// A single detected contractual risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: String,
    pub description: String,
    pub evidence: String,
    pub char_range: Option<CharRange>,
    pub page: Option<u32>,
}

impl Finding {
    /// Finding without provenance, as produced by the rule checks
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        description: impl Into<String>,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            description: description.into(),
            evidence: evidence.into(),
            char_range: None,
            page: None,
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse::<f64>().ok()
        }
        _ => None,
    })
}

fn lenient_cap<'de, D>(deserializer: D) -> std::result::Result<Option<LiabilityCap>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
