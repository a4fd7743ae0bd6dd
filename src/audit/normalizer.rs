//! Maps the loosely structured PageSpeed payload onto [`NormalizedAuditResult`].
//!
//! Upstream has renamed category keys between kebab-case and camelCase over
//! time and drops fields that do not apply to a page. Everything downstream
//! relies on the fixed key set, so every lookup here has a default.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::error::AuditError;
use super::model::{AuditId, AuditMetric, Category, NormalizedAuditResult, NOT_AVAILABLE};

/// Top-level key holding the audit engine result
pub const LIGHTHOUSE_RESULT: &str = "lighthouseResult";

/// Derives a candidate upstream key from a canonical category name
pub type KeyVariant = fn(&str) -> String;

/// Candidate key generators, tried in order; the first key present wins
pub const KEY_VARIANTS: [KeyVariant; 3] = [exact_key, kebab_key, camel_key];

pub fn exact_key(name: &str) -> String {
    name.to_string()
}

pub fn kebab_key(name: &str) -> String {
    name.replace('_', "-")
}

/// `best-practices` -> `bestPractices`
pub fn camel_key(name: &str) -> String {
    name.split(|c: char| c == '-' || c == '_')
        .enumerate()
        .map(|(i, word)| if i == 0 { word.to_string() } else { capitalize(word) })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// A category that could not be found under any key variant
#[derive(Debug, Clone, PartialEq)]
pub struct MissingCategory {
    pub category: Category,
    pub available: Vec<String>,
}

impl fmt::Display for MissingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Category '{}' not found. Available: {}",
            self.category,
            self.available.join(", ")
        )
    }
}

/// Output of [`normalize`]: the result plus the non-fatal notices raised
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    pub result: NormalizedAuditResult,
    pub missing_categories: Vec<MissingCategory>,
    /// Set when a score anomaly forced the all-defaults result
    pub degraded: bool,
}

/// Score-level anomaly. Never leaves this module.
#[derive(Debug, Error)]
enum ScoreError {
    #[error("score of audit '{audit}' is not a number: {value}")]
    NonNumeric { audit: AuditId, value: Value },

    #[error("audit '{0}' is not an object, cannot read its score")]
    MalformedAudit(AuditId),
}

/// Normalizes a raw PageSpeed response.
///
/// Fails only when the top-level structure is unusable: no
/// `lighthouseResult` object, or no `categories` object inside it. Score
/// anomalies degrade to the all-defaults result instead of failing.
pub fn normalize(raw: &Value) -> Result<Normalization, AuditError> {
    let lighthouse = raw
        .get(LIGHTHOUSE_RESULT)
        .and_then(Value::as_object)
        .ok_or_else(|| AuditError::InvalidResponse("No lighthouse results found".to_string()))?;

    let categories = lighthouse
        .get("categories")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            AuditError::InvalidResponse("lighthouse result has no categories".to_string())
        })?;

    let audits = match lighthouse.get("audits") {
        Some(Value::Object(audits)) => Some(audits),
        Some(Value::Null) | None => None,
        Some(other) => {
            debug!("Ignoring non-object audits mapping: {}", other);
            None
        }
    };

    match extract(categories, audits) {
        Ok(normalization) => Ok(normalization),
        Err(e) => {
            warn!("Score error, falling back to default scores: {}", e);
            Ok(Normalization {
                result: NormalizedAuditResult::default(),
                missing_categories: Vec::new(),
                degraded: true,
            })
        }
    }
}

fn extract(
    categories: &Map<String, Value>,
    audits: Option<&Map<String, Value>>,
) -> Result<Normalization, ScoreError> {
    let mut result = NormalizedAuditResult::default();
    let mut missing_categories = Vec::new();

    for category in Category::ALL {
        match find_category(categories, category) {
            Some(entry) => {
                let score = category_score(entry);
                trace!("Category {} -> {}", category, score);
                result.categories.get_mut(category).score = score;
            }
            None => {
                let missing = MissingCategory {
                    category,
                    available: categories.keys().cloned().collect(),
                };
                warn!("{}", missing);
                missing_categories.push(missing);
            }
        }
    }

    if let Some(audits) = audits {
        for audit in AuditId::ALL {
            if let Some(entry) = audits.get(audit.as_str()) {
                *result.audits.get_mut(audit) = audit_metric(audit, entry)?;
            }
        }
    } else {
        debug!("No audits in response, using defaults");
    }

    Ok(Normalization {
        result,
        missing_categories,
        degraded: false,
    })
}

fn find_category(categories: &Map<String, Value>, category: Category) -> Option<&Value> {
    KEY_VARIANTS
        .iter()
        .map(|variant| variant(category.as_str()))
        .find_map(|key| categories.get(&key))
}

/// Null entries, non-objects and non-numeric scores all read as `0`
fn category_score(entry: &Value) -> f64 {
    entry.get("score").and_then(Value::as_f64).unwrap_or(0.0)
}

fn audit_metric(audit: AuditId, entry: &Value) -> Result<AuditMetric, ScoreError> {
    let fields = match entry {
        Value::Null => return Ok(AuditMetric::default()),
        Value::Object(fields) => fields,
        _ => return Err(ScoreError::MalformedAudit(audit)),
    };

    let display_value = match fields.get("displayValue") {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let score = match fields.get("score") {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(other) => {
            return Err(ScoreError::NonNumeric {
                audit,
                value: other.clone(),
            })
        }
    };

    Ok(AuditMetric {
        display_value,
        score,
    })
}
