//! Healing of raw extraction-service output into a [`SuggestionBatch`].
//!
//! The response comes from a language model, so its shape is a best-effort
//! contract. Only a response with no parseable JSON object is an error; every
//! per-subcategory defect is replaced by the default record for that key.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::schema::{Schema, SubcategoryKey};
use crate::store::{is_valid_score, normalize_list, ScoreRecord, MIN_SCORE};
use crate::utils::{excerpt, extract_json_str, strip_code_fences};

use super::{SuggestionBatch, SuggestionError};

/// Evidence used when the service did not cover a subcategory.
pub const DEFAULT_EVIDENCE: &str = "No direct evidence found in the provided text.";
/// Company label used when neither the response nor the caller names one.
pub const PLACEHOLDER_COMPANY: &str = "Company Assessment";
/// Maximum characters of raw response kept in a `MalformedResponse` error.
pub const EXCERPT_CHARS: usize = 500;

const SCORES_FIELD: &str = "subcategoryScoresAndEvidence";
const COMPANY_FIELD: &str = "companyName";

/// Record substituted for missing or invalid subcategories.
pub fn default_record() -> ScoreRecord {
    ScoreRecord::new(MIN_SCORE, DEFAULT_EVIDENCE)
}

/// Turn raw service text into a batch covering every schema key.
///
/// `fallback_name` is the caller's company name, used when the response
/// does not carry a non-empty `companyName`.
pub fn normalize(
    raw: &str,
    schema: &Schema,
    fallback_name: Option<&str>,
) -> Result<SuggestionBatch, SuggestionError> {
    let cleaned = strip_code_fences(raw);
    let json_str = extract_json_str(&cleaned).ok_or_else(|| SuggestionError::MalformedResponse {
        reason: "no JSON object found".to_string(),
        excerpt: excerpt(raw, EXCERPT_CHARS),
    })?;

    let parsed: Value =
        serde_json::from_str(json_str).map_err(|e| SuggestionError::MalformedResponse {
            reason: e.to_string(),
            excerpt: excerpt(raw, EXCERPT_CHARS),
        })?;

    let empty = Map::new();
    let entries = match parsed.get(SCORES_FIELD) {
        Some(Value::Object(map)) => map,
        Some(_) => {
            warn!("'{}' is not an object; defaulting every subcategory", SCORES_FIELD);
            &empty
        }
        None => {
            warn!("Response has no '{}'; defaulting every subcategory", SCORES_FIELD);
            &empty
        }
    };

    for raw_key in entries.keys() {
        let known = raw_key
            .parse::<SubcategoryKey>()
            .map(|k| schema.contains(k))
            .unwrap_or(false);
        if !known {
            debug!("Ignoring suggestion for unknown subcategory '{}'", raw_key);
        }
    }

    let mut per_subcategory = BTreeMap::new();
    let mut defaulted = Vec::new();

    for key in schema.keys() {
        let record = match entries.get(&key.to_string()) {
            Some(entry) => normalize_entry(key, entry),
            None => {
                warn!("No suggestion for subcategory {}; using default", key);
                None
            }
        };
        let record = record.unwrap_or_else(|| {
            defaulted.push(key);
            default_record()
        });
        per_subcategory.insert(key, record);
    }

    Ok(SuggestionBatch {
        company_name: company_name(&parsed, fallback_name),
        per_subcategory,
        defaulted,
    })
}

/// Heal one entry. Returns None if the entry must be replaced by the default.
fn normalize_entry(key: SubcategoryKey, entry: &Value) -> Option<ScoreRecord> {
    let Value::Object(fields) = entry else {
        warn!("Suggestion for {} is not an object; using default", key);
        return None;
    };

    let score = match fields.get("score").and_then(coerce_score) {
        Some(score) => score,
        None => {
            warn!(
                "Suggestion for {} has missing or out-of-range score {:?}; using default",
                key,
                fields.get("score")
            );
            return None;
        }
    };

    Some(ScoreRecord {
        score: Some(score),
        evidence: coerce_text(fields.get("evidence")),
        strengths: coerce_list(key, "strengths", fields.get("strengths")),
        gaps: coerce_list(key, "gaps", fields.get("gaps")),
    })
}

/// Accept integers, integral-looking floats and numeric strings within 1-5.
fn coerce_score(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i as f64,
            None => n.as_f64()?,
        },
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    let rounded = number.round() as i64;
    if is_valid_score(rounded) {
        u8::try_from(rounded).ok()
    } else {
        None
    }
}

fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn coerce_list(key: SubcategoryKey, field: &str, value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => normalize_list(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            warn!("Ignoring malformed {} for {}: {}", field, key, other);
            Vec::new()
        }
    }
}

fn company_name(parsed: &Value, fallback_name: Option<&str>) -> String {
    let from_response = parsed
        .get(COMPANY_FIELD)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let from_caller = fallback_name.map(str::trim).filter(|s| !s.is_empty());

    from_response
        .or(from_caller)
        .unwrap_or(PLACEHOLDER_COMPANY)
        .to_string()
}
