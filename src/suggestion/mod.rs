//! AI-assisted scoring: the request sent to the extraction service and the
//! validated batch of suggestions that comes back.

pub mod normalize;
pub mod prompt;

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::llm::{LlmClient, LlmError};
use crate::schema::{Schema, SubcategoryKey};
use crate::store::ScoreRecord;

pub use normalize::{default_record, normalize, DEFAULT_EVIDENCE, PLACEHOLDER_COMPANY};

/// Subcategory as described to the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryBrief {
    pub name: String,
    pub weight: f64,
    pub keywords: Vec<String>,
}

/// Pillar as described to the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarBrief {
    pub pillar_name: String,
    pub pillar_weight: f64,
    pub subcategories: Vec<SubcategoryBrief>,
}

/// Everything the extraction service needs to score a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub company_text: String,
    pub company_name_hint: String,
    /// Pillars in schema order; positions map to subcategory keys.
    pub schema: Vec<PillarBrief>,
}

impl ExtractionRequest {
    /// Build a request, rejecting blank input text.
    pub fn new(
        company_text: &str,
        company_name_hint: Option<&str>,
        schema: &Schema,
    ) -> Result<Self, SuggestionError> {
        if company_text.trim().is_empty() {
            return Err(SuggestionError::InputRequired);
        }

        let company_name_hint = company_name_hint
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| guess_company_name(company_text))
            .unwrap_or_else(|| PLACEHOLDER_COMPANY.to_string());

        let briefs = schema
            .pillars()
            .iter()
            .map(|pillar| PillarBrief {
                pillar_name: pillar.name.clone(),
                pillar_weight: pillar.weight,
                subcategories: pillar
                    .subcategories
                    .iter()
                    .map(|sub| SubcategoryBrief {
                        name: sub.name.clone(),
                        weight: sub.weight,
                        keywords: sub.keywords.clone(),
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            company_text: company_text.to_string(),
            company_name_hint,
            schema: briefs,
        })
    }
}

/// Validated output of the extraction service.
///
/// Covers every schema key. Kept read-only after seeding the store so the
/// original suggestions can be shown next to the user's edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionBatch {
    pub company_name: String,
    pub per_subcategory: BTreeMap<SubcategoryKey, ScoreRecord>,
    /// Keys whose entry was missing or invalid and got the default record.
    #[serde(default)]
    pub defaulted: Vec<SubcategoryKey>,
}

impl SuggestionBatch {
    pub fn get(&self, key: SubcategoryKey) -> Option<&ScoreRecord> {
        self.per_subcategory.get(&key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("No company text supplied for analysis")]
    InputRequired,
    #[error("Extraction service returned no usable JSON ({reason}). Raw response (partial): {excerpt}")]
    MalformedResponse { reason: String, excerpt: String },
    #[error("Extraction service failed: {0}")]
    Service(#[from] LlmError),
}

/// Sends extraction requests to an LLM and normalizes the answers.
pub struct LlmSuggester {
    client: Arc<dyn LlmClient>,
}

impl LlmSuggester {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Run one extraction request. Issues exactly one call; no retries.
    pub fn suggest(
        &self,
        request: &ExtractionRequest,
        schema: &Schema,
    ) -> Result<SuggestionBatch, SuggestionError> {
        let prompt_text = prompt::build_extraction_prompt(request);
        debug!("Extraction prompt is {} characters", prompt_text.len());

        let response = self.client.complete(&prompt_text)?;
        debug!("Extraction response is {} characters", response.len());

        let batch = normalize(&response, schema, Some(&request.company_name_hint))?;
        info!(
            "Received suggestions for {} subcategories ({} defaulted)",
            batch.per_subcategory.len(),
            batch.defaulted.len()
        );
        Ok(batch)
    }
}

/// Guess a company name from pasted documents.
///
/// Tries, in order: the words after "company" on the same line, a line that
/// starts with a capitalised name ending in Inc/Ltd/LLC/Corp, and the first
/// capitalised run of at least four letters.
pub fn guess_company_name(text: &str) -> Option<String> {
    name_after_company_label(text)
        .or_else(|| name_with_legal_suffix(text))
        .or_else(|| first_capitalized_run(text))
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == ' ' || c == '\t' || c == '&'
}

fn name_after_company_label(text: &str) -> Option<String> {
    const LABEL: &str = "company";
    let lower = text.to_ascii_lowercase();
    lower.match_indices(LABEL).find_map(|(pos, _)| {
        let rest = text[pos + LABEL.len()..]
            .trim_start_matches(|c: char| c == ':' || c == ' ' || c == '\t');
        let name: String = rest.chars().take_while(|c| is_name_char(*c)).collect();
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

fn name_with_legal_suffix(text: &str) -> Option<String> {
    const SUFFIXES: [&str; 4] = ["Inc", "Ltd", "LLC", "Corp"];

    text.lines().find_map(|line| {
        if !line.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }
        let prefix: String = line.chars().take_while(|c| is_name_char(*c)).collect();
        let end = SUFFIXES
            .iter()
            .filter_map(|suffix| prefix.rfind(suffix).map(|i| i + suffix.len()))
            .filter(|end| *end > 5)
            .max()?;
        Some(prefix[..end].trim().to_string())
    })
}

fn first_capitalized_run(text: &str) -> Option<String> {
    for (i, c) in text.char_indices() {
        if !c.is_ascii_uppercase() {
            continue;
        }
        let run: String = text[i + 1..].chars().take_while(|c| is_name_char(*c)).collect();
        if run.chars().count() >= 3 {
            let name = format!("{}{}", c, run);
            return Some(name.trim().to_string());
        }
    }
    None
}
