//! Manual score sheets: a JSON document of per-subcategory records.
//!
//! ```json
//! { "companyName": "Acme", "scores": { "0-0": { "score": 4, "evidence": "...",
//!   "strengths": "Audited, Monthly close", "gaps": ["No CFO"] } } }
//! ```
//!
//! Strengths and gaps may be given as a list or as comma-separated text.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::schema::{Schema, SubcategoryKey};
use crate::store::{is_valid_score, split_list, ScoreRecord, ScoreStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Failed to access score sheet: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid score sheet JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A strengths or gaps field, as list or as comma-separated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    Items(Vec<String>),
    Text(String),
}

impl ListField {
    fn into_items(self) -> Vec<String> {
        match self {
            Self::Items(items) => items,
            Self::Text(text) => split_list(&text),
        }
    }
}

impl Default for ListField {
    fn default() -> Self {
        Self::Items(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetEntry {
    /// Kept wide so out-of-range values can be reported rather than rejected by the parser.
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub strengths: ListField,
    #[serde(default)]
    pub gaps: ListField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSheet {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub scores: BTreeMap<String, SheetEntry>,
}

impl ScoreSheet {
    /// Snapshot of every schema subcategory, scored or not.
    pub fn from_store(company_name: &str, schema: &Schema, store: &ScoreStore) -> Self {
        let scores = schema
            .keys()
            .map(|key| {
                let record = store.get_record(key);
                let entry = SheetEntry {
                    score: record.score.map(i64::from),
                    evidence: record.evidence,
                    strengths: ListField::Items(record.strengths),
                    gaps: ListField::Items(record.gaps),
                };
                (key.to_string(), entry)
            })
            .collect();

        Self {
            company_name: company_name.to_string(),
            scores,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SheetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SheetError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, SheetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SheetError> {
        fs::write(path, self.to_json_string()?)?;
        info!("Wrote score sheet to {}", path.display());
        Ok(())
    }

    /// Write every known entry into `store`.
    ///
    /// All entries are validated before `store` is touched; an out-of-range
    /// score fails the whole sheet. Returns the number of entries applied.
    pub fn apply_to(&self, schema: &Schema, store: &mut ScoreStore) -> Result<usize, SheetError> {
        let mut staged = store.clone();
        let mut applied = 0;

        for (raw_key, entry) in &self.scores {
            let key = match raw_key.parse::<SubcategoryKey>() {
                Ok(key) if schema.contains(key) => key,
                _ => {
                    warn!("Skipping unknown subcategory '{}' in score sheet", raw_key);
                    continue;
                }
            };
            apply_entry(&mut staged, key, entry.clone())?;
            applied += 1;
        }

        *store = staged;
        Ok(applied)
    }
}

fn apply_entry(store: &mut ScoreStore, key: SubcategoryKey, entry: SheetEntry) -> Result<(), StoreError> {
    let score = entry
        .score
        .map(|value| {
            u8::try_from(value)
                .ok()
                .filter(|_| is_valid_score(value))
                .ok_or(StoreError::InvalidScoreValue { key, value })
        })
        .transpose()?;
    store.apply_record(
        key,
        ScoreRecord {
            score,
            evidence: entry.evidence.trim().to_string(),
            strengths: entry.strengths.into_items(),
            gaps: entry.gaps.into_items(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{key, make_store, two_pillar_schema};

    #[test]
    fn applies_lists_and_comma_text() {
        let schema = two_pillar_schema();
        let sheet = ScoreSheet::from_json_str(
            r#"{"companyName": "Acme", "scores": {
                "0-0": {"score": 4, "evidence": " Audited ", "strengths": "Audited, , Monthly close", "gaps": ["No CFO"]},
                "1-0": {"score": 2}
            }}"#,
        )
        .unwrap();
        let mut store = ScoreStore::new();

        let applied = sheet.apply_to(&schema, &mut store).unwrap();

        assert_eq!(applied, 2);
        assert_eq!(sheet.company_name, "Acme");
        assert_eq!(
            store.get_record(key("0-0")),
            ScoreRecord::new(4, "Audited")
                .with_strengths(vec!["Audited".to_string(), "Monthly close".to_string()])
                .with_gaps(vec!["No CFO".to_string()])
        );
        assert_eq!(store.score(key("1-0")), Some(2));
    }

    #[test]
    fn present_entry_replaces_the_whole_record() {
        let schema = two_pillar_schema();
        let mut store = make_store(&[("0-0", 4)]);
        store.set_strengths(key("0-0"), vec!["Audited".to_string()]);
        let sheet = ScoreSheet::from_json_str(
            r#"{"scores": {"0-0": {"score": null, "evidence": "unscored now"}}}"#,
        )
        .unwrap();

        assert_eq!(sheet.apply_to(&schema, &mut store).unwrap(), 1);

        let record = store.get_record(key("0-0"));
        assert_eq!(record.score, None);
        assert_eq!(record.evidence, "unscored now");
        assert!(record.strengths.is_empty());
    }

    #[test]
    fn out_of_range_score_names_key_and_changes_nothing() {
        let schema = two_pillar_schema();
        let sheet = ScoreSheet::from_json_str(
            r#"{"scores": {"0-0": {"score": 3}, "0-1": {"score": 7}}}"#,
        )
        .unwrap();
        let mut store = make_store(&[("1-0", 5)]);
        let before = store.clone();

        let err = sheet.apply_to(&schema, &mut store).unwrap_err();

        assert!(err.to_string().contains("0-1"));
        assert!(matches!(
            err,
            SheetError::Store(StoreError::InvalidScoreValue { value: 7, .. })
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn negative_score_is_rejected() {
        let schema = two_pillar_schema();
        let sheet = ScoreSheet::from_json_str(r#"{"scores": {"0-0": {"score": -2}}}"#).unwrap();
        let result = sheet.apply_to(&schema, &mut ScoreStore::new());
        assert!(matches!(
            result,
            Err(SheetError::Store(StoreError::InvalidScoreValue { value: -2, .. }))
        ));
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let schema = two_pillar_schema();
        let sheet = ScoreSheet::from_json_str(
            r#"{"scores": {"9-9": {"score": 3}, "junk": {"score": 3}, "1-0": {"score": 3}}}"#,
        )
        .unwrap();
        let mut store = ScoreStore::new();

        assert_eq!(sheet.apply_to(&schema, &mut store).unwrap(), 1);
        assert_eq!(store.scored_count(), 1);
    }

    #[test]
    fn export_covers_every_subcategory() {
        let schema = two_pillar_schema();
        let store = make_store(&[("0-1", 4)]);

        let sheet = ScoreSheet::from_store("Acme", &schema, &store);

        assert_eq!(sheet.scores.len(), schema.subcategory_count());
        assert_eq!(sheet.scores["0-1"].score, Some(4));
        assert_eq!(sheet.scores["0-0"].score, None);

        let json = sheet.to_json_string().unwrap();
        assert!(json.contains("\"companyName\": \"Acme\""));
        assert_eq!(ScoreSheet::from_json_str(&json).unwrap(), sheet);
    }

    #[test]
    fn save_and_load_through_filesystem() {
        let schema = two_pillar_schema();
        let mut store = make_store(&[("0-0", 5), ("1-0", 3)]);
        store.set_gaps(key("1-0"), vec!["Hire a COO".to_string()]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.json");

        ScoreSheet::from_store("Acme", &schema, &store).save(&path).unwrap();
        let mut restored = ScoreStore::new();
        ScoreSheet::load(&path).unwrap().apply_to(&schema, &mut restored).unwrap();

        assert_eq!(restored.get_record(key("0-0")), store.get_record(key("0-0")));
        assert_eq!(restored.get_record(key("1-0")).gaps, vec!["Hire a COO"]);
        assert_eq!(restored.score(key("0-1")), None);
    }
}
