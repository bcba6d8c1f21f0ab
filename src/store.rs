//! Per-subcategory score records, filled manually or from accepted suggestions.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::schema::SubcategoryKey;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;
/// Strengths and gaps are capped at this many items per subcategory.
pub const MAX_LIST_ITEMS: usize = 3;

/// Score, evidence, strengths and gaps for one subcategory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Score from 1-5, or `None` if not yet scored.
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
}

impl ScoreRecord {
    pub fn new(score: u8, evidence: impl Into<String>) -> Self {
        Self {
            score: Some(score),
            evidence: evidence.into(),
            strengths: Vec::new(),
            gaps: Vec::new(),
        }
    }

    pub fn with_strengths(mut self, strengths: Vec<String>) -> Self {
        self.strengths = strengths;
        self
    }

    pub fn with_gaps(mut self, gaps: Vec<String>) -> Self {
        self.gaps = gaps;
        self
    }

    /// Score used for aggregation: absent counts as 0.
    pub fn score_value(&self) -> f64 {
        self.score.map(f64::from).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Score {value} for subcategory {key} is outside 1-5")]
    InvalidScoreValue { key: SubcategoryKey, value: i64 },
}

/// Returns true if `value` is a valid 1-5 score.
pub fn is_valid_score(value: i64) -> bool {
    (i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&value)
}

/// Trim items, drop empty ones and cap the list at [`MAX_LIST_ITEMS`].
pub fn normalize_list(items: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.len() > MAX_LIST_ITEMS {
        debug!(
            "Truncating list of {} items to {}",
            cleaned.len(),
            MAX_LIST_ITEMS
        );
        cleaned.truncate(MAX_LIST_ITEMS);
    }
    cleaned
}

/// Split comma-separated free text into a strengths/gaps list.
pub fn split_list(text: &str) -> Vec<String> {
    normalize_list(text.split(',').map(str::to_string).collect())
}

/// Mapping from subcategory key to its current record.
///
/// Last write wins; keys that were never written read back as an empty record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreStore {
    records: BTreeMap<SubcategoryKey, ScoreRecord>,
}

impl ScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the score only.
    pub fn set_score(&mut self, key: SubcategoryKey, value: u8) -> Result<(), StoreError> {
        if !is_valid_score(i64::from(value)) {
            return Err(StoreError::InvalidScoreValue {
                key,
                value: i64::from(value),
            });
        }
        self.entry(key).score = Some(value);
        Ok(())
    }

    pub fn set_evidence(&mut self, key: SubcategoryKey, text: impl Into<String>) {
        self.entry(key).evidence = text.into();
    }

    pub fn set_strengths(&mut self, key: SubcategoryKey, strengths: Vec<String>) {
        self.entry(key).strengths = normalize_list(strengths);
    }

    pub fn set_gaps(&mut self, key: SubcategoryKey, gaps: Vec<String>) {
        self.entry(key).gaps = normalize_list(gaps);
    }

    /// Replace all four fields at once. Nothing is written if the score is invalid.
    pub fn apply_record(&mut self, key: SubcategoryKey, record: ScoreRecord) -> Result<(), StoreError> {
        if let Some(value) = record.score {
            if !is_valid_score(i64::from(value)) {
                return Err(StoreError::InvalidScoreValue {
                    key,
                    value: i64::from(value),
                });
            }
        }
        let record = ScoreRecord {
            strengths: normalize_list(record.strengths),
            gaps: normalize_list(record.gaps),
            ..record
        };
        self.records.insert(key, record);
        Ok(())
    }

    /// Current record for `key`, or an empty record if it was never set.
    pub fn get_record(&self, key: SubcategoryKey) -> ScoreRecord {
        self.records.get(&key).cloned().unwrap_or_default()
    }

    pub fn score(&self, key: SubcategoryKey) -> Option<u8> {
        self.records.get(&key).and_then(|r| r.score)
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Number of subcategories that carry a score.
    pub fn scored_count(&self) -> usize {
        self.records.values().filter(|r| r.score.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn entry(&mut self, key: SubcategoryKey) -> &mut ScoreRecord {
        self.records.entry(key).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(p: usize, s: usize) -> SubcategoryKey {
        SubcategoryKey::new(p, s)
    }

    #[test]
    fn unset_key_reads_as_empty_record() {
        let store = ScoreStore::new();
        let record = store.get_record(key(0, 0));
        assert_eq!(record, ScoreRecord::default());
        assert_eq!(record.score_value(), 0.0);
    }

    #[test]
    fn set_score_leaves_other_fields() {
        let mut store = ScoreStore::new();
        store.set_evidence(key(0, 1), "Audited accounts for 2023");
        store.set_gaps(key(0, 1), vec!["No monthly close".to_string()]);
        store.set_score(key(0, 1), 4).unwrap();

        let record = store.get_record(key(0, 1));
        assert_eq!(record.score, Some(4));
        assert_eq!(record.evidence, "Audited accounts for 2023");
        assert_eq!(record.gaps, vec!["No monthly close"]);
    }

    #[test]
    fn rejects_out_of_range_scores() {
        let mut store = ScoreStore::new();
        store.set_score(key(1, 0), 3).unwrap();

        assert_eq!(
            store.set_score(key(1, 0), 0),
            Err(StoreError::InvalidScoreValue {
                key: key(1, 0),
                value: 0
            })
        );
        assert!(store.set_score(key(1, 0), 6).is_err());
        assert_eq!(store.score(key(1, 0)), Some(3));
    }

    #[test]
    fn apply_record_overwrites_everything() {
        let mut store = ScoreStore::new();
        store.set_score(key(0, 0), 2).unwrap();
        store.set_strengths(key(0, 0), vec!["Old".to_string()]);

        store
            .apply_record(key(0, 0), ScoreRecord::new(5, "New evidence"))
            .unwrap();

        let record = store.get_record(key(0, 0));
        assert_eq!(record.score, Some(5));
        assert_eq!(record.evidence, "New evidence");
        assert!(record.strengths.is_empty());
    }

    #[test]
    fn apply_record_with_bad_score_is_a_no_op() {
        let mut store = ScoreStore::new();
        store.apply_record(key(0, 0), ScoreRecord::new(3, "kept")).unwrap();

        let result = store.apply_record(key(0, 0), ScoreRecord::new(9, "dropped"));

        assert!(result.is_err());
        assert_eq!(store.get_record(key(0, 0)).evidence, "kept");
    }

    #[test]
    fn lists_are_cleaned_and_capped() {
        let mut store = ScoreStore::new();
        store.set_strengths(
            key(0, 0),
            vec![" a ", "", "b", "c", "d"].into_iter().map(String::from).collect(),
        );
        assert_eq!(store.get_record(key(0, 0)).strengths, vec!["a", "b", "c"]);
    }

    #[test]
    fn split_list_handles_commas() {
        assert_eq!(
            split_list("Need better documentation, , Improve team training "),
            vec!["Need better documentation", "Improve team training"]
        );
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = ScoreStore::new();
        store.set_score(key(0, 0), 4).unwrap();
        store.set_evidence(key(2, 1), "x");
        assert_eq!(store.scored_count(), 1);

        store.reset();

        assert!(store.is_empty());
        assert_eq!(store.scored_count(), 0);
    }
}
