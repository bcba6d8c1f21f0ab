//! Pillar and subcategory definitions for the readiness framework.
//!
//! The schema is the single source of truth for keys, labels, weights and the
//! keyword hints handed to the extraction service. It is built once at startup,
//! validated, and then shared read-only.

pub mod pillars;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tolerance used when checking that weights sum to 1.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// A weighted, individually scored item within a pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryDefinition {
    pub key: String,
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl SubcategoryDefinition {
    pub fn new(key: impl Into<String>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            weight,
            keywords: Vec::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }
}

/// A top-level weighted assessment category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarDefinition {
    pub key: String,
    pub name: String,
    pub weight: f64,
    pub subcategories: Vec<SubcategoryDefinition>,
}

impl PillarDefinition {
    pub fn new(key: impl Into<String>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            weight,
            subcategories: Vec::new(),
        }
    }

    pub fn with_subcategories(mut self, subcategories: Vec<SubcategoryDefinition>) -> Self {
        self.subcategories = subcategories;
        self
    }

    /// Sum of the declared subcategory weights.
    pub fn subcategory_weight_total(&self) -> f64 {
        self.subcategories.iter().map(|s| s.weight).sum()
    }
}

/// Position of a subcategory in the schema, serialized as `"pillar-sub"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SubcategoryKey {
    pub pillar: usize,
    pub sub: usize,
}

impl SubcategoryKey {
    pub fn new(pillar: usize, sub: usize) -> Self {
        Self { pillar, sub }
    }
}

impl fmt::Display for SubcategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.pillar, self.sub)
    }
}

impl FromStr for SubcategoryKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pillar, sub) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid subcategory key: '{}'", s))?;
        let pillar = pillar
            .parse()
            .map_err(|_| format!("Invalid pillar index in key '{}'", s))?;
        let sub = sub
            .parse()
            .map_err(|_| format!("Invalid subcategory index in key '{}'", s))?;
        Ok(Self { pillar, sub })
    }
}

impl From<SubcategoryKey> for String {
    fn from(key: SubcategoryKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for SubcategoryKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Schema violations. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Schema defines no pillars")]
    NoPillars,
    #[error("Pillar '{0}' defines no subcategories")]
    EmptyPillar(String),
    #[error("Weight {weight} of '{item}' must be a finite value in 0..=1")]
    WeightOutOfRange { item: String, weight: f64 },
    #[error("Subcategory weights of pillar '{pillar}' sum to {sum}, expected 1")]
    SubcategoryWeightSum { pillar: String, sum: f64 },
    #[error("Pillar weights sum to {0}, expected 1")]
    PillarWeightSum(f64),
    #[error("Duplicate key '{0}' in schema")]
    DuplicateKey(String),
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The validated, immutable set of pillars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pillars: Vec<PillarDefinition>,
}

impl Schema {
    /// Build a schema, rejecting it if the weight invariants do not hold.
    pub fn new(pillars: Vec<PillarDefinition>) -> Result<Self, ConfigurationError> {
        let schema = Self { pillars };
        schema.validate()?;
        Ok(schema)
    }

    /// The built-in five-pillar readiness framework.
    pub fn builtin() -> Result<Self, ConfigurationError> {
        Self::new(pillars::all())
    }

    /// Parse a schema from a JSON array of pillar definitions.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let pillars: Vec<PillarDefinition> = serde_json::from_str(json)?;
        Self::new(pillars)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigurationError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn pillars(&self) -> &[PillarDefinition] {
        &self.pillars
    }

    /// Every subcategory key, in pillar then subcategory order.
    pub fn keys(&self) -> impl Iterator<Item = SubcategoryKey> + '_ {
        self.pillars.iter().enumerate().flat_map(|(p, pillar)| {
            (0..pillar.subcategories.len()).map(move |s| SubcategoryKey::new(p, s))
        })
    }

    pub fn subcategory_count(&self) -> usize {
        self.pillars.iter().map(|p| p.subcategories.len()).sum()
    }

    pub fn contains(&self, key: SubcategoryKey) -> bool {
        self.lookup(key).is_some()
    }

    /// Resolve a key to its pillar and subcategory definitions.
    pub fn lookup(&self, key: SubcategoryKey) -> Option<(&PillarDefinition, &SubcategoryDefinition)> {
        let pillar = self.pillars.get(key.pillar)?;
        let sub = pillar.subcategories.get(key.sub)?;
        Some((pillar, sub))
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.pillars.is_empty() {
            return Err(ConfigurationError::NoPillars);
        }

        let mut seen = HashSet::new();
        for pillar in &self.pillars {
            if !seen.insert(pillar.key.as_str()) {
                return Err(ConfigurationError::DuplicateKey(pillar.key.clone()));
            }
            check_weight(&pillar.name, pillar.weight)?;

            if pillar.subcategories.is_empty() {
                return Err(ConfigurationError::EmptyPillar(pillar.name.clone()));
            }

            let mut sub_seen = HashSet::new();
            for sub in &pillar.subcategories {
                if !sub_seen.insert(sub.key.as_str()) {
                    return Err(ConfigurationError::DuplicateKey(format!(
                        "{}.{}",
                        pillar.key, sub.key
                    )));
                }
                check_weight(&format!("{} - {}", pillar.name, sub.name), sub.weight)?;
            }

            let sum = pillar.subcategory_weight_total();
            if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(ConfigurationError::SubcategoryWeightSum {
                    pillar: pillar.name.clone(),
                    sum,
                });
            }
        }

        let total: f64 = self.pillars.iter().map(|p| p.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigurationError::PillarWeightSum(total));
        }

        Ok(())
    }
}

fn check_weight(item: &str, weight: f64) -> Result<(), ConfigurationError> {
    if weight.is_finite() && (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(ConfigurationError::WeightOutOfRange {
            item: item.to_string(),
            weight,
        })
    }
}
