//! Weighted score aggregation and readiness tiers.
//!
//! Everything here is a pure function of the schema and a store snapshot.
//! Unscored subcategories contribute 0 but keep their weight in the
//! denominator, so they pull the pillar average down.

use serde::{Deserialize, Serialize};

use crate::schema::{PillarDefinition, Schema, SubcategoryKey};
use crate::store::{ScoreStore, MAX_SCORE};

/// Lowest overall score classified as investment ready.
pub const INVESTMENT_READY_THRESHOLD: f64 = 4.0;
/// Lowest overall score classified as near ready.
pub const NEAR_READY_THRESHOLD: f64 = 3.0;

/// Overall scores are rounded to this many steps per point before classification.
const OVERALL_PRECISION: f64 = 1e9;

/// Readiness classification of an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    TooEarly,
    NearReady,
    InvestmentReady,
}

impl Tier {
    /// All tiers from best to worst.
    pub fn all() -> &'static [Tier] {
        &[Tier::InvestmentReady, Tier::NearReady, Tier::TooEarly]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TooEarly => "Too Early",
            Self::NearReady => "Near Ready",
            Self::InvestmentReady => "Investment Ready",
        }
    }

    /// Score band covered by this tier, for display.
    pub fn band(&self) -> &'static str {
        match self {
            Self::TooEarly => "<3.0",
            Self::NearReady => "3.0-3.99",
            Self::InvestmentReady => "4.0-5.0",
        }
    }

    /// What a company in this tier typically looks like.
    pub fn criteria(&self) -> &'static str {
        match self {
            Self::TooEarly => "Significant gaps in multiple critical areas, substantial development needed",
            Self::NearReady => "Good performance in most areas, some gaps addressable with focused effort",
            Self::InvestmentReady => {
                "Strong performance across all pillars, minimal critical gaps, scalable systems"
            }
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Human-readable meaning of a 1-5 score.
pub fn score_label(score: u8) -> Option<&'static str> {
    match score {
        1 => Some("Absent/Too Early"),
        2 => Some("Basic/Too Early"),
        3 => Some("Developing/Near Ready"),
        4 => Some("Well-Developed/Investment Ready"),
        5 => Some("Optimized/Best Practice"),
        _ => None,
    }
}

/// Aggregated scores for one store snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Weighted overall score (0.0 to 5.0).
    pub overall_score: f64,
    pub tier: Tier,
    /// Pillar scores (0.0 to 5.0), aligned with schema pillar order.
    pub pillar_scores: Vec<f64>,
}

/// Weighted average of one pillar's subcategory scores.
///
/// Divides by the declared subcategory weights, not only those that were
/// scored. A pillar whose weights total 0 scores 0.
pub fn compute_pillar_score(
    pillar_index: usize,
    pillar: &PillarDefinition,
    store: &ScoreStore,
) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;

    for (sub_index, sub) in pillar.subcategories.iter().enumerate() {
        let score = store
            .score(SubcategoryKey::new(pillar_index, sub_index))
            .map(f64::from)
            .unwrap_or(0.0);
        weighted += score * sub.weight;
        total_weight += sub.weight;
    }

    if total_weight > 0.0 {
        clamp_score(weighted / total_weight)
    } else {
        0.0
    }
}

/// Weighted sum of all pillar scores.
pub fn compute_overall_score(schema: &Schema, store: &ScoreStore) -> f64 {
    let pillar_scores = pillar_scores(schema, store);
    weighted_overall(schema, &pillar_scores)
}

/// Classify an overall score. Each band includes its lower bound.
pub fn classify_tier(overall_score: f64) -> Tier {
    if overall_score >= INVESTMENT_READY_THRESHOLD {
        Tier::InvestmentReady
    } else if overall_score >= NEAR_READY_THRESHOLD {
        Tier::NearReady
    } else {
        Tier::TooEarly
    }
}

/// Compute pillar scores, overall score and tier in one pass.
pub fn aggregate(schema: &Schema, store: &ScoreStore) -> AggregateResult {
    let pillar_scores = pillar_scores(schema, store);
    let overall_score = weighted_overall(schema, &pillar_scores);

    AggregateResult {
        overall_score,
        tier: classify_tier(overall_score),
        pillar_scores,
    }
}

fn pillar_scores(schema: &Schema, store: &ScoreStore) -> Vec<f64> {
    schema
        .pillars()
        .iter()
        .enumerate()
        .map(|(i, pillar)| compute_pillar_score(i, pillar, store))
        .collect()
}

fn weighted_overall(schema: &Schema, pillar_scores: &[f64]) -> f64 {
    let total: f64 = schema
        .pillars()
        .iter()
        .zip(pillar_scores)
        .map(|(pillar, score)| score * pillar.weight)
        .sum();
    // Weight sums such as 0.9999999999999999 would otherwise leave a uniform
    // 4 a hair below the threshold.
    clamp_score((total * OVERALL_PRECISION).round() / OVERALL_PRECISION)
}

// Weights are validated to 1e-9, so sums can drift a hair past the maximum.
fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, f64::from(MAX_SCORE))
}
