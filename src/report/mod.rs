//! Final report assembly.
//!
//! A [`FinalReport`] is an immutable snapshot: it copies everything a renderer
//! needs out of the schema and the store, so later edits to the store never
//! change a report that was already generated.

pub mod format;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, AggregateResult, Tier};
use crate::schema::{Schema, SubcategoryKey};
use crate::store::{ScoreRecord, ScoreStore};
use crate::suggestion::PLACEHOLDER_COMPANY;

pub use format::{format_report, OutputFormat};

/// Pillar line of the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarSummary {
    pub name: String,
    pub weight: f64,
    pub score: f64,
    /// Subcategory keys of this pillar, in schema order.
    pub subcategories: Vec<SubcategoryKey>,
}

/// A subcategory definition joined with its record at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryDetail {
    pub pillar_name: String,
    pub name: String,
    pub weight: f64,
    pub record: ScoreRecord,
}

impl SubcategoryDetail {
    pub fn label(&self) -> String {
        format!("{} - {}", self.pillar_name, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub company_name: String,
    pub generated_at: DateTime<Utc>,
    pub aggregate: AggregateResult,
    pub pillars: Vec<PillarSummary>,
    /// One entry per schema subcategory, scored or not.
    pub per_subcategory_detail: BTreeMap<SubcategoryKey, SubcategoryDetail>,
    /// "Pillar - Subcategory:" labels, each followed by that subcategory's gaps,
    /// in schema order.
    pub consolidated_gaps: Vec<String>,
    /// Tier-specific executive summary.
    pub summary: String,
}

/// Build a report from the current store, timestamped now.
pub fn generate(company_name: &str, schema: &Schema, store: &ScoreStore) -> FinalReport {
    generate_at(company_name, schema, store, Utc::now())
}

pub fn generate_at(
    company_name: &str,
    schema: &Schema,
    store: &ScoreStore,
    generated_at: DateTime<Utc>,
) -> FinalReport {
    let company_name = match company_name.trim() {
        "" => PLACEHOLDER_COMPANY.to_string(),
        name => name.to_string(),
    };
    let aggregate = aggregate(schema, store);

    let mut per_subcategory_detail = BTreeMap::new();
    let mut consolidated_gaps = Vec::new();

    for key in schema.keys() {
        let Some((pillar, sub)) = schema.lookup(key) else {
            continue;
        };
        let detail = SubcategoryDetail {
            pillar_name: pillar.name.clone(),
            name: sub.name.clone(),
            weight: sub.weight,
            record: store.get_record(key),
        };

        if !detail.record.gaps.is_empty() {
            consolidated_gaps.push(format!("{}:", detail.label()));
            consolidated_gaps.extend(detail.record.gaps.iter().cloned());
        }
        per_subcategory_detail.insert(key, detail);
    }

    let pillars = schema
        .pillars()
        .iter()
        .enumerate()
        .map(|(p, pillar)| PillarSummary {
            name: pillar.name.clone(),
            weight: pillar.weight,
            score: aggregate.pillar_scores[p],
            subcategories: (0..pillar.subcategories.len())
                .map(|s| SubcategoryKey::new(p, s))
                .collect(),
        })
        .collect();

    let summary = executive_summary(&company_name, aggregate.overall_score, aggregate.tier);

    FinalReport {
        company_name,
        generated_at,
        aggregate,
        pillars,
        per_subcategory_detail,
        consolidated_gaps,
        summary,
    }
}

/// Fixed tier narrative, personalised only by company name and score.
pub fn executive_summary(company_name: &str, overall_score: f64, tier: Tier) -> String {
    format!(
        "{} achieved an overall investment readiness score of {:.2}/5.0, placing it in the \"{}\" category. {}",
        company_name,
        overall_score,
        tier.label(),
        tier_narrative(tier)
    )
}

pub fn tier_narrative(tier: Tier) -> &'static str {
    match tier {
        Tier::InvestmentReady => {
            "The company demonstrates strong performance across all areas and is attractive to \
             investors with potential for favorable investment terms."
        }
        Tier::NearReady => {
            "The company has established a good foundation with targeted improvements needed. \
             Many investors would consider these businesses investment-ready with a development plan."
        }
        Tier::TooEarly => {
            "The company has fundamental gaps in critical processes that present significant \
             investment risk. Focus on building foundational systems and documentation before \
             seeking significant outside investment."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{key, make_store, two_pillar_schema, two_subcategory_schema};

    #[test]
    fn has_one_detail_per_subcategory() {
        let schema = Schema::builtin().unwrap();
        let store = make_store(&[("0-0", 4), ("3-2", 2)]);

        let report = generate("Acme", &schema, &store);

        assert_eq!(report.per_subcategory_detail.len(), schema.subcategory_count());
        for key in schema.keys() {
            assert!(report.per_subcategory_detail.contains_key(&key));
        }
        assert_eq!(report.per_subcategory_detail[&key("1-1")].record.score, None);
        assert_eq!(report.pillars.len(), 5);
    }

    #[test]
    fn gaps_follow_schema_order() {
        let schema = two_pillar_schema();
        let mut store = ScoreStore::new();
        // Insert pillar 1's gap first; the report must still list pillar 0 first.
        store.set_gaps(key("1-0"), vec!["Hire a COO".to_string()]);
        store.set_gaps(key("0-2"), vec!["Commission an audit".to_string(), "Close books monthly".to_string()]);

        let report = generate("Acme", &schema, &store);

        assert_eq!(
            report.consolidated_gaps,
            vec![
                "Money - Audit:",
                "Commission an audit",
                "Close books monthly",
                "People - Team:",
                "Hire a COO",
            ]
        );
    }

    #[test]
    fn summary_matches_tier() {
        let schema = two_subcategory_schema();
        let store = make_store(&[("0-0", 4), ("0-1", 2)]);

        let report = generate("Acme", &schema, &store);

        assert_eq!(report.aggregate.tier, Tier::NearReady);
        assert!(report.summary.starts_with(
            "Acme achieved an overall investment readiness score of 3.00/5.0, placing it in the \"Near Ready\" category."
        ));
        assert!(report.summary.contains("good foundation"));
    }

    #[test]
    fn blank_company_uses_placeholder() {
        let schema = two_subcategory_schema();
        let report = generate("  ", &schema, &ScoreStore::new());

        assert_eq!(report.company_name, PLACEHOLDER_COMPANY);
        assert_eq!(report.aggregate.overall_score, 0.0);
        assert_eq!(report.aggregate.tier, Tier::TooEarly);
        assert!(report.consolidated_gaps.is_empty());
    }

    #[test]
    fn report_is_a_snapshot() {
        let schema = two_subcategory_schema();
        let mut store = make_store(&[("0-0", 5), ("0-1", 5)]);

        let before = generate("Acme", &schema, &store);
        store.set_score(key("0-0"), 1).unwrap();
        let after = generate("Acme", &schema, &store);

        assert_eq!(before.per_subcategory_detail[&key("0-0")].record.score, Some(5));
        assert_eq!(after.per_subcategory_detail[&key("0-0")].record.score, Some(1));
        assert!(before.aggregate.overall_score > after.aggregate.overall_score);
    }

    #[test]
    fn report_round_trips_through_json() {
        let schema = two_subcategory_schema();
        let report = generate("Acme", &schema, &make_store(&[("0-0", 3)]));

        let json = serde_json::to_string(&report).unwrap();
        let restored: FinalReport = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, report);
    }
}
