//! Impact pillar: strategy, climate, social outcomes and measurement.

use crate::schema::{PillarDefinition, SubcategoryDefinition};

/// Returns the impact pillar definition.
pub fn definition() -> PillarDefinition {
    PillarDefinition::new("impact", "Impact", 0.20).with_subcategories(vec![
        SubcategoryDefinition::new("impact_strategy", "Impact Strategy", 0.50)
            .with_keywords(&["impact", "theory of change", "social"]),
        SubcategoryDefinition::new("climate_impact", "Climate Impact", 0.20)
            .with_keywords(&["climate", "environmental", "carbon"]),
        SubcategoryDefinition::new("social_impact", "Social Impact", 0.15)
            .with_keywords(&["gender", "inclusion", "community"]),
        SubcategoryDefinition::new("impact_measurement", "Impact Measurement", 0.15)
            .with_keywords(&["data", "metrics", "monitoring"]),
    ])
}
