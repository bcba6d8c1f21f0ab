//! Business strategy pillar.

use crate::schema::{PillarDefinition, SubcategoryDefinition};

/// Returns the business strategy pillar definition.
pub fn definition() -> PillarDefinition {
    PillarDefinition::new("business_strategy", "Business Strategy", 0.30).with_subcategories(vec![
        SubcategoryDefinition::new("risk_management", "Risk Management", 0.35)
            .with_keywords(&["risk", "mitigation", "assessment"]),
        SubcategoryDefinition::new("business_model", "Business Model", 0.25)
            .with_keywords(&["business model", "value proposition", "strategy"]),
        SubcategoryDefinition::new("market_analysis", "Market Analysis", 0.20)
            .with_keywords(&["market", "competition", "analysis"]),
        SubcategoryDefinition::new("growth_strategy", "Growth Strategy", 0.20)
            .with_keywords(&["growth", "vision", "expansion"]),
    ])
}
