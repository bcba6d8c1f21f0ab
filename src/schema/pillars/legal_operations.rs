use crate::schema::{PillarDefinition, SubcategoryDefinition};

/// Returns the legal & operations pillar definition.
pub fn definition() -> PillarDefinition {
    PillarDefinition::new("legal_operations", "Legal & Operations", 0.10).with_subcategories(vec![
        SubcategoryDefinition::new("ethics_compliance", "Ethics & Compliance", 0.50)
            .with_keywords(&["ethics", "compliance", "governance"]),
        SubcategoryDefinition::new("board_structure", "Board Structure", 0.10)
            .with_keywords(&["board", "directors", "oversight"]),
        SubcategoryDefinition::new("operations", "Operations", 0.40)
            .with_keywords(&["procedures", "processes", "SOPs"]),
    ])
}
