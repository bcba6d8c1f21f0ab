//! People & communication pillar: leadership carries most of the weight.

use crate::schema::{PillarDefinition, SubcategoryDefinition};

/// Returns the people & communication pillar definition.
pub fn definition() -> PillarDefinition {
    PillarDefinition::new("people_communication", "People & Communication", 0.10)
        .with_subcategories(vec![
            SubcategoryDefinition::new("leadership", "Leadership", 0.60)
                .with_keywords(&["CEO", "leadership", "management"]),
            SubcategoryDefinition::new("team_management", "Team Management", 0.30)
                .with_keywords(&["team", "managers", "staff"]),
            SubcategoryDefinition::new("staff_development", "Staff Development", 0.10)
                .with_keywords(&["training", "development", "HR"]),
        ])
}
