//! Shared test fixtures.

use crate::schema::{PillarDefinition, Schema, SubcategoryDefinition, SubcategoryKey};
use crate::store::ScoreStore;

/// One pillar (weight 1.0) with two equally weighted subcategories.
pub fn two_subcategory_schema() -> Schema {
    Schema::new(vec![PillarDefinition::new("core", "Core", 1.0)
        .with_subcategories(vec![
            SubcategoryDefinition::new("first", "First", 0.5).with_keywords(&["alpha"]),
            SubcategoryDefinition::new("second", "Second", 0.5).with_keywords(&["beta"]),
        ])])
    .unwrap()
}

/// Two pillars with four subcategories in total.
pub fn two_pillar_schema() -> Schema {
    Schema::new(vec![
        PillarDefinition::new("money", "Money", 0.6).with_subcategories(vec![
            SubcategoryDefinition::new("cash", "Cash", 0.5),
            SubcategoryDefinition::new("books", "Books", 0.25),
            SubcategoryDefinition::new("audit", "Audit", 0.25),
        ]),
        PillarDefinition::new("people", "People", 0.4)
            .with_subcategories(vec![SubcategoryDefinition::new("team", "Team", 1.0)]),
    ])
    .unwrap()
}

pub fn key(raw: &str) -> SubcategoryKey {
    raw.parse().unwrap()
}

/// Build a store with the given `"p-s"` keys scored.
pub fn make_store(scores: &[(&str, u8)]) -> ScoreStore {
    let mut store = ScoreStore::new();
    for (raw, score) in scores {
        store.set_score(key(raw), *score).unwrap();
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_store() {
        let store = make_store(&[("0-0", 4), ("1-2", 1)]);
        assert_eq!(store.score(key("0-0")), Some(4));
        assert_eq!(store.score(key("1-2")), Some(1));
        assert_eq!(store.scored_count(), 2);
    }

    #[test]
    fn test_fixture_schemas_are_valid() {
        assert_eq!(two_subcategory_schema().subcategory_count(), 2);
        assert_eq!(two_pillar_schema().subcategory_count(), 4);
    }
}
