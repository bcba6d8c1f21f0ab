//! Built-in pillar definitions.

pub mod financial;
pub mod impact;
pub mod legal_operations;
pub mod people;
pub mod strategy;

use super::PillarDefinition;

/// All built-in pillars, in report order.
pub fn all() -> Vec<PillarDefinition> {
    vec![
        financial::definition(),
        strategy::definition(),
        legal_operations::definition(),
        people::definition(),
        impact::definition(),
    ]
}
