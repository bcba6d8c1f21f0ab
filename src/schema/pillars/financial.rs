//! Financial pillar: statements, budgeting, reporting, performance and fundraising.

use crate::schema::{PillarDefinition, SubcategoryDefinition};

/// Returns the financial pillar definition.
pub fn definition() -> PillarDefinition {
    PillarDefinition::new("financial", "Financial", 0.30).with_subcategories(vec![
        SubcategoryDefinition::new("financial_statements", "Financial Statements", 0.25)
            .with_keywords(&["audited", "financial statements", "bookkeeping"]),
        SubcategoryDefinition::new("budgeting_process", "Budgeting Process", 0.10)
            .with_keywords(&["budget", "forecasting", "planning"]),
        SubcategoryDefinition::new("financial_reporting", "Financial Reporting", 0.20)
            .with_keywords(&["reports", "transparency", "investor"]),
        SubcategoryDefinition::new("financial_performance", "Financial Performance", 0.30)
            .with_keywords(&["profitability", "cash flow", "revenue"]),
        SubcategoryDefinition::new("fundraising", "Fundraising", 0.15)
            .with_keywords(&["fundraising", "investors", "capital"]),
    ])
}
