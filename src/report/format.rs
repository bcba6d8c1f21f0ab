//! Text renderers for a [`FinalReport`].

use crate::aggregate::{score_label, Tier};
use crate::report::{FinalReport, SubcategoryDetail};
use crate::store::MAX_SCORE;

const NO_EVIDENCE: &str = "No specific evidence provided.";
const BAR_WIDTH: usize = 20;

const METHODOLOGY: &str = "This report is based on an investment readiness framework that assesses \
companies across weighted pillars. Scores are assigned on a 1-5 scale, with 5 indicating optimal \
performance. Data is derived from provided company documentation and AI-assisted analysis, which \
identifies specific strengths and areas for improvement, reviewed by the assessor.";

const NEXT_STEPS: &str = "This assessment provides a baseline for investment readiness. Regular \
reassessment is recommended as the company develops its capabilities and systems. Companies are \
encouraged to prioritize addressing the identified gaps to enhance their attractiveness to \
potential investors.";

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal output.
    Pretty,
    /// JSON of the full report.
    Json,
    /// Markdown document suitable for export.
    Markdown,
}

pub fn format_report(report: &FinalReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Pretty => format_pretty(report),
        OutputFormat::Json => format_json(report),
        OutputFormat::Markdown => format_markdown(report),
    }
}

fn format_json(report: &FinalReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("Error: {}", e))
}

fn format_pretty(report: &FinalReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Investment Readiness: {}\nGenerated: {}\n\n",
        report.company_name,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "\x1b[1mOverall Score: {:.2}/5.0 ({})\x1b[0m\n\n",
        report.aggregate.overall_score, report.aggregate.tier
    ));

    for pillar in &report.pillars {
        output.push_str(&format!(
            "{:<24} {} {:.2} (weight {:.0}%)\n",
            pillar.name,
            score_bar(pillar.score),
            pillar.score,
            pillar.weight * 100.0
        ));
        for key in &pillar.subcategories {
            if let Some(detail) = report.per_subcategory_detail.get(key) {
                output.push_str(&format!(
                    "    {:<28} {}\n",
                    detail.name,
                    score_text(detail)
                ));
            }
        }
    }

    if !report.consolidated_gaps.is_empty() {
        output.push_str("\nRecommendations:\n");
        for line in &report.consolidated_gaps {
            if line.ends_with(':') {
                output.push_str(&format!("  {}\n", line));
            } else {
                output.push_str(&format!("    - {}\n", line));
            }
        }
    }

    output.push_str(&format!("\n{}\n", report.summary));
    output
}

fn score_bar(score: f64) -> String {
    let filled = ((score / f64::from(MAX_SCORE)) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn score_text(detail: &SubcategoryDetail) -> String {
    match detail.record.score {
        Some(score) => format!(
            "{}/5 {}",
            score,
            score_label(score).unwrap_or_default()
        ),
        None => "not scored".to_string(),
    }
}

fn evidence_text(detail: &SubcategoryDetail) -> &str {
    match detail.record.evidence.trim() {
        "" => NO_EVIDENCE,
        text => text,
    }
}

fn format_markdown(report: &FinalReport) -> String {
    let mut output = String::new();
    let date = report.generated_at.format("%Y-%m-%d");

    output.push_str(&format!(
        "# Investment Readiness Assessment Report\n\n## {}\n\nGenerated on {}\n\n",
        report.company_name, date
    ));

    output.push_str(&format!(
        "## Overall Investment Readiness Score\n\n**{:.2}/5.0**: {}\n\n",
        report.aggregate.overall_score, report.aggregate.tier
    ));

    output.push_str("## Pillar Breakdown & Detailed Assessment\n\n");
    output.push_str("| Pillar | Weight | Score |\n|--------|--------|-------|\n");
    for pillar in &report.pillars {
        output.push_str(&format!(
            "| {} | {:.0}% | {:.2}/5.0 |\n",
            pillar.name,
            pillar.weight * 100.0,
            pillar.score
        ));
    }
    output.push('\n');

    for pillar in &report.pillars {
        output.push_str(&format!(
            "### {} (Weight: {:.0}%)\n\nPillar Score: **{:.2}/5.0**\n\n",
            pillar.name,
            pillar.weight * 100.0,
            pillar.score
        ));

        for key in &pillar.subcategories {
            let Some(detail) = report.per_subcategory_detail.get(key) else {
                continue;
            };
            output.push_str(&format!(
                "#### {} (Weight: {:.0}% of {})\n\nScore: **{:.1}/5.0**\n\n**Evidence:** {}\n\n",
                detail.name,
                detail.weight * 100.0,
                pillar.name,
                detail.record.score_value(),
                evidence_text(detail)
            ));
            push_list(&mut output, "Strengths", &detail.record.strengths);
            push_list(&mut output, "Gaps/Areas for Improvement", &detail.record.gaps);
        }
    }

    output.push_str(&format!("## Executive Summary\n\n{}\n\n", report.summary));

    output.push_str("## Assessment Criteria\n\n");
    for tier in Tier::all() {
        output.push_str(&format!(
            "- **{} ({}):** {}\n",
            tier.label(),
            tier.band(),
            tier.criteria()
        ));
    }
    output.push('\n');

    output.push_str(&format!(
        "## Assessor Information\n\n**Date of Assessment:** {}\n\n",
        date
    ));
    output.push_str(&format!("## Methodology Notes\n\n{}\n\n", METHODOLOGY));

    let evidence: Vec<String> = report
        .per_subcategory_detail
        .values()
        .filter(|d| !d.record.evidence.trim().is_empty())
        .map(|d| format!("- **{}:** {}", d.label(), d.record.evidence.trim()))
        .collect();
    if !evidence.is_empty() {
        output.push_str("## General Supporting Evidence\n\n");
        output.push_str(&evidence.join("\n"));
        output.push_str("\n\n");
    }

    if !report.consolidated_gaps.is_empty() {
        output.push_str(
            "## Recommendations & Improvement Plan\n\n\
             Based on the assessment, the following areas have been identified for improvement:\n\n",
        );
        for line in &report.consolidated_gaps {
            if line.ends_with(':') {
                output.push_str(&format!("- **{}**\n", line));
            } else {
                output.push_str(&format!("  - {}\n", line));
            }
        }
        output.push('\n');
    }

    output.push_str(&format!("## Next Steps\n\n{}\n", NEXT_STEPS));
    output
}

fn push_list(output: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    output.push_str(&format!("**{}:**\n\n", heading));
    for item in items {
        output.push_str(&format!("- {}\n", item));
    }
    output.push('\n');
}
