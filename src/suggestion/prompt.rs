//! Prompt construction for the extraction service.

use crate::aggregate::score_label;
use crate::store::{MAX_LIST_ITEMS, MAX_SCORE, MIN_SCORE};

use super::normalize::DEFAULT_EVIDENCE;
use super::ExtractionRequest;

/// Renders the extraction request into the instruction text sent to the model.
pub fn build_extraction_prompt(request: &ExtractionRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "YOUR ONLY RESPONSE MUST BE THE REQUESTED JSON OBJECT. \
         DO NOT INCLUDE ANY CONVERSATIONAL TEXT, EXPLANATIONS, OR MARKDOWN BEFORE OR AFTER THE JSON.\n\n\
         You are an expert investment readiness assessor. Analyze the company information below and \
         assign a score for each subcategory of each pillar. For every score, quote a concise piece of \
         supporting evidence directly from the text, and list specific strengths and gaps \
         (areas for improvement) derived from the text.\n\n",
    );

    prompt.push_str("## Score Levels\n\n");
    for score in MIN_SCORE..=MAX_SCORE {
        if let Some(label) = score_label(score) {
            prompt.push_str(&format!("- {}: {}\n", score, label));
        }
    }

    prompt.push_str(&format!(
        "\n**Company Name**: {}\n\n## Pillars and Subcategories\n\n",
        request.company_name_hint
    ));

    for (p, pillar) in request.schema.iter().enumerate() {
        prompt.push_str(&format!(
            "### {} (weight: {:.0}%)\n\n",
            pillar.pillar_name,
            pillar.pillar_weight * 100.0
        ));
        for (s, sub) in pillar.subcategories.iter().enumerate() {
            prompt.push_str(&format!(
                "- `{}-{}` {} (weight: {:.0}%)",
                p,
                s,
                sub.name,
                sub.weight * 100.0
            ));
            if !sub.keywords.is_empty() {
                prompt.push_str(&format!(
                    ": focus on aspects related to \"{}\"",
                    sub.keywords.join(", ")
                ));
            }
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "## Company Information\n\n---\n{}\n---\n\n",
        request.company_text.trim()
    ));

    prompt.push_str(&format!(
        r#"## Your Task

Output a single JSON object with this structure:

{{
  "companyName": "<company name found in the text, otherwise \"Unknown Company\">",
  "subcategoryScoresAndEvidence": {{
    "<pillarIndex>-<subIndex>": {{
      "score": <{min}-{max} integer>,
      "evidence": "<direct quote or very close paraphrase from the text>",
      "strengths": ["<0-{items} concise statements>"],
      "gaps": ["<0-{items} concise, actionable statements>"]
    }}
  }}
}}

Include every subcategory key listed above. If the text has no clear evidence for a
subcategory, give it score {min} and the evidence "{evidence}".
Use empty arrays when no strengths or gaps are identifiable.

Output ONLY valid JSON, no markdown fences.
"#,
        min = MIN_SCORE,
        max = MAX_SCORE,
        items = MAX_LIST_ITEMS,
        evidence = DEFAULT_EVIDENCE,
    ));

    prompt
}
