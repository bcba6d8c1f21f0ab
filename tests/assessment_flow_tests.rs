//! End-to-end assessment flows against the built-in framework with a scripted
//! extraction service.

use std::fs;
use std::sync::{Arc, Mutex};

use readiness::aggregate::Tier;
use readiness::llm::{LlmClient, LlmError};
use readiness::report::{format_report, OutputFormat};
use readiness::schema::{Schema, SubcategoryKey};
use readiness::session::{Action, Session, SessionError, Step};
use readiness::sheet::ScoreSheet;
use readiness::suggestion::{LlmSuggester, SuggestionError, DEFAULT_EVIDENCE};

/// Returns a canned response and keeps every prompt it was sent.
struct ScriptedClient {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(response: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl LlmClient for ScriptedClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }
}

fn key(raw: &str) -> SubcategoryKey {
    raw.parse().unwrap()
}

/// Response scoring every built-in subcategory with `score`.
fn uniform_response(schema: &Schema, company: &str, score: u8) -> String {
    let entries: serde_json::Map<String, serde_json::Value> = schema
        .keys()
        .map(|k| {
            (
                k.to_string(),
                serde_json::json!({
                    "score": score,
                    "evidence": format!("evidence for {}", k),
                    "strengths": ["s1"],
                    "gaps": ["g1", "g2", "g3", "g4"],
                }),
            )
        })
        .collect();
    serde_json::json!({
        "companyName": company,
        "subcategoryScoresAndEvidence": entries,
    })
    .to_string()
}

const COMPANY_TEXT: &str = "Company: Sunrise Farms Ltd\n\
    Sunrise Farms has audited financial statements for the last three years \
    and a board of five independent directors.";

#[test]
fn ai_assisted_assessment_to_markdown() {
    let schema = Schema::builtin().unwrap();
    let client = ScriptedClient::new(uniform_response(&schema, "Sunrise Farms Ltd", 4));
    let mut session = Session::new(schema.clone());

    session.apply(Action::ChooseBulk).unwrap();
    session
        .run_analysis(&LlmSuggester::new(client.clone()), COMPANY_TEXT, None)
        .unwrap();

    assert_eq!(client.calls(), 1);
    assert_eq!(session.step(), Step::Manual);
    assert_eq!(session.company_name(), "Sunrise Farms Ltd");
    assert_eq!(session.store().scored_count(), schema.subcategory_count());
    assert_eq!(session.store().get_record(key("2-1")).gaps.len(), 3);

    let prompt = client.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("**Company Name**: Sunrise Farms Ltd"));
    assert!(prompt.contains("board of five independent directors"));

    let report = session.generate_report().unwrap().clone();
    assert_eq!(report.aggregate.tier, Tier::InvestmentReady);
    assert!((report.aggregate.overall_score - 4.0).abs() < 1e-9);

    let markdown = format_report(&report, OutputFormat::Markdown);
    assert!(markdown.contains("## Sunrise Farms Ltd"));
    assert!(markdown.contains("**4.00/5.0**: Investment Ready"));
    assert!(markdown.contains("- **Financial - Financial Statements:**"));
}

#[test]
fn partial_response_defaults_missing_subcategories() {
    let schema = Schema::builtin().unwrap();
    let client = ScriptedClient::new(
        "```json\n{\"subcategoryScoresAndEvidence\": {\"0-0\": {\"score\": \"5\", \"evidence\": \"audited\"}, \
         \"1-0\": {\"score\": 9}, \"7-7\": {\"score\": 3}}}\n```",
    );
    let mut session = Session::new(schema.clone());
    session.apply(Action::ChooseBulk).unwrap();

    session
        .run_analysis(&LlmSuggester::new(client), COMPANY_TEXT, Some("Sunrise"))
        .unwrap();

    let batch = session.suggestions().unwrap();
    assert_eq!(batch.company_name, "Sunrise");
    assert_eq!(batch.per_subcategory.len(), schema.subcategory_count());
    assert_eq!(batch.defaulted.len(), schema.subcategory_count() - 1);
    assert!(batch.defaulted.contains(&key("1-0")));

    assert_eq!(session.store().score(key("0-0")), Some(5));
    let defaulted = session.store().get_record(key("1-0"));
    assert_eq!(defaulted.score, Some(1));
    assert_eq!(defaulted.evidence, DEFAULT_EVIDENCE);
}

#[test]
fn unusable_response_leaves_session_untouched() {
    let schema = Schema::builtin().unwrap();
    let client = ScriptedClient::new("Sorry, I can only answer questions about farming.");
    let mut session = Session::new(schema);
    session.apply(Action::ChooseBulk).unwrap();

    let err = session
        .run_analysis(&LlmSuggester::new(client), COMPANY_TEXT, None)
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::Suggestion(SuggestionError::MalformedResponse { .. })
    ));
    assert!(err.to_string().contains("only answer questions about farming"));
    assert_eq!(session.step(), Step::Bulk);
    assert!(session.store().is_empty());
    assert!(!session.is_analysis_in_flight());
}

#[test]
fn blank_text_never_reaches_the_service() {
    let schema = Schema::builtin().unwrap();
    let client = ScriptedClient::new("{}");
    let mut session = Session::new(schema);
    session.apply(Action::ChooseBulk).unwrap();

    let result = session.run_analysis(&LlmSuggester::new(client.clone()), " \n ", None);

    assert!(matches!(
        result,
        Err(SessionError::Suggestion(SuggestionError::InputRequired))
    ));
    assert_eq!(client.calls(), 0);
}

#[test]
fn edits_after_analysis_and_accepting_suggestions() {
    let schema = Schema::builtin().unwrap();
    let client = ScriptedClient::new(uniform_response(&schema, "Sunrise Farms Ltd", 3));
    let mut session = Session::new(schema);
    session.apply(Action::ChooseBulk).unwrap();
    session
        .run_analysis(&LlmSuggester::new(client), COMPANY_TEXT, None)
        .unwrap();

    session.store_mut().set_score(key("0-0"), 5).unwrap();
    session.store_mut().set_evidence(key("0-0"), "Assessor override");
    assert_eq!(session.suggestions().unwrap().get(key("0-0")).unwrap().score, Some(3));

    session.accept_suggestion(key("0-0")).unwrap();
    assert_eq!(session.store().score(key("0-0")), Some(3));
    assert_eq!(session.store().get_record(key("0-0")).evidence, "evidence for 0-0");

    let report = session.generate_report().unwrap();
    assert_eq!(report.aggregate.tier, Tier::NearReady);

    session.apply(Action::Back).unwrap();
    assert_eq!(session.step(), Step::Manual);

    session.start_over();
    assert_eq!(session.step(), Step::Select);
    assert!(session.suggestions().is_none());
}

#[test]
fn manual_sheet_to_report() {
    let schema = Schema::builtin().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");
    fs::write(
        &path,
        r#"{
            "companyName": "Kopa Energy",
            "scores": {
                "0-0": {"score": 2, "evidence": "Unaudited accounts", "gaps": "Commission an audit, Monthly close"},
                "3-0": {"score": 3, "strengths": ["Experienced founder"]}
            }
        }"#,
    )
    .unwrap();

    let sheet = ScoreSheet::load(&path).unwrap();
    let mut session = Session::new(schema.clone());
    session.apply(Action::ChooseManual).unwrap();
    sheet.apply_to(&schema, session.store_mut()).unwrap();
    session.set_company_name(sheet.company_name.clone());

    let report = session.generate_report().unwrap();

    assert_eq!(report.company_name, "Kopa Energy");
    assert_eq!(report.aggregate.tier, Tier::TooEarly);
    assert_eq!(
        report.consolidated_gaps,
        vec![
            "Financial - Financial Statements:",
            "Commission an audit",
            "Monthly close"
        ]
    );
    let expected_financial = 2.0 * 0.25;
    assert!((report.aggregate.pillar_scores[0] - expected_financial).abs() < 1e-9);
}

#[test]
fn exported_sheet_reloads_into_same_report() {
    let schema = Schema::builtin().unwrap();
    let client = ScriptedClient::new(uniform_response(&schema, "Sunrise Farms Ltd", 2));
    let mut session = Session::new(schema.clone());
    session.apply(Action::ChooseBulk).unwrap();
    session
        .run_analysis(&LlmSuggester::new(client), COMPANY_TEXT, None)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.json");
    ScoreSheet::from_store(session.company_name(), &schema, session.store())
        .save(&path)
        .unwrap();
    let original = session.generate_report().unwrap().clone();

    let mut reloaded = Session::new(schema.clone());
    reloaded.apply(Action::ChooseManual).unwrap();
    let sheet = ScoreSheet::load(&path).unwrap();
    sheet.apply_to(&schema, reloaded.store_mut()).unwrap();
    reloaded.set_company_name(sheet.company_name);
    let restored = reloaded.generate_report().unwrap();

    assert_eq!(restored.aggregate, original.aggregate);
    assert_eq!(restored.per_subcategory_detail, original.per_subcategory_detail);
    assert_eq!(restored.consolidated_gaps, original.consolidated_gaps);
}
