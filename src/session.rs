//! Assessment session: step state machine plus the single in-flight analysis slot.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};

use crate::report::{self, FinalReport};
use crate::schema::{Schema, SubcategoryKey};
use crate::store::{ScoreStore, StoreError};
use crate::suggestion::{
    ExtractionRequest, LlmSuggester, SuggestionBatch, SuggestionError, PLACEHOLDER_COMPANY,
};

/// Screens of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Choose between AI-assisted and manual scoring.
    Select,
    /// Paste company text for analysis.
    Bulk,
    /// Edit per-subcategory scores.
    Manual,
    /// Report view.
    Results,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "select",
            Self::Bulk => "bulk",
            Self::Manual => "manual",
            Self::Results => "results",
        };
        write!(f, "{}", name)
    }
}

/// User actions and events that move between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ChooseBulk,
    ChooseManual,
    Back,
    AnalysisSucceeded,
    GenerateReport,
    StartOver,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ChooseBulk => "choose-bulk",
            Self::ChooseManual => "choose-manual",
            Self::Back => "back",
            Self::AnalysisSucceeded => "analysis-succeeded",
            Self::GenerateReport => "generate-report",
            Self::StartOver => "start-over",
        };
        write!(f, "{}", name)
    }
}

/// The transition table. `None` means the action is not allowed from `from`.
pub fn transition(from: Step, action: Action) -> Option<Step> {
    use Action::*;
    use Step::*;

    match (from, action) {
        (_, StartOver) => Some(Select),
        (Select, ChooseBulk) => Some(Bulk),
        (Select, ChooseManual) => Some(Manual),
        (Bulk, Back) => Some(Select),
        (Bulk, AnalysisSucceeded) => Some(Manual),
        (Manual, Back) => Some(Select),
        (Manual, GenerateReport) => Some(Results),
        (Results, Back) => Some(Manual),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot {action} from the {from} step")]
    InvalidTransition { from: Step, action: Action },
    #[error("An analysis is already in progress")]
    AnalysisInFlight,
    #[error("No suggestion available for subcategory {0}")]
    NoSuggestion(SubcategoryKey),
    #[error(transparent)]
    Suggestion(#[from] SuggestionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Claim on the session's single analysis slot. Released on drop.
#[derive(Debug)]
pub struct AnalysisSlot {
    flag: Arc<AtomicBool>,
}

impl AnalysisSlot {
    fn claim(flag: &Arc<AtomicBool>) -> Result<Self, SessionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::AnalysisInFlight)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for AnalysisSlot {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One assessment from step selection to report.
pub struct Session {
    schema: Schema,
    store: ScoreStore,
    suggestions: Option<SuggestionBatch>,
    company_name: String,
    report: Option<FinalReport>,
    step: Step,
    in_flight: Arc<AtomicBool>,
}

impl Session {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            store: ScoreStore::new(),
            suggestions: None,
            company_name: String::new(),
            report: None,
            step: Step::Select,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    /// Direct edits made on the manual step.
    pub fn store_mut(&mut self) -> &mut ScoreStore {
        &mut self.store
    }

    /// Suggestions from the last successful analysis, untouched by later edits.
    pub fn suggestions(&self) -> Option<&SuggestionBatch> {
        self.suggestions.as_ref()
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn set_company_name(&mut self, name: impl Into<String>) {
        self.company_name = name.into();
    }

    pub fn report(&self) -> Option<&FinalReport> {
        self.report.as_ref()
    }

    pub fn is_analysis_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Apply one action through the transition table.
    pub fn apply(&mut self, action: Action) -> Result<Step, SessionError> {
        let next = transition(self.step, action).ok_or(SessionError::InvalidTransition {
            from: self.step,
            action,
        })?;
        debug!("Session step {} -> {} ({})", self.step, next, action);
        self.step = next;
        Ok(next)
    }

    /// Claim the analysis slot and build the request for the extraction service.
    ///
    /// Only valid on the bulk step. The slot stays claimed until the returned
    /// guard is dropped or passed to [`Session::complete_analysis`].
    pub fn begin_analysis(
        &self,
        company_text: &str,
        company_name_hint: Option<&str>,
    ) -> Result<(ExtractionRequest, AnalysisSlot), SessionError> {
        if self.step != Step::Bulk {
            return Err(SessionError::InvalidTransition {
                from: self.step,
                action: Action::AnalysisSucceeded,
            });
        }
        let slot = AnalysisSlot::claim(&self.in_flight)?;
        let request = ExtractionRequest::new(company_text, company_name_hint, &self.schema)?;
        Ok((request, slot))
    }

    /// Seed the store from a normalized batch and move to the manual step.
    ///
    /// The batch is applied to a fresh store first, so a rejected record
    /// leaves the session exactly as it was.
    pub fn complete_analysis(
        &mut self,
        slot: AnalysisSlot,
        batch: SuggestionBatch,
    ) -> Result<(), SessionError> {
        let next = transition(self.step, Action::AnalysisSucceeded).ok_or(
            SessionError::InvalidTransition {
                from: self.step,
                action: Action::AnalysisSucceeded,
            },
        )?;

        let mut seeded = ScoreStore::new();
        for (key, record) in &batch.per_subcategory {
            seeded.apply_record(*key, record.clone())?;
        }

        self.store = seeded;
        self.company_name = batch.company_name.clone();
        self.suggestions = Some(batch);
        self.report = None;
        self.step = next;
        drop(slot);

        info!(
            "Seeded {} subcategories for {}",
            self.store.scored_count(),
            self.company_name
        );
        Ok(())
    }

    /// Run one analysis end to end: claim, call the suggester, seed.
    pub fn run_analysis(
        &mut self,
        suggester: &LlmSuggester,
        company_text: &str,
        company_name_hint: Option<&str>,
    ) -> Result<(), SessionError> {
        let (request, slot) = self.begin_analysis(company_text, company_name_hint)?;
        let batch = suggester.suggest(&request, &self.schema)?;
        self.complete_analysis(slot, batch)
    }

    /// Copy one retained suggestion back into the store.
    pub fn accept_suggestion(&mut self, key: SubcategoryKey) -> Result<(), SessionError> {
        let record = self
            .suggestions
            .as_ref()
            .and_then(|batch| batch.get(key))
            .cloned()
            .ok_or(SessionError::NoSuggestion(key))?;
        self.store.apply_record(key, record)?;
        Ok(())
    }

    /// Snapshot the store into a report and move to the results step.
    pub fn generate_report(&mut self) -> Result<&FinalReport, SessionError> {
        self.apply(Action::GenerateReport)?;
        let company = match self.company_name.trim() {
            "" => PLACEHOLDER_COMPANY,
            name => name,
        };
        let report = report::generate(company, &self.schema, &self.store);
        info!(
            "Generated report for {}: {:.2} ({})",
            report.company_name, report.aggregate.overall_score, report.aggregate.tier
        );
        Ok(self.report.insert(report))
    }

    /// Clear scores, suggestions and report and return to the select step.
    pub fn start_over(&mut self) {
        self.store.reset();
        self.suggestions = None;
        self.report = None;
        self.company_name.clear();
        self.step = Step::Select;
    }
}
