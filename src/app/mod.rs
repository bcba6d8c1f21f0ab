use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::cli::{AnalyzeArgs, Command, OutputFormat, SchemaArgs, ScoreArgs};
use crate::editor::{Editor, EditorError};
use crate::llm::{LlmClient, LlmConfig};
use crate::report::{self, format_report};
use crate::schema::{ConfigurationError, Schema};
use crate::session::{Action, Session, SessionError};
use crate::sheet::{ScoreSheet, SheetError};
use crate::suggestion::{prompt, ExtractionRequest, LlmSuggester, SuggestionError};

const REVIEW_HELP: &str = "Review the suggested scores below.
Scores must be 1-5 or null. Strengths and gaps take at most 3 items.
Save and close to generate the report. Lines starting with # are ignored.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Suggestion(#[from] SuggestionError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("Failed to read input: {0}")]
    Input(#[from] io::Error),
    #[error("{0}")]
    User(String),
}

pub struct App<E: Editor> {
    schema: Schema,
    editor: E,
    llm_config: LlmConfig,
    client: Option<Arc<dyn LlmClient>>,
}

impl<E: Editor> App<E> {
    pub fn new(schema: Schema, editor: E, llm_config: LlmConfig) -> Self {
        Self {
            schema,
            editor,
            llm_config,
            client: None,
        }
    }

    /// Use `client` instead of one built from the LLM config.
    pub fn with_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Run a command and print its output.
    pub fn run(&mut self, command: Command) -> Result<(), AppError> {
        let output = self.execute(command)?;
        println!("{}", output);
        Ok(())
    }

    /// Run a command and return what would be printed.
    pub fn execute(&mut self, command: Command) -> Result<String, AppError> {
        match command {
            Command::Analyze(opts) => self.handle_analyze(opts),
            Command::Score(opts) => self.handle_score(opts),
            Command::Schema(opts) => Ok(self.handle_schema(opts)),
        }
    }

    fn client(&self) -> Arc<dyn LlmClient> {
        match &self.client {
            Some(client) => Arc::clone(client),
            None => self.llm_config.create_client(),
        }
    }

    fn handle_analyze(&mut self, opts: AnalyzeArgs) -> Result<String, AppError> {
        let text = read_input(&opts.input)?;

        if opts.dry_run {
            let request = ExtractionRequest::new(&text, opts.company.as_deref(), &self.schema)?;
            return Ok(prompt::build_extraction_prompt(&request));
        }

        let mut session = Session::new(self.schema.clone());
        session.apply(Action::ChooseBulk)?;

        info!(
            "Analyzing {} characters with {}",
            text.len(),
            self.llm_config.provider
        );
        let suggester = LlmSuggester::new(self.client());
        session.run_analysis(&suggester, &text, opts.company.as_deref())?;
        if let Some(company) = opts.company.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            session.set_company_name(company);
        }

        if let Some(batch) = session.suggestions() {
            if !batch.defaulted.is_empty() {
                warn!(
                    "{} of {} subcategories had no usable suggestion and were given the default score",
                    batch.defaulted.len(),
                    self.schema.subcategory_count()
                );
            }
        }

        if opts.review {
            self.review(&mut session)?;
        }

        if let Some(path) = &opts.sheet_out {
            ScoreSheet::from_store(session.company_name(), &self.schema, session.store()).save(path)?;
        }

        let report = session.generate_report()?;
        Ok(format_report(report, convert_format(opts.format)))
    }

    /// Round-trip the seeded scores through the editor as a score sheet.
    fn review(&self, session: &mut Session) -> Result<(), AppError> {
        let sheet = ScoreSheet::from_store(session.company_name(), &self.schema, session.store());
        let edited = self.editor.edit(&sheet.to_json_string()?, REVIEW_HELP)?;
        let edited = ScoreSheet::from_json_str(&edited)?;

        let applied = edited.apply_to(&self.schema, session.store_mut())?;
        info!("Applied {} reviewed subcategories", applied);

        let name = edited.company_name.trim();
        if !name.is_empty() {
            session.set_company_name(name);
        }
        Ok(())
    }

    fn handle_score(&mut self, opts: ScoreArgs) -> Result<String, AppError> {
        let sheet = ScoreSheet::load(&opts.sheet)?;

        let mut session = Session::new(self.schema.clone());
        session.apply(Action::ChooseManual)?;
        let applied = sheet.apply_to(&self.schema, session.store_mut())?;
        if applied == 0 {
            return Err(AppError::User(format!(
                "Score sheet {} has no entries for this framework",
                opts.sheet.display()
            )));
        }
        info!(
            "Loaded {} subcategories from {}",
            applied,
            opts.sheet.display()
        );

        session.set_company_name(opts.company.unwrap_or(sheet.company_name));
        let report = session.generate_report()?;
        Ok(format_report(report, convert_format(opts.format)))
    }

    fn handle_schema(&self, opts: SchemaArgs) -> String {
        match opts.format {
            OutputFormat::Json => serde_json::to_string_pretty(self.schema.pillars())
                .unwrap_or_else(|e| format!("Error: {}", e)),
            OutputFormat::Pretty => format_schema_pretty(&self.schema),
            OutputFormat::Markdown => format_schema_markdown(&self.schema),
        }
    }
}

/// Read company text from a file, or from stdin when the path is `-`.
fn read_input(path: &Path) -> Result<String, AppError> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    fs::read_to_string(path).map_err(|e| {
        AppError::User(format!("Failed to read {}: {}", path.display(), e))
    })
}

fn format_schema_pretty(schema: &Schema) -> String {
    let mut output = String::new();
    for (p, pillar) in schema.pillars().iter().enumerate() {
        output.push_str(&format!("{} {} ({:.0}%)\n", p, pillar.name, pillar.weight * 100.0));
        for (s, sub) in pillar.subcategories.iter().enumerate() {
            output.push_str(&format!(
                "  {}-{} {:<32} {:>3.0}%  {}\n",
                p,
                s,
                sub.name,
                sub.weight * 100.0,
                sub.keywords.join(", ")
            ));
        }
    }
    output
}

fn format_schema_markdown(schema: &Schema) -> String {
    let mut output = String::from("| Key | Pillar | Subcategory | Weight | Keywords |\n");
    output.push_str("|-----|--------|-------------|--------|----------|\n");
    for key in schema.keys() {
        if let Some((pillar, sub)) = schema.lookup(key) {
            output.push_str(&format!(
                "| {} | {} ({:.0}%) | {} | {:.0}% | {} |\n",
                key,
                pillar.name,
                pillar.weight * 100.0,
                sub.name,
                sub.weight * 100.0,
                sub.keywords.join(", ")
            ));
        }
    }
    output
}

fn convert_format(format: OutputFormat) -> report::OutputFormat {
    match format {
        OutputFormat::Pretty => report::OutputFormat::Pretty,
        OutputFormat::Json => report::OutputFormat::Json,
        OutputFormat::Markdown => report::OutputFormat::Markdown,
    }
}
