use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Command line interface definition for readiness.
#[derive(Parser, Debug)]
#[command(name = "readiness")]
#[command(about = "Score a company's investment readiness across weighted pillars")]
#[command(version)]
pub struct Cli {
    /// Increase log detail (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Load the pillar framework from a JSON file instead of the built-in one
    #[arg(long, value_name = "FILE", global = true)]
    pub schema: Option<PathBuf>,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Extraction service overrides. Environment variables apply when unset.
#[derive(Args, Debug, Clone, Default)]
pub struct LlmArgs {
    /// LLM provider: claude or opencode (env: READINESS_LLM_PROVIDER)
    #[arg(long = "llm-provider", value_name = "PROVIDER", global = true)]
    pub provider: Option<String>,

    /// Model passed to the provider (env: READINESS_LLM_MODEL)
    #[arg(long = "llm-model", value_name = "MODEL", global = true)]
    pub model: Option<String>,

    /// Backend for opencode, e.g. lmstudio or ollama (env: READINESS_OPENCODE_BACKEND)
    #[arg(long = "opencode-backend", value_name = "BACKEND", global = true)]
    pub opencode_backend: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score company documents with AI assistance, then report
    Analyze(AnalyzeArgs),
    /// Report from a manual score sheet
    Score(ScoreArgs),
    /// Show the pillar framework in use
    Schema(SchemaArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Text file with company information, or - for stdin
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Company name hint (guessed from the text when omitted)
    #[arg(short, long)]
    pub company: Option<String>,

    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Print the extraction prompt without calling the service
    #[arg(long, conflicts_with_all = ["review", "sheet_out"])]
    pub dry_run: bool,

    /// Write the (reviewed) scores to a score sheet
    #[arg(long, value_name = "FILE")]
    pub sheet_out: Option<PathBuf>,

    /// Review and edit the suggested scores in $EDITOR before reporting
    #[arg(long)]
    pub review: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// Score sheet JSON file
    #[arg(value_name = "SHEET")]
    pub sheet: PathBuf,

    /// Override the company name from the sheet
    #[arg(short, long)]
    pub company: Option<String>,

    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

/// Output format for reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// Markdown document
    Markdown,
}
