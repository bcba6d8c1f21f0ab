use clap::Parser;
use log::LevelFilter;

use readiness::app::App;
use readiness::cli::Cli;
use readiness::editor::SystemEditor;
use readiness::llm::{LlmConfig, LlmProvider};
use readiness::schema::Schema;

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_target(false)
        .format_timestamp(None)
        .init();

    // An invalid framework is fatal before any command runs
    let schema = match &cli.schema {
        Some(path) => Schema::from_json_file(path),
        None => Schema::builtin(),
    };
    let schema = match schema {
        Ok(schema) => schema,
        Err(err) => {
            log::error!("Invalid pillar framework: {}", err);
            std::process::exit(1);
        }
    };

    // Build LLM config from environment, then apply CLI overrides
    let provider = match cli.llm.provider.as_deref().map(str::parse::<LlmProvider>) {
        Some(Ok(provider)) => Some(provider),
        Some(Err(err)) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
        None => None,
    };
    let llm_config = LlmConfig::from_env().with_overrides(
        provider,
        cli.llm.model.clone(),
        cli.llm.opencode_backend.clone(),
    );

    let mut app = App::new(schema, SystemEditor::new(), llm_config);
    if let Err(err) = app.run(cli.command) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
