//! Persona Forge - synthetic marketing persona generation
//!
//! Entry point for the `persona-forge` binary. Commands that need the
//! pipeline run on a single-threaded tokio runtime; the pipeline is
//! sequential by nature.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use persona_forge::backend::{GenerationClient, ImageClient, OpenAiClient};
use persona_forge::cli::{
    Cli, Commands, ConfigSubcommand, GenerateArgs, InstitutionsSubcommand, SessionsSubcommand,
    TemplatesSubcommand,
};
use persona_forge::config::{self, ForgeConfig};
use persona_forge::context::{ContextResolver, ContextStore};
use persona_forge::error::{Error, Result};
use persona_forge::generation::{
    AttemptHook, AttemptRecord, GenerationOrchestrator, GenerationRunner, OutcomeKind,
    PipelineReport, SessionLog,
};
use persona_forge::images::ImageBackfillOrchestrator;
use persona_forge::logging::{self, LogGuards};
use persona_forge::persona::{
    templates, IntelligenceLevel, PersonaDraft, PersonaGenerationRequest, QualityReport,
    ValidationResult, Validator,
};
use persona_forge::store::JsonFileRepository;
use persona_forge::version;

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that don't load configuration use simple logging
    match cli.command {
        Commands::Version => {
            version::print_version();
            Ok(())
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand)
        }
        Commands::Templates { subcommand } => handle_templates_command(subcommand),
        Commands::Validate { file, json } => {
            logging::init_simple(tracing::Level::WARN)?;
            validate_file(&file, json)
        }
        Commands::Institutions { subcommand } => {
            let InstitutionsSubcommand::List { config } = subcommand;
            let (config, _log_guards) = load_config(config.as_deref(), cli.verbose, cli.quiet)?;
            list_institutions(&config)
        }
        Commands::Sessions { subcommand } => handle_sessions_command(subcommand, cli.verbose, cli.quiet),
        Commands::Generate(args) => {
            let (config, _log_guards) = load_config(args.config.as_deref(), cli.verbose, cli.quiet)?;
            generate(config, args, cli.quiet)
        }
    }
}

/// Load configuration and initialize logging from it.
/// The guards must be kept alive for the lifetime of the command.
fn load_config(path: Option<&str>, verbose: u8, quiet: bool) -> Result<(ForgeConfig, LogGuards)> {
    let config = ForgeConfig::load(path)?;
    let guards = logging::init_logging(&config.logging, verbose, quiet)?;

    let build = version::build_info();
    debug!(version = %build.full_version(), target = %build.target, "Starting Persona Forge");
    Ok((config, guards))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))
}

// ─────────────────────────────────────────────────────────────────
// Generate
// ─────────────────────────────────────────────────────────────────

/// The pipeline plus the concrete client, kept for usage reporting.
fn build_runner(
    config: &ForgeConfig,
    offline: bool,
    quiet: bool,
) -> Result<(GenerationRunner, Option<Arc<OpenAiClient>>)> {
    let contexts: Arc<dyn ContextResolver> =
        Arc::new(ContextStore::load(Some(config.institutions_dir().as_path()))?);

    let client = if offline {
        info!("Offline mode: using template personas only");
        None
    } else {
        Some(Arc::new(OpenAiClient::new(config.openai.clone())?))
    };
    let text_client = client.clone().map(|c| c as Arc<dyn GenerationClient>);
    let image_client = client.clone().map(|c| c as Arc<dyn ImageClient>);

    let mut orchestrator =
        GenerationOrchestrator::new(config.orchestrator_config(), contexts, text_client);
    if !quiet {
        orchestrator = orchestrator.with_hook(progress_hook());
    }

    let runner = GenerationRunner::new(
        orchestrator,
        Arc::new(JsonFileRepository::new(config.personas_path())),
    )
    .with_images(ImageBackfillOrchestrator::new(image_client, config.backfill_config()))
    .with_sessions(SessionLog::new(config.sessions_dir()))
    .with_ownership(config.ownership.clone());
    Ok((runner, client))
}

fn log_usage(client: Option<&OpenAiClient>) {
    if let Some(client) = client {
        let (completions, images) = client.request_counts();
        info!(completions, images, "API requests completed");
    }
}

fn progress_hook() -> AttemptHook {
    Arc::new(|record: &AttemptRecord| {
        let detail = record.reason.as_deref().unwrap_or("");
        match record.outcome {
            OutcomeKind::Accepted => {
                eprintln!("  persona #{}: accepted on attempt {}", record.item + 1, record.attempt)
            }
            outcome => eprintln!(
                "  persona #{}: attempt {} {}: {}",
                record.item + 1,
                record.attempt,
                outcome,
                detail
            ),
        }
    })
}

fn generate(config: ForgeConfig, args: GenerateArgs, quiet: bool) -> Result<()> {
    let brief = match (&args.brief, &args.brief_file) {
        (Some(brief), _) => brief.clone(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| Error::io_read(path, e))?,
        (None, None) => return Err(Error::invalid_request("a brief is required")),
    };

    let institution = args
        .institution
        .clone()
        .unwrap_or_else(|| config.generation.default_institution.clone());
    let level = args
        .level
        .unwrap_or(config.generation.default_intelligence_level);

    let mut request = PersonaGenerationRequest::new(brief.trim(), institution, args.programs.clone(), args.count)
        .with_level(level)
        .with_images(args.images);
    if let Some(template) = &args.template {
        request = request.with_template(template.clone());
    }

    let (runner, client) = build_runner(&config, args.offline, quiet)?;
    let report = runtime()?.block_on(runner.run(request));
    log_usage(client.as_deref());
    finish_report(&report?, args.output.as_deref())
}

fn finish_report(report: &PipelineReport, output: Option<&Path>) -> Result<()> {
    print_report(report);

    if let Some(path) = output {
        let content = serde_json::to_string_pretty(report)?;
        fs::write(path, content).map_err(|e| Error::io_write(path, e))?;
        println!("\nReport written to {}", path.display());
    }
    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!(
        "Generated {} persona(s) in session {} ({} fallback, {} generation call(s))",
        report.personas.len(),
        report.session.id,
        report.fallback_count,
        report.attempts
    );
    println!();

    for (i, persona) in report.personas.iter().enumerate() {
        println!(
            "{:>3}. {} | {} | {} | {} | quality {}",
            i + 1,
            persona.name,
            persona.occupation,
            persona.age_range,
            persona.provenance,
            persona.quality_score
        );
        if let Some(url) = &persona.avatar_url {
            println!("     avatar: {}", url);
        }
    }

    if let Some(images) = &report.images {
        println!();
        println!(
            "Images: {} generated, {} placeholder(s)",
            images.generated_count(),
            images.placeholder_count()
        );
    }

    if !report.duplicates.is_empty() {
        println!();
        println!("Possible duplicates of existing personas:");
        for dup in &report.duplicates {
            println!(
                "  #{} ~ existing #{} ({:.0}% similar: {})",
                dup.candidate_index + 1,
                dup.existing_index + 1,
                dup.similarity,
                dup.matching_fields.join(", ")
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Validate
// ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct FileValidation {
    index: usize,
    name: Option<String>,
    #[serde(flatten)]
    result: ValidationResult,
    quality: QualityReport,
}

fn validate_file(path: &Path, json: bool) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|e| Error::io_read(path, e))?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| Error::parse(format!("{} is not valid JSON: {}", path.display(), e)))?;

    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    let validator = Validator::new();
    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let draft: PersonaDraft = serde_json::from_value(item)
            .map_err(|e| Error::parse(format!("persona #{} is not a JSON object: {}", index + 1, e)))?;
        results.push(FileValidation {
            index,
            name: draft.name.clone(),
            result: validator.validate(&draft),
            quality: validator.quality(&draft),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for r in &results {
            println!(
                "#{} {}: {} (score {}, grade {})",
                r.index + 1,
                r.name.as_deref().unwrap_or("(unnamed)"),
                if r.result.is_valid { "valid" } else { "INVALID" },
                r.result.score,
                r.quality.grade
            );
            for error in &r.result.errors {
                println!("    error: {}", error);
            }
            for warning in &r.result.warnings {
                println!("    warning: {}", warning);
            }
        }
    }

    let errors: Vec<String> = results
        .iter()
        .flat_map(|r| {
            r.result
                .errors
                .iter()
                .map(move |e| format!("persona #{}: {}", r.index + 1, e))
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::ValidationFailed { errors })
    }
}

// ─────────────────────────────────────────────────────────────────
// Templates, institutions, sessions
// ─────────────────────────────────────────────────────────────────

fn handle_templates_command(subcommand: TemplatesSubcommand) -> Result<()> {
    match subcommand {
        TemplatesSubcommand::List { level } => {
            let levels: Vec<IntelligenceLevel> = match level {
                Some(level) => vec![level],
                None => IntelligenceLevel::all().to_vec(),
            };
            for level in levels {
                for template in templates::by_level(level) {
                    println!(
                        "{:<32} {:<9} {:<24} {}",
                        template.id,
                        template.intelligence_level.slug(),
                        template.category,
                        template.name
                    );
                }
            }
            Ok(())
        }
        TemplatesSubcommand::Show { id } => {
            let template = templates::find(&id)?;
            println!("{} ({})", template.name, template.id);
            println!("Level:     {}", template.intelligence_level);
            println!("Category:  {}", template.category);
            println!("Suggested: {} persona(s)", template.suggested_count);
            println!();
            println!("{}", template.description);
            println!();
            println!("{}", template.template);
            Ok(())
        }
    }
}

fn list_institutions(config: &ForgeConfig) -> Result<()> {
    let store = ContextStore::load(Some(config.institutions_dir().as_path()))?;
    for context in store.list() {
        println!(
            "{} - {}{}",
            context.id,
            context.name,
            context
                .location
                .as_deref()
                .map(|l| format!(" ({})", l))
                .unwrap_or_default()
        );
        for program in &context.programs {
            println!("    {:<8} {} [{}]", program.id, program.name, program.category);
        }
    }
    Ok(())
}

fn handle_sessions_command(subcommand: SessionsSubcommand, verbose: u8, quiet: bool) -> Result<()> {
    match subcommand {
        SessionsSubcommand::List { config } => {
            let (config, _log_guards) = load_config(config.as_deref(), verbose, quiet)?;
            let sessions = SessionLog::new(config.sessions_dir()).list()?;
            if sessions.is_empty() {
                println!("No sessions recorded in {}", config.sessions_dir().display());
            }
            for session in sessions {
                println!(
                    "{}  {}  {:<10} {} persona(s), {} fallback  {}",
                    session.id,
                    session.created_at.format("%Y-%m-%d %H:%M:%S"),
                    session.status.to_string(),
                    session.persona_ids.len(),
                    session.fallback_count,
                    session.request.program_ids.join(",")
                );
            }
            Ok(())
        }
        SessionsSubcommand::Show { id, config } => {
            let (config, _log_guards) = load_config(config.as_deref(), verbose, quiet)?;
            let session = SessionLog::new(config.sessions_dir()).load(&id)?;
            println!("{}", serde_json::to_string_pretty(&session)?);
            Ok(())
        }
        SessionsSubcommand::Replay { id, offline, config } => {
            let (config, _log_guards) = load_config(config.as_deref(), verbose, quiet)?;
            let (runner, client) = build_runner(&config, offline, quiet)?;
            let report = runtime()?.block_on(runner.replay(&id));
            log_usage(client.as_deref());
            finish_report(&report?, None)
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────

fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let config = ForgeConfig::load(config.as_deref())?;
            print!("{}", config.to_display_toml()?);
            Ok(())
        }
        ConfigSubcommand::Init { path, force } => {
            let path = config::init_config(path.as_deref(), force)?;
            println!("Configuration file created: {}", path.display());
            Ok(())
        }
        ConfigSubcommand::Validate { config } => {
            ForgeConfig::load(config.as_deref())?;
            println!("Configuration is valid");
            Ok(())
        }
    }
}
