//! Tellbook - poker tell tracker
//!
//! A CLI tool that records opponents' tells, aggregates them by cue and
//! hand context, and asks an LLM for a written profile of the player.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (store, generation service, config, etc.)
//!   2 - Invalid input
//!   3 - Player or observation not found

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod narrative;
mod report;
mod service;
mod store;

use anyhow::{Context, Result};
use cli::{Args, Command, ContextArgs, OutputFormat};
use config::{Config, CONFIG_FILE};
use error::TellError;
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalyzeRequest, NewObservation};
use narrative::{ChatClient, NarrativeSynthesizer};
use serde_json::Value;
use service::Tellbook;
use std::time::Duration;
use store::FileStore;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Config is read before the subscriber exists so `verbose` can set the level
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, config.general.verbose);

    debug!("Tellbook v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let code = match e.downcast_ref::<TellError>() {
                Some(TellError::Internal(detail)) => {
                    error!("Internal failure: {}", detail);
                    eprintln!("Error: internal error");
                    1
                }
                Some(tell_error) => {
                    eprintln!("Error: {}", tell_error);
                    tell_error.exit_code()
                }
                None => {
                    error!("Command failed: {:#}", e);
                    eprintln!("Error: {:#}", e);
                    1
                }
            };
            std::process::exit(code);
        }
    }
}

/// Handle init-config: generate a default .tellbook.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings. Logs go to stderr.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = if config_verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults. Runs before logging is set up.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location; a file that exists but does not parse is an error
    Ok(Config::load_default()?.unwrap_or_default())
}

fn analyze_request(cue_ids: Vec<i64>, context: &ContextArgs) -> AnalyzeRequest {
    AnalyzeRequest {
        cue_ids,
        hand_outcome: context.outcome,
        tilt_state: context.tilt,
        stack_situation: context.stack,
    }
}

/// Print a result as JSON or as its Markdown rendering.
fn emit<T: serde::Serialize>(
    format: OutputFormat,
    value: &T,
    markdown: impl FnOnce() -> String,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", report::generate_json(value)?),
        OutputFormat::Markdown => print!("{}", markdown()),
    }
    Ok(())
}

/// Run a single command.
async fn run(args: Args, config: Config) -> Result<()> {
    let store = FileStore::open(&config.general.store).map_err(TellError::from)?;
    debug!("Using store {}", store.path().display());

    let book = Tellbook::new(store).with_max_free_text(config.narrative.max_free_text);
    let format = args.format;
    // validate() guarantees a parsable user for every command that needs one
    let owner = args.owner().unwrap_or_else(Uuid::nil);

    match args.command {
        Command::InitConfig => handle_init_config()?,

        Command::Cues => {
            let cues = book.list_cues().await?;
            emit(format, &cues, || report::generate_cue_table(&cues))?;
        }

        Command::Players { query } => {
            let players = book.list_players(owner, &query).await?;
            emit(format, &players, || report::generate_player_table(&players))?;
        }

        Command::AddPlayer { name, notes } => {
            let player = book.add_player(owner, &name, notes.as_deref()).await?;
            emit(format, &player, || format!("Added {} ({})\n", player.name, player.id))?;
        }

        Command::Player { id } => {
            let player = book.get_player(owner, &id).await?;
            emit(format, &player, || {
                let notes = if player.notes.is_empty() { "-" } else { player.notes.as_str() };
                format!(
                    "# {}\n\n- **Id:** `{}`\n- **Active:** {}\n- **Notes:** {}\n",
                    player.name, player.id, player.active, notes
                )
            })?;
        }

        Command::SetNotes { id, notes } => {
            book.update_notes(owner, &id, &notes).await?;
            emit(format, &serde_json::json!({ "ok": true }), || "Notes updated.\n".to_string())?;
        }

        Command::RemovePlayer { id } => {
            book.remove_player(owner, &id).await?;
            emit(format, &serde_json::json!({ "ok": true }), || "Player removed.\n".to_string())?;
        }

        Command::RestorePlayer { id } => {
            book.restore_player(owner, &id).await?;
            emit(format, &serde_json::json!({ "ok": true }), || "Player restored.\n".to_string())?;
        }

        Command::Note { player, body } => {
            let id = book.add_note(owner, &player, &body).await?;
            emit(format, &serde_json::json!({ "id": id }), || format!("Added note {}\n", id))?;
        }

        Command::Notes { player } => {
            let record = book.get_player(owner, &player).await?;
            let notes = book.list_notes(owner, &player).await?;
            emit(format, &notes, || report::generate_note_list(&record, &notes))?;
        }

        Command::Observe {
            player,
            bucket,
            cue,
            text,
            context,
        } => {
            let input = NewObservation {
                bucket: Value::String(bucket),
                cue_id: cue,
                free_text: text,
                hand_outcome: context.outcome,
                tilt_state: context.tilt,
                stack_situation: context.stack,
            };
            let id = book.record_observation(owner, &player, input).await?;
            emit(format, &serde_json::json!({ "id": id }), || format!("Recorded {}\n", id))?;
        }

        Command::History { player } => {
            let record = book.get_player(owner, &player).await?;
            let views = book.list_observations(owner, &player).await?;
            emit(format, &views, || report::generate_observation_list(&record, &views))?;
        }

        Command::Summary { player } => {
            let record = book.get_player(owner, &player).await?;
            let counts = book.bucket_summary(owner, &player).await?;
            emit(format, &counts, || report::generate_summary_report(&record, &counts))?;
        }

        Command::Forget {
            player,
            observation,
        } => {
            book.delete_observation(owner, &player, &observation).await?;
            emit(format, &serde_json::json!({ "ok": true }), || "Observation deleted.\n".to_string())?;
        }

        Command::Analyze {
            player,
            cues,
            context,
        } => {
            let request = analyze_request(cues, &context);
            let result = book.analyze(owner, &player, &request).await?;
            let record = book.get_player(owner, &player).await?;
            emit(format, &result, || report::generate_aggregate_report(&record, &result))?;
        }

        Command::Narrate { player } => {
            let record = book.get_player(owner, &player).await?;

            let client = ChatClient::new(config.client_config()).map_err(TellError::from)?;
            let synthesizer = NarrativeSynthesizer::new(client)
                .with_max_observations(config.narrative.max_observations)
                .with_timeout(Duration::from_secs(config.model.timeout_seconds));

            info!("Using model {} at {}", config.model.name, config.model.api_url);
            let spinner = (!args.quiet).then(|| {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::with_template("{spinner} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                spinner.set_message(format!("Profiling {}...", record.name));
                spinner.enable_steady_tick(Duration::from_millis(120));
                spinner
            });

            let result = book.narrate(owner, &player, &synthesizer).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            let narrative = result?;
            emit(format, &narrative, || {
                report::generate_narrative_report(&record, &narrative)
            })?;
        }

        Command::Export => {
            let export = book.export(owner).await?;
            println!("{}", report::generate_json(&export)?);
        }
    }

    Ok(())
}
