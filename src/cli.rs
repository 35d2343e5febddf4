//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tellbook - poker tell tracker
///
/// Record opponents' tells, see how each cue has played out in similar
/// spots, and get an LLM-written profile of a player.
///
/// Examples:
///   tellbook --user <UUID> add-player "Seat 4 cap guy"
///   tellbook --user <UUID> observe <PLAYER> --bucket 1 --cue 13 --tilt 2
///   tellbook --user <UUID> analyze <PLAYER> --cues 13,14 --outcome 1
///   tellbook --user <UUID> narrate <PLAYER>
///   tellbook init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Account id (UUID) the command acts as
    #[arg(short, long, global = true, value_name = "UUID", env = "TELLBOOK_USER")]
    pub user: Option<String>,

    /// Path to the JSON store file
    #[arg(long, global = true, value_name = "FILE", env = "TELLBOOK_STORE")]
    pub store: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tellbook.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, global = true, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Model used for narratives
    #[arg(short, long, global = true, env = "TELLBOOK_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible generation API
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Generation request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a default .tellbook.toml configuration file
    InitConfig,

    /// List the active cue catalog
    Cues,

    /// List tracked players
    Players {
        /// Case-insensitive name filter
        #[arg(long, default_value = "")]
        query: String,
    },

    /// Start tracking a player
    AddPlayer {
        name: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Show one player
    Player { id: String },

    /// Replace a player's notes
    SetNotes { id: String, notes: String },

    /// Stop tracking a player (can be restored)
    RemovePlayer { id: String },

    /// Restore a removed player
    RestorePlayer { id: String },

    /// Add an entry to a player's notes log
    Note { player: String, body: String },

    /// Show a player's most recent notes, newest first
    Notes { player: String },

    /// Record a tell
    Observe {
        player: String,

        /// 1 (Bluff), 2 (Strong), 3 (Semi-Bluff), 4 (Semi-Strong)
        #[arg(short, long)]
        bucket: String,

        /// Cue id from the catalog
        #[arg(long)]
        cue: Option<i64>,

        /// Free-text note
        #[arg(long)]
        text: Option<String>,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// List a player's recorded tells, newest first
    History { player: String },

    /// All-time counts per bucket
    Summary { player: String },

    /// Delete one recorded tell
    Forget { player: String, observation: String },

    /// Bucket statistics for a set of cues in a given context
    Analyze {
        player: String,

        /// Cue ids to match (comma-separated)
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        cues: Vec<i64>,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// LLM-written profile of a player
    Narrate { player: String },

    /// Dump all players, notes and tells as JSON
    Export,
}

/// Optional context filters shared by `observe` and `analyze`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Hand outcome: 0 Unknown, 1 Won, 2 Lost, 3 Folded
    #[arg(long, allow_negative_numbers = true)]
    pub outcome: Option<i64>,

    /// Tilt state: 0 Normal, 1 Slight, 2 On tilt, 3 Steaming
    #[arg(long, allow_negative_numbers = true)]
    pub tilt: Option<i64>,

    /// Stack: 0 Unknown, 1 Short, 2 Medium, 3 Deep
    #[arg(long, allow_negative_numbers = true)]
    pub stack: Option<i64>,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the command acts on an account's records.
    pub fn needs_user(&self) -> bool {
        !matches!(self.command, Command::InitConfig | Command::Cues)
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.needs_user() {
            match self.user.as_deref() {
                None => return Err("--user (or TELLBOOK_USER) is required".to_string()),
                Some(user) if uuid::Uuid::parse_str(user.trim()).is_err() => {
                    return Err("--user must be a UUID".to_string())
                }
                Some(_) => {}
            }
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// The acting account. Only meaningful after `validate` succeeded.
    pub fn owner(&self) -> Option<uuid::Uuid> {
        self.user
            .as_deref()
            .and_then(|u| uuid::Uuid::parse_str(u.trim()).ok())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "6f1c2a1e-8a7b-4c1d-9e2f-0a1b2c3d4e5f";

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tellbook").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_analyze_parses_cue_list_and_context() {
        let args = parse(&["--user", USER, "analyze", "p1", "--cues", "5,9", "--outcome", "1"]);
        match args.command {
            Command::Analyze {
                player,
                cues,
                context,
            } => {
                assert_eq!(player, "p1");
                assert_eq!(cues, vec![5, 9]);
                assert_eq!(context.outcome, Some(1));
                assert_eq!(context.tilt, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_observe_keeps_bucket_raw() {
        let args = parse(&["observe", "p1", "--bucket", "3", "--user", USER]);
        match args.command {
            Command::Observe { bucket, .. } => assert_eq!(bucket, "3"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation_requires_user() {
        let args = parse(&["players"]);
        if std::env::var("TELLBOOK_USER").is_err() {
            assert!(args.validate().is_err());
        }

        let args = parse(&["--user", "nope", "players"]);
        assert!(args.validate().is_err());

        let args = parse(&["--user", USER, "players"]);
        assert!(args.validate().is_ok());
        assert!(args.owner().is_some());
    }

    #[test]
    fn test_note_takes_player_and_body() {
        let args = parse(&["--user", USER, "note", "p1", "calls too wide"]);
        match &args.command {
            Command::Note { player, body } => {
                assert_eq!(player, "p1");
                assert_eq!(body, "calls too wide");
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(args.needs_user());
    }

    #[test]
    fn test_cues_do_not_need_user() {
        let args = parse(&["cues"]);
        assert!(!args.needs_user());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["--user", USER, "-v", "-q", "players"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["cues"]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
