//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for Persona Forge.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::persona::IntelligenceLevel;

/// Persona Forge - synthetic marketing persona generation
///
/// Turns a free-text marketing brief plus institution context into a batch of
/// validated personas, falling back to templates when the model is
/// unavailable, and optionally illustrates them with generated avatars.
#[derive(Parser, Debug)]
#[command(name = "persona-forge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a batch of personas
    Generate(GenerateArgs),

    /// Validate persona JSON (one object or an array)
    Validate {
        /// File containing the persona(s)
        file: PathBuf,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Browse prompt templates
    Templates {
        #[command(subcommand)]
        subcommand: TemplatesSubcommand,
    },

    /// Browse institution contexts
    Institutions {
        #[command(subcommand)]
        subcommand: InstitutionsSubcommand,
    },

    /// Inspect and replay generation sessions
    Sessions {
        #[command(subcommand)]
        subcommand: SessionsSubcommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Marketing brief describing the target audience
    #[arg(long, required_unless_present = "brief_file", conflicts_with = "brief_file")]
    pub brief: Option<String>,

    /// Read the brief from a file
    #[arg(long)]
    pub brief_file: Option<PathBuf>,

    /// Institution id (defaults to generation.default_institution)
    #[arg(long)]
    pub institution: Option<String>,

    /// Program id; repeat for several programs
    #[arg(short, long = "program", required = true)]
    pub programs: Vec<String>,

    /// Number of personas to generate
    #[arg(short = 'n', long, default_value = "3")]
    pub count: usize,

    /// Intelligence level: basic, advanced, expert
    #[arg(long)]
    pub level: Option<IntelligenceLevel>,

    /// Prompt template id (see `templates list`)
    #[arg(long)]
    pub template: Option<String>,

    /// Backfill avatar images after saving
    #[arg(long)]
    pub images: bool,

    /// Use template personas only; no network calls
    #[arg(long)]
    pub offline: bool,

    /// Write the full report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, env = "PERSONA_FORGE_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TemplatesSubcommand {
    /// List built-in templates
    List {
        /// Only templates for this intelligence level
        #[arg(long)]
        level: Option<IntelligenceLevel>,
    },

    /// Show one template
    Show {
        /// Template id
        id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum InstitutionsSubcommand {
    /// List known institutions and their programs
    List {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_FORGE_CONFIG")]
        config: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionsSubcommand {
    /// List recorded sessions, newest first
    List {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_FORGE_CONFIG")]
        config: Option<String>,
    },

    /// Show one session
    Show {
        /// Session id
        id: String,

        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_FORGE_CONFIG")]
        config: Option<String>,
    },

    /// Generate again with a recorded session's request
    Replay {
        /// Session id
        id: String,

        /// Use template personas only; no network calls
        #[arg(long)]
        offline: bool,

        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_FORGE_CONFIG")]
        config: Option<String>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_FORGE_CONFIG")]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long, env = "PERSONA_FORGE_CONFIG")]
        config: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from([
            "persona-forge",
            "generate",
            "--brief",
            "Working supply chain staff",
            "--program",
            "scm",
        ]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.brief.as_deref(), Some("Working supply chain staff"));
                assert_eq!(args.programs, vec!["scm"]);
                assert_eq!(args.count, 3);
                assert!(args.level.is_none());
                assert!(!args.images);
                assert!(!args.offline);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_with_options() {
        let cli = Cli::parse_from([
            "persona-forge",
            "generate",
            "--brief-file",
            "brief.txt",
            "-p",
            "scm",
            "-p",
            "msl",
            "-n",
            "5",
            "--level",
            "expert",
            "--template",
            "executives-advanced",
            "--images",
            "--offline",
            "--output",
            "out.json",
        ]);
        match cli.command {
            Commands::Generate(args) => {
                assert!(args.brief.is_none());
                assert_eq!(args.brief_file, Some(PathBuf::from("brief.txt")));
                assert_eq!(args.programs, vec!["scm", "msl"]);
                assert_eq!(args.count, 5);
                assert_eq!(args.level, Some(IntelligenceLevel::Expert));
                assert_eq!(args.template.as_deref(), Some("executives-advanced"));
                assert!(args.images && args.offline);
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_requires_brief_and_program() {
        assert!(Cli::try_parse_from(["persona-forge", "generate", "--program", "scm"]).is_err());
        assert!(Cli::try_parse_from(["persona-forge", "generate", "--brief", "x"]).is_err());
        assert!(Cli::try_parse_from([
            "persona-forge",
            "generate",
            "--brief",
            "x",
            "--brief-file",
            "b.txt",
            "--program",
            "scm",
        ])
        .is_err());
    }

    #[test]
    fn test_bad_level_rejected() {
        assert!(Cli::try_parse_from(["persona-forge", "templates", "list", "--level", "genius"]).is_err());
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["persona-forge", "validate", "persona.json", "--json"]);
        match cli.command {
            Commands::Validate { file, json } => {
                assert_eq!(file, PathBuf::from("persona.json"));
                assert!(json);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_sessions_replay() {
        let cli = Cli::parse_from(["persona-forge", "sessions", "replay", "abc", "--offline"]);
        match cli.command {
            Commands::Sessions {
                subcommand: SessionsSubcommand::Replay { id, offline, .. },
            } => {
                assert_eq!(id, "abc");
                assert!(offline);
            }
            _ => panic!("Expected Sessions Replay command"),
        }
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["persona-forge", "-vv", "version"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["persona-forge", "config", "init", "--force"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
