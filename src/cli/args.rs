//! CLI argument definitions.
//!
//! All clap derive structs for `procdeck` command-line parsing. Domain
//! enums ([`PresetTarget`], [`PhaseId`], [`LogFormat`]) stay clap-free;
//! they come in through `value_parser` functions instead.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::catalogue::PhaseId;
use crate::observability::LogFormat;
use crate::run::PresetTarget;

// ============================================================================
// Root CLI
// ============================================================================

/// Offline procedure execution engine for simulated cockpits.
#[derive(Parser, Debug)]
#[command(name = "procdeck", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "PROCDECK_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(
        long,
        default_value = "text",
        global = true,
        env = "PROCDECK_LOG_FORMAT",
        value_parser = parse_log_format
    )]
    pub log_format: LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect and validate procedure catalogues.
    Catalogue(CatalogueCommand),

    /// Execute a preset run against an in-memory variable store.
    Run(RunArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version and build information.
    Version(VersionArgs),
}

// ============================================================================
// Catalogue Command
// ============================================================================

/// Catalogue inspection commands.
#[derive(Args, Debug)]
pub struct CatalogueCommand {
    /// Catalogue subcommand.
    #[command(subcommand)]
    pub subcommand: CatalogueSubcommand,
}

/// Catalogue subcommands.
#[derive(Subcommand, Debug)]
pub enum CatalogueSubcommand {
    /// Validate catalogue files without running anything.
    Validate(CatalogueValidateArgs),

    /// List the phases and steps of a catalogue.
    List(CatalogueListArgs),
}

/// Arguments for `catalogue validate`.
#[derive(Args, Debug)]
pub struct CatalogueValidateArgs {
    /// Catalogue files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat validation warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `catalogue list`.
#[derive(Args, Debug)]
pub struct CatalogueListArgs {
    /// Catalogue file to inspect.
    #[arg(env = "PROCDECK_CATALOGUE")]
    pub file: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Run Command
// ============================================================================

/// Arguments for `run`.
#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("plan").multiple(false))]
pub struct RunArgs {
    /// Catalogue file to run.
    #[arg(env = "PROCDECK_CATALOGUE")]
    pub file: PathBuf,

    /// Seed file for the variable store (YAML maps of initial values).
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Preset to transition the aircraft to.
    #[arg(long, group = "plan", value_parser = parse_preset_target)]
    pub preset: Option<PresetTarget>,

    /// Preset the aircraft currently sits in.
    #[arg(
        long,
        default_value = "cold-and-dark",
        requires = "preset",
        value_parser = parse_preset_target
    )]
    pub from: PresetTarget,

    /// Explicit comma-separated phase list, instead of a preset.
    #[arg(long, group = "plan", value_delimiter = ',', value_parser = parse_phase_id)]
    pub phases: Option<Vec<PhaseId>>,

    /// Interval between engine ticks.
    #[arg(long, default_value = "100ms", value_parser = humantime::parse_duration)]
    pub tick_interval: Duration,

    /// Stop the run after this many ticks.
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Write the JSONL event stream to this file, or `-` for stdout.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Print the store's mutation journal after the run.
    #[arg(long)]
    pub journal: bool,

    /// Fail on reads of unseeded variables instead of defaulting to zero.
    #[arg(long)]
    pub strict_vars: bool,

    /// Serve Prometheus metrics on this localhost port during the run.
    #[arg(long, env = "PROCDECK_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Value Parsers
// ============================================================================

fn parse_preset_target(s: &str) -> Result<PresetTarget, String> {
    PresetTarget::parse(s).ok_or_else(|| {
        let valid: Vec<&str> = PresetTarget::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown preset '{s}' (valid: {})", valid.join(", "))
    })
}

fn parse_phase_id(s: &str) -> Result<PhaseId, String> {
    PhaseId::parse(s).ok_or_else(|| {
        let valid: Vec<&str> = PhaseId::ALL.iter().map(|p| p.as_str()).collect();
        format!("unknown phase '{s}' (valid: {})", valid.join(", "))
    })
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    match s {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(format!("unknown log format '{other}' (valid: text, json)")),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_preset() {
        let cli = Cli::try_parse_from([
            "procdeck",
            "run",
            "cat.yaml",
            "--preset",
            "ready-for-taxi",
        ]);
        assert!(cli.is_ok(), "Failed to parse: {cli:?}");
    }

    #[test]
    fn test_run_from_defaults_to_cold_and_dark() {
        let cli = Cli::try_parse_from([
            "procdeck",
            "run",
            "cat.yaml",
            "--preset",
            "powered",
        ])
        .unwrap();

        if let Commands::Run(args) = cli.command {
            assert_eq!(args.from, PresetTarget::ColdAndDark);
            assert_eq!(args.preset, Some(PresetTarget::Powered));
            return;
        }
        panic!("Expected RunArgs");
    }

    #[test]
    fn test_run_from_requires_preset() {
        let cli = Cli::try_parse_from(["procdeck", "run", "cat.yaml", "--from", "powered"]);
        assert!(cli.is_err(), "Expected --from to require --preset");
    }

    #[test]
    fn test_preset_and_phases_mutually_exclusive() {
        let cli = Cli::try_parse_from([
            "procdeck",
            "run",
            "cat.yaml",
            "--preset",
            "powered",
            "--phases",
            "power_on",
        ]);
        assert!(cli.is_err(), "Expected mutual exclusion error");
    }

    #[test]
    fn test_phases_comma_list() {
        let cli = Cli::try_parse_from([
            "procdeck",
            "run",
            "cat.yaml",
            "--phases",
            "power_on,pushback_on,taxi_on",
        ])
        .unwrap();

        if let Commands::Run(args) = cli.command {
            assert_eq!(
                args.phases,
                Some(vec![
                    PhaseId::PowerOn,
                    PhaseId::PushbackOn,
                    PhaseId::TaxiOn
                ])
            );
            return;
        }
        panic!("Expected RunArgs");
    }

    #[test]
    fn test_unknown_phase_rejected() {
        let cli = Cli::try_parse_from(["procdeck", "run", "cat.yaml", "--phases", "warp_on"]);
        assert!(cli.is_err(), "Expected unknown phase error");
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let cli = Cli::try_parse_from(["procdeck", "run", "cat.yaml", "--preset", "airborne"]);
        assert!(cli.is_err(), "Expected unknown preset error");
    }

    #[test]
    fn test_tick_interval_humantime() {
        let cli = Cli::try_parse_from([
            "procdeck",
            "run",
            "cat.yaml",
            "--preset",
            "powered",
            "--tick-interval",
            "250ms",
        ])
        .unwrap();

        if let Commands::Run(args) = cli.command {
            assert_eq!(args.tick_interval, Duration::from_millis(250));
            return;
        }
        panic!("Expected RunArgs");
    }

    #[test]
    fn test_tick_interval_default() {
        let cli =
            Cli::try_parse_from(["procdeck", "run", "cat.yaml", "--preset", "powered"]).unwrap();

        if let Commands::Run(args) = cli.command {
            assert_eq!(args.tick_interval, Duration::from_millis(100));
            return;
        }
        panic!("Expected RunArgs");
    }

    #[test]
    fn test_log_format_parses() {
        for (value, expected) in [("text", LogFormat::Text), ("json", LogFormat::Json)] {
            let cli = Cli::try_parse_from([
                "procdeck",
                "--log-format",
                value,
                "version",
            ])
            .unwrap();
            assert_eq!(cli.log_format, expected);
        }
    }

    #[test]
    fn test_log_format_rejects_unknown() {
        let cli = Cli::try_parse_from(["procdeck", "--log-format", "xml", "version"]);
        assert!(cli.is_err(), "Expected unknown log format error");
    }

    #[test]
    fn test_catalogue_validate_requires_files() {
        let result = Cli::try_parse_from(["procdeck", "catalogue", "validate"]);
        assert!(result.is_err(), "Expected error for missing files");
    }

    #[test]
    fn test_catalogue_validate_strict_flag() {
        let cli =
            Cli::try_parse_from(["procdeck", "catalogue", "validate", "a.yaml", "--strict"])
                .unwrap();

        if let Commands::Catalogue(cmd) = cli.command {
            if let CatalogueSubcommand::Validate(args) = cmd.subcommand {
                assert!(args.strict);
                assert_eq!(args.files, vec![PathBuf::from("a.yaml")]);
                return;
            }
        }
        panic!("Expected CatalogueValidateArgs");
    }

    #[test]
    fn test_help_output() {
        let result = Cli::try_parse_from(["procdeck", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let result = Cli::try_parse_from(["procdeck", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_color_choices_parse() {
        for variant in ["auto", "always", "never"] {
            let cli = Cli::try_parse_from(["procdeck", "--color", variant, "version"]);
            assert!(cli.is_ok(), "Failed to parse color={variant}");
        }
    }

    #[test]
    fn test_completions_shells_parse() {
        for shell in ["bash", "zsh", "fish", "powershell", "elvish"] {
            let cli = Cli::try_parse_from(["procdeck", "completions", shell]);
            assert!(cli.is_ok(), "Failed to parse shell={shell}");
        }
    }

    #[test]
    fn test_verbose_count() {
        let cli = Cli::try_parse_from(["procdeck", "-vvv", "version"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_quiet_flag() {
        let cli = Cli::try_parse_from(["procdeck", "--quiet", "version"]).unwrap();
        assert!(cli.quiet);
    }
}
