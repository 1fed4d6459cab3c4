//! CLI command dispatch and handlers.
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod catalogue;
pub mod completions;
pub mod run;
pub mod version;

use crate::cli::args::{CatalogueSubcommand, Cli, Commands};
use crate::error::{ExitCode, ProcdeckError};

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// Returns the process exit code on success; command errors carry their
/// own exit code mapping.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<i32, ProcdeckError> {
    match cli.command {
        Commands::Catalogue(cmd) => match cmd.subcommand {
            CatalogueSubcommand::Validate(args) => {
                catalogue::validate(&args).map(|()| ExitCode::SUCCESS)
            }
            CatalogueSubcommand::List(args) => catalogue::list(&args).map(|()| ExitCode::SUCCESS),
        },
        Commands::Run(args) => run::run(&args).await,
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(ExitCode::SUCCESS)
        }
    }
}
