//! `procdeck` - Offline procedure execution engine for simulated cockpits.

use clap::Parser;

use procdeck::cli::args::Cli;
use procdeck::cli::commands;
use procdeck::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    match commands::dispatch(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
