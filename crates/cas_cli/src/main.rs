//! dae_equiv: decide whether two DAE equation groups describe the same model.

mod commands;
mod config;
mod input;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::batch::{self, BatchArgs};
use crate::commands::compare::{self, CompareArgs};
use crate::config::DaeEquivConfig;

#[derive(Parser, Debug)]
#[command(name = "dae_equiv", version, about = "Equivalence judge for DAE equation groups")]
struct Cli {
    /// Config file (default: ./dae_equiv.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two equation group files
    Compare(CompareArgs),
    /// Run every case of a manifest
    Batch(BatchArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = DaeEquivConfig::load(cli.config.as_deref());

    let result = match cli.command {
        Command::Compare(args) => compare::run(args, &config).map(|()| ExitCode::SUCCESS),
        Command::Batch(args) => batch::run(args, &config).map(|summary| {
            if summary.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}
