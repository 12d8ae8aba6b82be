use std::process::ExitCode;

use beamcmp_cli::{Cli, Commands};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

use crate::commands::util::configure_threads;
use crate::commands::{compare, derive};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.max_level())
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a global tracing subscriber was already installed");
    }

    let threads = configure_threads(&cli.threads);
    info!(threads, "beamcmp {}", env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Commands::Compare(args) => compare::handle(args),
        Commands::Derive { input, out } => derive::handle(input, out),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
