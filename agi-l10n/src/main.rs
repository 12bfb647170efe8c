//! Main entry point for the agi-l10n CLI

mod cli;
mod commands;
mod game;
mod interchange;
mod utils;

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::{Generator, generate};
use std::io;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match (cli.verbose, cli.quiet) {
        (0, true) => "error",
        (0, false) => "warn",
        (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Commands::Completions { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let options = cli.game_options()?;

    match cli.command {
        Commands::Dir { command } => commands::dir::execute(command, &options),
        Commands::Vol { command } => commands::vol::execute(command, &options),
        Commands::Logic { command } => commands::logic::execute(command, &options),
        Commands::Object { command } => commands::object::execute(command, &options),
        Commands::Words { command } => commands::words::execute(command, &options),
        Commands::View { command } => commands::view::execute(command, &options),
        Commands::Check { command } => commands::check::execute(command, &options),
        Commands::Patch { command } => commands::patch::execute(command),
        Commands::Completions { .. } => Ok(()),
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
