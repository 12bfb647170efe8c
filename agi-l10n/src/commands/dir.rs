//! Resource directory commands

use anyhow::{Result, bail};
use clap::Subcommand;
use console::style;
use std::path::PathBuf;

use crate::commands::{KindArg, selected_kinds};
use crate::game::{Game, GameOptions};
use crate::utils::{add_table_row, create_table, format_bytes, format_offset};

#[derive(Subcommand)]
pub enum DirCommands {
    /// List the resources a game's directories point at
    List {
        /// Path to the game directory
        game: PathBuf,

        /// Only list one kind of resource
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Check that every entry points inside an existing volume
    Validate {
        /// Path to the game directory
        game: PathBuf,
    },
}

pub fn execute(command: DirCommands, options: &GameOptions) -> Result<()> {
    match command {
        DirCommands::List { game, kind } => execute_list(game, kind, options),
        DirCommands::Validate { game } => execute_validate(game, options),
    }
}

fn execute_list(path: PathBuf, kind: Option<KindArg>, options: &GameOptions) -> Result<()> {
    let game = Game::open(&path, options)?;

    let mut table = create_table(&["Kind", "Number", "Volume", "Offset"]);
    let mut count = 0;
    for kind in selected_kinds(kind) {
        for (number, volume, offset) in game.directory(kind).iter_present() {
            add_table_row(
                &mut table,
                vec![
                    kind.to_string(),
                    number.to_string(),
                    volume.to_string(),
                    format_offset(offset),
                ],
            );
            count += 1;
        }
    }

    if count == 0 {
        println!("No resources found in {}", path.display());
        return Ok(());
    }
    table.printstd();
    println!("\n{count} resources");
    Ok(())
}

fn execute_validate(path: PathBuf, options: &GameOptions) -> Result<()> {
    let game = Game::open(&path, options)?;
    let lengths = game.volume_lengths()?;

    for (number, length) in lengths.iter().enumerate() {
        log::info!(
            "Volume {number}: {}",
            format_bytes(u64::try_from(*length).unwrap_or(u64::MAX))
        );
    }

    let mut failures = Vec::new();
    for kind in selected_kinds(None) {
        match game.directory(kind).validate_against(&lengths) {
            Ok(()) => println!(
                "{} {} directory: {} entries",
                style("✓").green(),
                kind,
                game.directory(kind).iter_present().count()
            ),
            Err(err) => {
                println!("{} {} directory: {err}", style("✗").red(), kind);
                failures.push(kind);
            }
        }
    }

    if !failures.is_empty() {
        bail!("Validation failed for {} directories", failures.len());
    }
    println!(
        "✓ Game '{}' is consistent",
        style(path.display()).cyan()
    );
    Ok(())
}
