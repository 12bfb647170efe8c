//! Inventory description commands

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use std::path::PathBuf;

use agi_resource::{Placement, ResourceKind, read_description, write_description};

use crate::game::{Game, GameOptions};
use crate::interchange::{
    TextSource, TranslationRow, into_visual_order, read_rows, translations, write_rows,
};
use crate::utils::create_progress_bar;

#[derive(Subcommand)]
pub enum ViewCommands {
    /// Export inventory descriptions to a translation spreadsheet
    Export {
        /// Path to the game directory
        game: PathBuf,

        /// CSV file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write translated descriptions back into the views
    Import {
        /// Path to the game directory
        game: PathBuf,

        /// CSV file with translations
        input: PathBuf,

        /// Fail instead of growing a view whose description gets longer
        #[arg(long)]
        in_place: bool,

        /// Store right-to-left text in visual order
        #[arg(long)]
        visual: bool,
    },
}

pub fn execute(command: ViewCommands, options: &GameOptions) -> Result<()> {
    match command {
        ViewCommands::Export { game, output } => execute_export(game, output, options),
        ViewCommands::Import {
            game,
            input,
            in_place,
            visual,
        } => execute_import(game, input, in_place, visual, options),
    }
}

/// Spreadsheet rows for every view with a description
pub(crate) fn description_rows(game: &Game) -> Result<Vec<TranslationRow>> {
    let numbers: Vec<usize> = game
        .directory(ResourceKind::View)
        .iter_present()
        .map(|(number, _, _)| number)
        .collect();

    let mut rows = Vec::new();
    let pb = create_progress_bar(numbers.len() as u64, "Reading views");
    for number in numbers {
        if let Some(resource) = game.read_resource(ResourceKind::View, number)? {
            let description = read_description(resource.payload(), game.charset())
                .with_context(|| format!("Failed to read the description of view {number}"))?;
            if let Some(description) = description {
                rows.push(TranslationRow::new(
                    TextSource::View(number),
                    0,
                    description.text,
                ));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(rows)
}

fn execute_export(path: PathBuf, output: PathBuf, options: &GameOptions) -> Result<()> {
    let game = Game::open(&path, options)?;
    let rows = description_rows(&game)?;

    write_rows(&output, &rows)?;
    println!(
        "Exported {} descriptions to {}",
        rows.len(),
        style(output.display()).cyan()
    );
    Ok(())
}

fn execute_import(
    path: PathBuf,
    input: PathBuf,
    in_place: bool,
    visual: bool,
    options: &GameOptions,
) -> Result<()> {
    let mut game = Game::open(&path, options)?;
    let mut grouped = translations(&read_rows(&input)?)?;
    if visual {
        grouped = into_visual_order(grouped);
    }
    let placement = if in_place {
        Placement::InPlace
    } else {
        Placement::Auto
    };

    let mut payloads = Vec::new();
    for (source, texts) in grouped {
        let TextSource::View(number) = source else {
            continue;
        };
        let Some(text) = texts.get(&0) else {
            log::warn!("view {number}: only index 0 holds a description");
            continue;
        };

        let resource = game
            .read_resource(ResourceKind::View, number)?
            .with_context(|| format!("view {number} is not in the directory"))?;
        let payload = write_description(resource.payload(), text, game.charset(), placement)
            .with_context(|| format!("Failed to write the description of view {number}"))?;
        payloads.push((number, payload));
    }

    let numbers: Vec<usize> = payloads.iter().map(|(number, _)| *number).collect();
    let outcomes = game.write_payloads(ResourceKind::View, payloads)?;
    for (number, outcome) in numbers.iter().zip(&outcomes) {
        log::info!("view {number} stored at {:#x}", outcome.offset());
    }
    let updated = outcomes.len();

    println!("{} Updated {updated} descriptions", style("✓").green());
    Ok(())
}
