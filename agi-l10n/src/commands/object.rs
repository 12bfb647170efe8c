//! Inventory object commands

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use console::style;
use std::collections::BTreeMap;
use std::path::PathBuf;

use agi_resource::fs::replace_atomically;
use agi_resource::{ObjectOptions, ObjectTable, Platform};

use crate::game::{Game, GameOptions};
use crate::interchange::{
    TextSource, TranslationRow, into_visual_order, read_rows, translations, write_rows,
};

pub(crate) const OBJECT_FILE: &str = "OBJECT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Dos,
    Amiga,
}

impl From<PlatformArg> for Platform {
    fn from(platform: PlatformArg) -> Self {
        match platform {
            PlatformArg::Dos => Platform::Dos,
            PlatformArg::Amiga => Platform::Amiga,
        }
    }
}

#[derive(Subcommand)]
pub enum ObjectCommands {
    /// Export inventory object names to a translation spreadsheet
    Export {
        /// Path to the game directory
        game: PathBuf,

        /// CSV file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Record layout of the OBJECT file
        #[arg(long, value_enum, default_value = "dos")]
        platform: PlatformArg,
    },

    /// Write translated object names back into OBJECT
    Import {
        /// Path to the game directory
        game: PathBuf,

        /// CSV file with translations
        input: PathBuf,

        /// Record layout of the OBJECT file
        #[arg(long, value_enum, default_value = "dos")]
        platform: PlatformArg,

        /// Let the file grow up to this many bytes
        #[arg(long)]
        capacity: Option<usize>,

        /// Store right-to-left text in visual order
        #[arg(long)]
        visual: bool,
    },
}

pub fn execute(command: ObjectCommands, options: &GameOptions) -> Result<()> {
    match command {
        ObjectCommands::Export {
            game,
            output,
            platform,
        } => execute_export(game, output, platform.into(), options),
        ObjectCommands::Import {
            game,
            input,
            platform,
            capacity,
            visual,
        } => execute_import(game, input, platform.into(), capacity, visual, options),
    }
}

fn object_options(platform: Platform) -> ObjectOptions {
    ObjectOptions {
        platform,
        encrypted: None,
    }
}

pub(crate) fn load_objects(game: &Game, platform: Platform) -> Result<ObjectTable> {
    let file = game.file_path(OBJECT_FILE);
    let data = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    ObjectTable::decode(&data, game.charset(), &object_options(platform))
        .with_context(|| format!("Failed to parse {}", file.display()))
}

/// Spreadsheet rows for named objects; `?` marks an unused slot
pub(crate) fn object_rows(table: &ObjectTable) -> Vec<TranslationRow> {
    table
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.name != "?")
        .map(|(index, entry)| {
            let index = u16::try_from(index).unwrap_or(u16::MAX);
            TranslationRow::new(TextSource::Object, index, entry.name.clone())
                .with_comment(format!("room {}", entry.start_room))
        })
        .collect()
}

/// Apply renames to a table the way import does
pub(crate) fn rename_objects(
    mut table: ObjectTable,
    names: &BTreeMap<u16, String>,
    capacity: Option<usize>,
) -> agi_resource::Result<ObjectTable> {
    if let Some(capacity) = capacity {
        table = table.with_capacity(capacity);
    }
    for (index, name) in names {
        table.rename(usize::from(*index), name.as_str())?;
    }
    Ok(table)
}

fn execute_export(
    path: PathBuf,
    output: PathBuf,
    platform: Platform,
    options: &GameOptions,
) -> Result<()> {
    let game = Game::open(&path, options)?;
    let table = load_objects(&game, platform)?;
    let rows = object_rows(&table);

    write_rows(&output, &rows)?;
    println!(
        "Exported {} of {} objects to {}",
        rows.len(),
        table.len(),
        style(output.display()).cyan()
    );
    Ok(())
}

fn execute_import(
    path: PathBuf,
    input: PathBuf,
    platform: Platform,
    capacity: Option<usize>,
    visual: bool,
    options: &GameOptions,
) -> Result<()> {
    let game = Game::open(&path, options)?;
    let mut grouped = translations(&read_rows(&input)?)?;
    if visual {
        grouped = into_visual_order(grouped);
    }
    let Some(names) = grouped.get(&TextSource::Object) else {
        println!("No object translations in {}", input.display());
        return Ok(());
    };

    let file = game.file_path(OBJECT_FILE);
    let charset = *game.charset();
    let changed = replace_atomically(&file, |data| -> Result<Vec<u8>> {
        let table = ObjectTable::decode(data, &charset, &object_options(platform))?;
        let table = rename_objects(table, names, capacity)?;
        Ok(table.encode(&charset)?)
    })
    .with_context(|| format!("Failed to update {}", file.display()))?;

    if changed {
        println!(
            "{} Renamed {} objects in {}",
            style("✓").green(),
            names.len(),
            style(file.display()).cyan()
        );
    } else {
        println!("{} already matches the translation", file.display());
    }
    Ok(())
}
