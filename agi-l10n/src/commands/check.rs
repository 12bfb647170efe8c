//! Audits of a translated game

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use console::style;
use std::collections::BTreeMap;
use std::path::PathBuf;

use agi_resource::{
    LengthCheck, Platform, ResourceKind, compare_lengths, is_untranslated, read_description,
};

use crate::commands::logic::{all_message_rows, stage_logic};
use crate::commands::object::{
    OBJECT_FILE, PlatformArg, load_objects, object_rows, rename_objects,
};
use crate::commands::view::description_rows;
use crate::game::{Game, GameOptions};
use crate::interchange::{TextSource, TranslationRow, read_rows, translations, write_rows};
use crate::utils::{add_table_row, create_table, truncate_text};

#[derive(Subcommand)]
pub enum CheckCommands {
    /// Find text that is still in the source language
    Untranslated {
        /// Path to the game directory
        game: PathBuf,

        /// Also write the flagged text to a translation spreadsheet
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Record layout of the OBJECT file
        #[arg(long, value_enum, default_value = "dos")]
        platform: PlatformArg,

        /// Messages are stored without the XOR obfuscation
        #[arg(long)]
        plain_messages: bool,
    },

    /// Compare translation lengths with the originals and check they fit
    Lengths {
        /// Path to the game directory
        game: PathBuf,

        /// CSV file with translations
        input: PathBuf,

        /// Translations allowed to be longer than their originals
        #[arg(long, default_value_t = 0)]
        max_violations: usize,

        /// Record layout of the OBJECT file
        #[arg(long, value_enum, default_value = "dos")]
        platform: PlatformArg,

        /// Let the OBJECT file grow up to this many bytes
        #[arg(long)]
        capacity: Option<usize>,

        /// Messages are stored without the XOR obfuscation
        #[arg(long)]
        plain_messages: bool,
    },
}

pub fn execute(command: CheckCommands, options: &GameOptions) -> Result<()> {
    match command {
        CheckCommands::Untranslated {
            game,
            output,
            platform,
            plain_messages,
        } => execute_untranslated(game, output, platform.into(), plain_messages, options),
        CheckCommands::Lengths {
            game,
            input,
            max_violations,
            platform,
            capacity,
            plain_messages,
        } => execute_lengths(
            game,
            input,
            max_violations,
            platform.into(),
            capacity,
            plain_messages,
            options,
        ),
    }
}

fn execute_untranslated(
    path: PathBuf,
    output: Option<PathBuf>,
    platform: Platform,
    plain_messages: bool,
    options: &GameOptions,
) -> Result<()> {
    let game = Game::open(&path, options)?;

    let mut rows = all_message_rows(&game, plain_messages)?;
    if game.file_path(OBJECT_FILE).is_file() {
        rows.extend(object_rows(&load_objects(&game, platform)?));
    } else {
        log::warn!("No {OBJECT_FILE} file, skipping inventory names");
    }
    rows.extend(description_rows(&game)?);

    let total = rows.len();
    let flagged: Vec<TranslationRow> = rows
        .into_iter()
        .filter(|row| is_untranslated(&row.original))
        .collect();

    if flagged.is_empty() {
        println!("{} All {total} texts are translated", style("✓").green());
        return Ok(());
    }

    let mut table = create_table(&["Resource", "Index", "Text"]);
    for row in &flagged {
        add_table_row(
            &mut table,
            vec![
                row.resource.clone(),
                row.index.to_string(),
                truncate_text(&row.original, 60),
            ],
        );
    }
    table.printstd();

    if let Some(output) = output {
        write_rows(&output, &flagged)?;
        println!("Wrote the flagged text to {}", style(output.display()).cyan());
    }
    bail!("{} of {total} texts are still untranslated", flagged.len());
}

/// A translation that cannot be imported as it stands
#[derive(Debug)]
struct Misfit {
    source: TextSource,
    problem: String,
}

/// Rows whose translation is longer than the original
fn longer_rows<'a>(
    rows: &'a [TranslationRow],
    game: &Game,
) -> Result<Vec<(&'a TranslationRow, LengthCheck)>> {
    let mut longer = Vec::new();
    for row in rows.iter().filter(|row| !row.translation.is_empty()) {
        let check = compare_lengths(&row.original, &row.translation, game.charset())
            .with_context(|| format!("{} #{}", row.resource, row.index))?;
        if check.is_longer() {
            longer.push((row, check));
        }
    }
    Ok(longer)
}

/// Try every translated container in memory and collect the ones that do not fit
fn misfits(
    game: &Game,
    grouped: BTreeMap<TextSource, BTreeMap<u16, String>>,
    platform: Platform,
    capacity: Option<usize>,
    plain_messages: bool,
) -> Result<Vec<Misfit>> {
    let mut found = Vec::new();
    for (source, texts) in grouped {
        let problem = match source {
            TextSource::Logic(number) => stage_logic(game, number, texts, plain_messages)
                .err()
                .map(|err| format!("{err:#}")),
            TextSource::Object => {
                let table = load_objects(game, platform)?;
                rename_objects(table, &texts, capacity)
                    .and_then(|table| table.encode(game.charset()))
                    .err()
                    .map(|err| err.to_string())
            }
            TextSource::View(number) => {
                view_growth(game, number, &texts)?;
                None
            }
        };
        if let Some(problem) = problem {
            found.push(Misfit { source, problem });
        }
    }
    Ok(found)
}

/// Descriptions longer than their slot move the view to the end of a volume
fn view_growth(game: &Game, number: usize, texts: &BTreeMap<u16, String>) -> Result<()> {
    let Some(text) = texts.get(&0) else {
        return Ok(());
    };
    let resource = game
        .read_resource(ResourceKind::View, number)?
        .with_context(|| format!("view {number} is not in the directory"))?;
    let slot = read_description(resource.payload(), game.charset())?
        .map_or(0, |description| description.capacity);
    let needed = game.charset().encode(text)?.len();
    if needed > slot {
        log::info!("view {number}: description needs {needed} bytes of {slot}, the view will move");
    }
    Ok(())
}

fn execute_lengths(
    path: PathBuf,
    input: PathBuf,
    max_violations: usize,
    platform: Platform,
    capacity: Option<usize>,
    plain_messages: bool,
    options: &GameOptions,
) -> Result<()> {
    let game = Game::open(&path, options)?;
    let rows = read_rows(&input)?;

    let longer = longer_rows(&rows, &game)?;
    if !longer.is_empty() {
        let mut table = create_table(&["Resource", "Index", "Original", "Translated", "Over"]);
        for (row, check) in &longer {
            add_table_row(
                &mut table,
                vec![
                    row.resource.clone(),
                    row.index.to_string(),
                    check.original.to_string(),
                    check.translated.to_string(),
                    format!("+{}", check.excess()),
                ],
            );
        }
        table.printstd();
    }

    let misfits = misfits(&game, translations(&rows)?, platform, capacity, plain_messages)?;
    for misfit in &misfits {
        println!("{} {}: {}", style("✗").red(), misfit.source, misfit.problem);
    }

    println!(
        "{} of {} translations are longer than their originals (limit {max_violations})",
        longer.len(),
        rows.iter().filter(|row| !row.translation.is_empty()).count()
    );

    if !misfits.is_empty() {
        bail!("{} resources cannot take their translation", misfits.len());
    }
    if longer.len() > max_violations {
        bail!(
            "{} translations are longer than their originals, {max_violations} allowed",
            longer.len()
        );
    }
    println!("{} All translations fit", style("✓").green());
    Ok(())
}
