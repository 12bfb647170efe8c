//! Logic message commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use console::style;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use agi_resource::fs::run_batch;
use agi_resource::{
    Dictionary, LogicOptions, LogicScript, ResourceKind, UsageKind, VolumeResource, WriteOutcome,
    check_references, extract_messages, inject_messages, scan_said_tests, text_report,
};

use crate::commands::words::load_dictionary;
use crate::game::{Game, GameOptions};
use crate::interchange::{
    TextSource, TranslationRow, into_visual_order, read_rows, translations, write_rows,
};
use crate::utils::{add_table_row, create_progress_bar, create_table, truncate_text};

#[derive(Subcommand)]
pub enum LogicCommands {
    /// Export logic messages to a translation spreadsheet
    Export {
        /// Path to the game directory
        game: PathBuf,

        /// CSV file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Only export one logic
        #[arg(short, long)]
        number: Option<usize>,

        /// Messages are stored without the XOR obfuscation
        #[arg(long)]
        plain_messages: bool,
    },

    /// Write translated messages back into the volumes
    Import {
        /// Path to the game directory
        game: PathBuf,

        /// CSV file with translations
        input: PathBuf,

        /// Store right-to-left text in visual order
        #[arg(long)]
        visual: bool,

        /// Messages are stored without the XOR obfuscation
        #[arg(long)]
        plain_messages: bool,
    },

    /// Show which commands display each message of a logic
    Refs {
        /// Path to the game directory
        game: PathBuf,

        /// Logic number
        number: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Messages are stored without the XOR obfuscation
        #[arg(long)]
        plain_messages: bool,
    },

    /// List the phrases matched by `said` tests and the logics using them
    Said {
        /// Path to the game directory
        game: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Messages are stored without the XOR obfuscation
        #[arg(long)]
        plain_messages: bool,
    },
}

pub fn execute(command: LogicCommands, options: &GameOptions) -> Result<()> {
    match command {
        LogicCommands::Export {
            game,
            output,
            number,
            plain_messages,
        } => execute_export(game, output, number, plain_messages, options),
        LogicCommands::Import {
            game,
            input,
            visual,
            plain_messages,
        } => execute_import(game, input, visual, plain_messages, options),
        LogicCommands::Refs {
            game,
            number,
            json,
            plain_messages,
        } => execute_refs(game, number, json, plain_messages, options),
        LogicCommands::Said {
            game,
            json,
            plain_messages,
        } => execute_said(game, json, plain_messages, options),
    }
}

/// Compressed v3 logics keep their messages in the clear
fn logic_options(game: &Game, resource: &VolumeResource, plain_messages: bool) -> LogicOptions {
    LogicOptions::new(*game.charset()).with_encryption(!plain_messages && !resource.is_compressed())
}

fn decode_logic(
    game: &Game,
    number: usize,
    plain_messages: bool,
) -> Result<(VolumeResource, LogicScript)> {
    let resource = game
        .read_resource(ResourceKind::Logic, number)?
        .with_context(|| format!("logic {number} is not in the directory"))?;
    let options = logic_options(game, &resource, plain_messages);
    let script = LogicScript::decode(resource.payload(), &options)
        .with_context(|| format!("Failed to decode logic {number}"))?;
    Ok((resource, script))
}

/// Spreadsheet rows for one logic, noting messages no command names
fn logic_rows(game: &Game, number: usize, plain_messages: bool) -> Result<Vec<TranslationRow>> {
    let (_, script) = decode_logic(game, number, plain_messages)?;
    let source = TextSource::Logic(number);

    let rows = match text_report(&script) {
        Ok(report) => report
            .into_iter()
            .map(|usage| {
                let row = TranslationRow::new(source, u16::from(usage.number), usage.text);
                match usage.kind {
                    UsageKind::Referenced => row,
                    UsageKind::FreeFloating => row.with_comment("not referenced directly"),
                }
            })
            .collect(),
        Err(err) => {
            log::warn!("logic {number}: cannot scan bytecode ({err}), exporting messages only");
            extract_messages(&script)
                .into_iter()
                .map(|(index, text)| TranslationRow::new(source, u16::from(index), text))
                .collect()
        }
    };
    Ok(rows)
}

fn logic_numbers(game: &Game) -> Vec<usize> {
    game.directory(ResourceKind::Logic)
        .iter_present()
        .map(|(number, _, _)| number)
        .collect()
}

/// Spreadsheet rows for the given logics, read in parallel
pub(crate) fn message_rows(
    game: &Game,
    numbers: Vec<usize>,
    plain_messages: bool,
) -> Result<Vec<TranslationRow>> {
    let pb = create_progress_bar(numbers.len() as u64, "Reading logics");
    let results = run_batch(numbers, |number| -> Result<Vec<TranslationRow>> {
        let rows = logic_rows(game, number, plain_messages)?;
        pb.inc(1);
        Ok(rows)
    });
    pb.finish_and_clear();

    let mut rows = Vec::new();
    for result in results {
        rows.extend(result?);
    }
    Ok(rows)
}

/// Spreadsheet rows for every logic in the directory
pub(crate) fn all_message_rows(game: &Game, plain_messages: bool) -> Result<Vec<TranslationRow>> {
    message_rows(game, logic_numbers(game), plain_messages)
}

fn execute_export(
    path: PathBuf,
    output: PathBuf,
    number: Option<usize>,
    plain_messages: bool,
    options: &GameOptions,
) -> Result<()> {
    let game = Game::open(&path, options)?;
    let numbers = match number {
        Some(number) => vec![number],
        None => logic_numbers(&game),
    };
    let rows = message_rows(&game, numbers, plain_messages)?;

    write_rows(&output, &rows)?;
    println!(
        "Exported {} messages to {}",
        rows.len(),
        style(output.display()).cyan()
    );
    Ok(())
}

/// A translated logic ready to be written
pub(crate) struct StagedLogic {
    pub(crate) number: usize,
    pub(crate) messages: usize,
    pub(crate) before: usize,
    pub(crate) payload: Vec<u8>,
}

/// Inject translations into a logic without writing it
pub(crate) fn stage_logic(
    game: &Game,
    number: usize,
    texts: BTreeMap<u16, String>,
    plain_messages: bool,
) -> Result<StagedLogic> {
    let (resource, script) = decode_logic(game, number, plain_messages)?;
    let replacements = texts
        .into_iter()
        .map(|(index, text)| -> Result<(u8, String)> {
            let index = u8::try_from(index)
                .with_context(|| format!("logic {number}: message {index} out of range"))?;
            Ok((index, text))
        })
        .collect::<Result<BTreeMap<u8, String>>>()?;

    let updated = inject_messages(&script, &replacements)
        .with_context(|| format!("Failed to inject messages into logic {number}"))?;
    let payload = updated
        .encode()
        .with_context(|| format!("Failed to encode logic {number}"))?;
    Ok(StagedLogic {
        number,
        messages: replacements.len(),
        before: resource.payload().len(),
        payload,
    })
}

fn execute_import(
    path: PathBuf,
    input: PathBuf,
    visual: bool,
    plain_messages: bool,
    options: &GameOptions,
) -> Result<()> {
    let mut game = Game::open(&path, options)?;
    let mut grouped = translations(&read_rows(&input)?)?;
    if visual {
        grouped = into_visual_order(grouped);
    }

    // Nothing is written unless every logic takes its translation
    let mut staged = Vec::new();
    for (source, texts) in grouped {
        let TextSource::Logic(number) = source else {
            log::debug!("Skipping {source} rows");
            continue;
        };
        staged.push(stage_logic(&game, number, texts, plain_messages)?);
    }

    if staged.is_empty() {
        println!("No logic translations in {}", input.display());
        return Ok(());
    }

    let payloads = staged
        .iter()
        .map(|logic| (logic.number, logic.payload.clone()))
        .collect();
    let outcomes = game.write_payloads(ResourceKind::Logic, payloads)?;

    let mut table = create_table(&["Logic", "Messages", "Before", "After", "Placement"]);
    for (logic, outcome) in staged.iter().zip(&outcomes) {
        add_table_row(
            &mut table,
            vec![
                logic.number.to_string(),
                logic.messages.to_string(),
                logic.before.to_string(),
                logic.payload.len().to_string(),
                placement(outcome),
            ],
        );
    }
    table.printstd();
    println!("{} Updated {} logics", style("✓").green(), staged.len());
    Ok(())
}

fn placement(outcome: &WriteOutcome) -> String {
    match outcome {
        WriteOutcome::InPlace { .. } => "in place".to_string(),
        WriteOutcome::Relocated { old_offset, offset } => {
            format!("moved {old_offset:#x} -> {offset:#x}")
        }
    }
}

fn execute_refs(
    path: PathBuf,
    number: usize,
    json: bool,
    plain_messages: bool,
    options: &GameOptions,
) -> Result<()> {
    let game = Game::open(&path, options)?;
    let (_, script) = decode_logic(&game, number, plain_messages)?;
    let report = text_report(&script)
        .with_context(|| format!("Failed to scan logic {number}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let mut table = create_table(&["Message", "Used by", "Text"]);
        for usage in &report {
            let used_by = match usage.kind {
                UsageKind::Referenced => usage
                    .references
                    .iter()
                    .map(|offset| format!("{offset:#06x}"))
                    .collect::<Vec<_>>()
                    .join(" "),
                UsageKind::FreeFloating => style("free-floating").yellow().to_string(),
            };
            add_table_row(
                &mut table,
                vec![usage.number.to_string(), used_by, truncate_text(&usage.text, 50)],
            );
        }
        table.printstd();
    }

    if let Err(err) = check_references(&script) {
        bail!("logic {number}: {err}");
    }
    Ok(())
}

/// A parser phrase and where it is tested
#[derive(Debug, Serialize)]
struct SaidPhrase {
    groups: Vec<u16>,
    /// First word of each group, `None` for groups missing from the dictionary
    words: Vec<Option<String>>,
    logics: BTreeSet<usize>,
}

fn said_phrases(
    tests: BTreeMap<Vec<u16>, BTreeSet<usize>>,
    dictionary: Option<&Dictionary>,
) -> Vec<SaidPhrase> {
    tests
        .into_iter()
        .map(|(groups, logics)| {
            let words = groups
                .iter()
                .map(|group| {
                    let synonyms = dictionary?.synonyms(*group);
                    synonyms.first().map(|word| word.to_string())
                })
                .collect();
            SaidPhrase {
                groups,
                words,
                logics,
            }
        })
        .collect()
}

fn phrase_text(phrase: &SaidPhrase) -> String {
    phrase
        .groups
        .iter()
        .zip(&phrase.words)
        .map(|(group, word)| match word {
            Some(word) => word.clone(),
            None => format!("#{group}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn execute_said(
    path: PathBuf,
    json: bool,
    plain_messages: bool,
    options: &GameOptions,
) -> Result<()> {
    let game = Game::open(&path, options)?;
    let dictionary = match load_dictionary(&path, game.charset()) {
        Ok(dictionary) => Some(dictionary),
        Err(err) => {
            log::warn!("{err:#}, showing word groups only");
            None
        }
    };

    let numbers = logic_numbers(&game);
    let pb = create_progress_bar(numbers.len() as u64, "Scanning logics");
    let results = run_batch(numbers, |number| -> Result<_> {
        let (_, script) = decode_logic(&game, number, plain_messages)?;
        let tests = scan_said_tests(&script)
            .with_context(|| format!("Failed to scan logic {number}"))?;
        pb.inc(1);
        Ok((number, tests))
    });
    pb.finish_and_clear();

    let mut tests: BTreeMap<Vec<u16>, BTreeSet<usize>> = BTreeMap::new();
    for result in results {
        let (number, found) = result?;
        for test in found {
            tests.entry(test.groups).or_default().insert(number);
        }
    }
    let phrases = said_phrases(tests, dictionary.as_ref());

    if json {
        println!("{}", serde_json::to_string_pretty(&phrases)?);
    } else {
        let mut table = create_table(&["Phrase", "Groups", "Logics"]);
        for phrase in &phrases {
            let join = |values: Vec<String>| values.join(" ");
            add_table_row(
                &mut table,
                vec![
                    phrase_text(phrase),
                    join(phrase.groups.iter().map(u16::to_string).collect()),
                    join(phrase.logics.iter().map(usize::to_string).collect()),
                ],
            );
        }
        table.printstd();
        println!("{} phrases", phrases.len());
    }

    if dictionary.is_some() {
        let missing: BTreeSet<u16> = phrases
            .iter()
            .flat_map(|phrase| phrase.groups.iter().zip(&phrase.words))
            .filter(|(_, word)| word.is_none())
            .map(|(group, _)| *group)
            .collect();
        if !missing.is_empty() {
            log::warn!("{} word groups are not in the dictionary: {missing:?}", missing.len());
        }
    }
    Ok(())
}
