//! Parser vocabulary commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use console::style;
use std::path::{Path, PathBuf};

use agi_resource::{Charset, Dictionary, DuplicateKind, ExtendedWords};

use crate::game::GameOptions;
use crate::utils::{add_table_row, create_table};

const DICTIONARY_FILE: &str = "WORDS.TOK";
const EXTENDED_FILE: &str = "WORDS.TOK.EXTENDED";

#[derive(Subcommand)]
pub enum WordsCommands {
    /// List synonym groups of WORDS.TOK
    List {
        /// Path to the game directory
        game: PathBuf,

        /// Only show this group
        #[arg(short, long)]
        group: Option<u16>,

        /// Only show groups with a word containing this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Find the group of a word
    Lookup {
        /// Path to the game directory
        game: PathBuf,

        /// Word to look up
        word: String,
    },

    /// Report repeated words in a WORDS.TOK.EXTENDED file
    CheckExtended {
        /// Path to the extended word list
        file: PathBuf,
    },
}

pub fn execute(command: WordsCommands, options: &GameOptions) -> Result<()> {
    match command {
        WordsCommands::List {
            game,
            group,
            filter,
        } => execute_list(game, group, filter, &options.charset),
        WordsCommands::Lookup { game, word } => execute_lookup(game, word, &options.charset),
        WordsCommands::CheckExtended { file } => execute_check(file, &options.charset),
    }
}

pub(crate) fn load_dictionary(game: &Path, charset: &Charset) -> Result<Dictionary> {
    let path = game.join(DICTIONARY_FILE);
    let data = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    Dictionary::decode(&data, charset).with_context(|| format!("Failed to parse {}", path.display()))
}

fn load_extended(path: &Path, charset: &Charset) -> Result<ExtendedWords> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    ExtendedWords::decode(&data, charset)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn execute_list(
    path: PathBuf,
    group: Option<u16>,
    filter: Option<String>,
    charset: &Charset,
) -> Result<()> {
    let dictionary = load_dictionary(&path, charset)?;
    let filter = filter.map(|f| f.to_lowercase());

    let mut table = create_table(&["Group", "Words"]);
    let mut shown = 0;
    for (number, words) in dictionary.groups() {
        if group.is_some_and(|group| group != number) {
            continue;
        }
        if let Some(filter) = &filter
            && !words.iter().any(|word| word.to_lowercase().contains(filter))
        {
            continue;
        }
        add_table_row(&mut table, vec![number.to_string(), words.join(", ")]);
        shown += 1;
    }

    if shown == 0 {
        println!("No matching groups");
        return Ok(());
    }
    table.printstd();
    println!(
        "\n{shown} groups, {} words in dictionary",
        dictionary.len()
    );
    Ok(())
}

fn execute_lookup(path: PathBuf, word: String, charset: &Charset) -> Result<()> {
    let dictionary = load_dictionary(&path, charset)?;
    let mut found = false;

    if let Some(group) = dictionary.lookup(&word) {
        println!(
            "{}: group {} in {DICTIONARY_FILE} ({})",
            style(&word).cyan(),
            style(group).yellow(),
            dictionary.synonyms(group).join(", ")
        );
        found = true;
    }

    let extended_path = path.join(EXTENDED_FILE);
    if extended_path.is_file() {
        let extended = load_extended(&extended_path, charset)?;
        if let Some(group) = extended.lookup(&word) {
            println!(
                "{}: group {} in {EXTENDED_FILE}",
                style(&word).cyan(),
                style(group).yellow()
            );
            found = true;
        }
    }

    if !found {
        bail!("'{word}' is not in the vocabulary");
    }
    Ok(())
}

fn execute_check(path: PathBuf, charset: &Charset) -> Result<()> {
    let extended = load_extended(&path, charset)?;
    let duplicates = extended.duplicates();
    if duplicates.is_empty() {
        println!(
            "{} {} words, no duplicates",
            style("✓").green(),
            extended.len()
        );
        return Ok(());
    }

    let mut table = create_table(&["Word", "Kind", "Occurrences"]);
    for duplicate in &duplicates {
        let kind = match duplicate.kind {
            DuplicateKind::Exact => style("repeated").yellow().to_string(),
            DuplicateKind::Conflict => style("conflict").red().to_string(),
        };
        let occurrences = duplicate
            .occurrences
            .iter()
            .map(|(group, line)| format!("line {line}: group {group}"))
            .collect::<Vec<_>>()
            .join("; ");
        add_table_row(&mut table, vec![duplicate.word.clone(), kind, occurrences]);
    }
    table.printstd();

    let conflicts = duplicates
        .iter()
        .filter(|d| d.kind == DuplicateKind::Conflict)
        .count();
    if conflicts > 0 {
        bail!("{conflicts} words map to more than one group");
    }
    Ok(())
}
