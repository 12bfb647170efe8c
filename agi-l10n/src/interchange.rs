//! Translation spreadsheets
//!
//! Text travels between the game and translators as CSV with the columns
//! `resource,index,original,translation,comment`. `resource` names the
//! container (`logic.7`, `object`, `view.12`), `index` the text inside it.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use agi_resource::{ResourceKind, visual_order};

/// Container a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TextSource {
    Logic(usize),
    Object,
    View(usize),
}

impl TextSource {
    pub fn resource(self) -> Option<(ResourceKind, usize)> {
        match self {
            TextSource::Logic(number) => Some((ResourceKind::Logic, number)),
            TextSource::View(number) => Some((ResourceKind::View, number)),
            TextSource::Object => None,
        }
    }
}

impl fmt::Display for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSource::Logic(number) => write!(f, "logic.{number}"),
            TextSource::Object => f.write_str("object"),
            TextSource::View(number) => write!(f, "view.{number}"),
        }
    }
}

impl FromStr for TextSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("object") {
            return Ok(TextSource::Object);
        }
        let Some((kind, number)) = s.split_once('.') else {
            bail!("Unknown resource '{s}'");
        };
        let number = number
            .parse()
            .with_context(|| format!("Invalid resource number in '{s}'"))?;
        match kind.to_ascii_lowercase().as_str() {
            "logic" => Ok(TextSource::Logic(number)),
            "view" => Ok(TextSource::View(number)),
            _ => bail!("Unknown resource '{s}'"),
        }
    }
}

/// One CSV row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRow {
    pub resource: String,
    pub index: u16,
    pub original: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub comment: String,
}

impl TranslationRow {
    pub fn new(source: TextSource, index: u16, original: impl Into<String>) -> Self {
        Self {
            resource: source.to_string(),
            index,
            original: original.into(),
            translation: String::new(),
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

pub fn write_rows(path: &Path, rows: &[TranslationRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn read_rows(path: &Path) -> Result<Vec<TranslationRow>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    reader
        .deserialize()
        .enumerate()
        .map(|(line, row)| row.with_context(|| format!("{}: bad row {}", path.display(), line + 2)))
        .collect()
}

/// Translated rows grouped by container, skipping rows with no translation
pub fn translations(rows: &[TranslationRow]) -> Result<BTreeMap<TextSource, BTreeMap<u16, String>>> {
    let mut grouped: BTreeMap<TextSource, BTreeMap<u16, String>> = BTreeMap::new();
    for row in rows {
        if row.translation.is_empty() {
            continue;
        }
        let source: TextSource = row.resource.parse()?;
        if let Some(previous) = grouped
            .entry(source)
            .or_default()
            .insert(row.index, row.translation.clone())
            && previous != row.translation
        {
            log::warn!(
                "{source} #{} translated twice, keeping '{}'",
                row.index,
                row.translation
            );
        }
    }
    Ok(grouped)
}

/// Store every translation in visual order for right-to-left scripts
pub fn into_visual_order(
    mut grouped: BTreeMap<TextSource, BTreeMap<u16, String>>,
) -> BTreeMap<TextSource, BTreeMap<u16, String>> {
    for text in grouped.values_mut().flat_map(|texts| texts.values_mut()) {
        *text = visual_order(text);
    }
    grouped
}
