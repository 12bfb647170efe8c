//! `WORDS.TOK.EXTENDED` codec
//!
//! A plain text side list for words the base dictionary cannot hold (for
//! example words in a non-Latin script). An optional first line starting
//! with `WORDS.TOK:` names the base file; every other non-empty line is
//! `word NUL group`, with the group written in decimal. Lines are not
//! ordered, and each may end in `\n` or `\r\n`.

use std::collections::BTreeMap;

use crate::charset::Charset;
use crate::{Error, Result};

const HEADER_PREFIX: &str = "WORDS.TOK:";

/// One extended word
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedWordEntry {
    /// Word in the game's charset
    pub word: String,
    /// Synonym group shared with the base dictionary
    pub group: u16,
}

impl ExtendedWordEntry {
    /// Create an entry
    pub fn new(word: impl Into<String>, group: u16) -> Self {
        Self {
            word: word.into(),
            group,
        }
    }
}

/// Line terminator used by the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Header(String),
    Entry(ExtendedWordEntry),
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawLine {
    line: Line,
    /// Bytes as read, without the terminator
    raw: Option<Vec<u8>>,
    /// `None` on a last line without terminator
    ending: Option<LineEnding>,
}

impl RawLine {
    fn new(line: Line, ending: LineEnding) -> Self {
        Self {
            line,
            raw: None,
            ending: Some(ending),
        }
    }
}

/// How a repeated word disagrees with itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    /// Every occurrence has the same group
    Exact,
    /// Occurrences map to different groups
    Conflict,
}

/// A word listed more than once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    /// The repeated word
    pub word: String,
    /// Group and 1-based line number of each occurrence
    pub occurrences: Vec<(u16, usize)>,
    /// Whether the groups agree
    pub kind: DuplicateKind,
}

/// A decoded `WORDS.TOK.EXTENDED` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedWords {
    lines: Vec<RawLine>,
    line_ending: LineEnding,
}

impl ExtendedWords {
    /// Empty list without a header line
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the side file.
    ///
    /// Each line keeps its bytes and terminator, so lines that are not
    /// replaced encode exactly as read (group `020` stays `020`).
    pub fn decode(bytes: &[u8], charset: &Charset) -> Result<Self> {
        let line_ending = match bytes.iter().position(|&b| b == b'\n') {
            Some(pos) if pos > 0 && bytes[pos - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        };

        let mut words = Self {
            lines: Vec::new(),
            line_ending,
        };
        let mut rest = bytes;
        while !rest.is_empty() {
            let (content, ending, next) = match rest.iter().position(|&b| b == b'\n') {
                Some(pos) => match rest[..pos].strip_suffix(b"\r") {
                    Some(content) => (content, Some(LineEnding::CrLf), &rest[pos + 1..]),
                    None => (&rest[..pos], Some(LineEnding::Lf), &rest[pos + 1..]),
                },
                None => (rest, None, &[][..]),
            };
            let line = parse_line(content, words.lines.is_empty(), words.lines.len() + 1, charset)?;
            words.lines.push(RawLine {
                line,
                raw: Some(content.to_vec()),
                ending,
            });
            rest = next;
        }

        log::debug!("Decoded {} extended words", words.len());
        Ok(words)
    }

    /// Encode the side file, keeping the header line and line endings
    pub fn encode(&self, charset: &Charset) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for line in &self.lines {
            match &line.raw {
                Some(raw) => out.extend_from_slice(raw),
                None => out.extend_from_slice(&render_line(&line.line, charset)?),
            }
            if let Some(ending) = line.ending {
                out.extend_from_slice(ending.as_bytes());
            }
        }
        Ok(out)
    }

    /// Header line, if any
    pub fn header(&self) -> Option<&str> {
        match self.lines.first().map(|line| &line.line) {
            Some(Line::Header(header)) => Some(header),
            _ => None,
        }
    }

    /// Set or clear the header line
    pub fn set_header(&mut self, header: Option<String>) {
        let has_header = self.header().is_some();
        match (header, has_header) {
            (Some(header), true) => {
                self.lines[0].line = Line::Header(header);
                self.lines[0].raw = None;
            }
            (Some(header), false) => {
                self.lines
                    .insert(0, RawLine::new(Line::Header(header), self.line_ending));
            }
            (None, true) => {
                self.lines.remove(0);
            }
            (None, false) => {}
        }
    }

    /// Line terminator used for new lines
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Entries in file order
    pub fn entries(&self) -> impl Iterator<Item = &ExtendedWordEntry> + '_ {
        self.lines.iter().filter_map(|line| match &line.line {
            Line::Entry(entry) => Some(entry),
            Line::Header(_) | Line::Blank => None,
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Check if the list has no entries
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Append an entry
    pub fn push(&mut self, entry: ExtendedWordEntry) {
        if let Some(last) = self.lines.last_mut() {
            last.ending.get_or_insert(self.line_ending);
        }
        self.lines
            .push(RawLine::new(Line::Entry(entry), self.line_ending));
    }

    /// Group of the first occurrence of `word`
    pub fn lookup(&self, word: &str) -> Option<u16> {
        self.entries()
            .find(|entry| entry.word == word)
            .map(|entry| entry.group)
    }

    /// Words listed more than once, in order of first occurrence
    pub fn duplicates(&self) -> Vec<Duplicate> {
        let mut seen: BTreeMap<&str, Vec<(u16, usize)>> = BTreeMap::new();
        let mut order = Vec::new();

        for (index, line) in self.lines.iter().enumerate() {
            if let Line::Entry(entry) = &line.line {
                let occurrences = seen.entry(entry.word.as_str()).or_default();
                if occurrences.is_empty() {
                    order.push(entry.word.as_str());
                }
                occurrences.push((entry.group, index + 1));
            }
        }

        order
            .into_iter()
            .filter_map(|word| {
                let occurrences = seen.remove(word)?;
                if occurrences.len() < 2 {
                    return None;
                }
                let first = occurrences[0].0;
                let kind = if occurrences.iter().all(|&(group, _)| group == first) {
                    DuplicateKind::Exact
                } else {
                    DuplicateKind::Conflict
                };
                Some(Duplicate {
                    word: word.to_string(),
                    occurrences,
                    kind,
                })
            })
            .collect()
    }
}

fn parse_line(raw: &[u8], first: bool, number: usize, charset: &Charset) -> Result<Line> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if first && raw.starts_with(HEADER_PREFIX.as_bytes()) {
        return Ok(Line::Header(charset.decode(raw)?));
    }
    if raw.is_empty() {
        return Ok(Line::Blank);
    }

    let separator = raw.iter().position(|&b| b == 0).ok_or_else(|| {
        Error::format(format!("Line {number} has no NUL between word and group"))
    })?;
    let word = charset.decode(&raw[..separator])?;
    let group_text = std::str::from_utf8(&raw[separator + 1..])
        .ok()
        .map(str::trim)
        .unwrap_or_default();
    let group = group_text.parse::<u16>().map_err(|_| {
        Error::format(format!("Line {number} has an invalid group {group_text:?}"))
    })?;
    Ok(Line::Entry(ExtendedWordEntry { word, group }))
}

fn render_line(line: &Line, charset: &Charset) -> Result<Vec<u8>> {
    match line {
        Line::Header(header) => charset.encode(header),
        Line::Blank => Ok(Vec::new()),
        Line::Entry(entry) => {
            if entry.word.is_empty() {
                return Err(Error::encoding("Extended words cannot be empty"));
            }
            let mut bytes = charset.encode(&entry.word)?;
            if bytes.iter().any(|&b| b == b'\n' || b == b'\r') {
                return Err(Error::encoding(format!(
                    "Extended word {:?} contains a line break",
                    entry.word
                )));
            }
            bytes.push(0);
            bytes.extend_from_slice(entry.group.to_string().as_bytes());
            Ok(bytes)
        }
    }
}
