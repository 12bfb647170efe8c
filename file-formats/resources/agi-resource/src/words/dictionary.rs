//! `WORDS.TOK` codec
//!
//! Layout:
//!
//! - 26 big-endian `u16` offsets, one per letter `a..=z`, pointing at the
//!   first word starting with that letter (0 when there is none)
//! - word records in collation order: `prefix_len: u8` (characters shared
//!   with the previous word), the remaining characters each stored as
//!   `ch ^ 0x7F` with bit 7 set on the last one, then `group: u16` (BE)
//!
//! The parser walks the records sequentially from the letter offset and
//! relies on the ordering, so [`Dictionary::encode`] re-sorts whenever the
//! word list was changed. An unchanged decoded dictionary is written back
//! byte for byte, including records with a shorter prefix than possible.

use byteorder::{BigEndian, WriteBytesExt};
use std::collections::BTreeMap;

use super::WordEntry;
use crate::charset::Charset;
use crate::{Error, Result};

const LETTERS: usize = 26;
const INDEX_SIZE: usize = LETTERS * 2;
const MAX_PREFIX: usize = u8::MAX as usize;
const LAST_CHAR: u8 = 0x80;
const CHAR_MASK: u8 = 0x7F;

/// A decoded `WORDS.TOK`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    entries: Vec<WordEntry>,
    preamble: Vec<u8>,
    trailer: Vec<u8>,
    original: Option<OriginalRecords>,
}

/// Words as decoded, with the file they came from
#[derive(Debug, Clone, PartialEq, Eq)]
struct OriginalRecords {
    entries: Vec<WordEntry>,
    bytes: Vec<u8>,
}

impl Dictionary {
    /// Empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary holding `entries` in any order
    pub fn from_entries(entries: Vec<WordEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Decode a `WORDS.TOK` file.
    ///
    /// Letter offsets must point at the first word of their letter. Bytes
    /// after the last complete record are kept and written back by
    /// [`encode`](Self::encode).
    pub fn decode(bytes: &[u8], charset: &Charset) -> Result<Self> {
        if bytes.len() < INDEX_SIZE {
            return Err(Error::format(format!(
                "Dictionary of {} bytes is shorter than its letter index",
                bytes.len()
            )));
        }

        let letters: Vec<usize> = bytes[..INDEX_SIZE]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as usize)
            .collect();

        let start = letters
            .iter()
            .copied()
            .filter(|&offset| offset != 0)
            .min()
            .unwrap_or(INDEX_SIZE);
        if start < INDEX_SIZE || start > bytes.len() {
            return Err(Error::format(format!(
                "First word offset {start:#x} lies outside the word records"
            )));
        }

        let mut entries = Vec::new();
        let mut first_of_letter = [0usize; LETTERS];
        let mut previous: Vec<u8> = Vec::new();
        let mut pos = start;

        while let Some((record, next)) = read_record(bytes, pos) {
            let prefix = record.prefix as usize;
            if prefix > previous.len() {
                return Err(Error::format(format!(
                    "Word at {pos:#x} shares {prefix} characters with a {} character word",
                    previous.len()
                )));
            }

            let mut word = previous[..prefix].to_vec();
            word.extend_from_slice(&record.chars);

            let maximal = shared_prefix(&previous, &word);
            if prefix < maximal {
                log::warn!(
                    "Word at {pos:#x} shares {prefix} characters, {maximal} would be possible"
                );
            }

            if let Some(letter) = letter_index(word[0]) {
                if first_of_letter[letter] == 0 {
                    first_of_letter[letter] = pos;
                }
            }

            let text = charset.decode(&word)?;
            log::trace!("Word {text:?} -> group {}", record.group);
            entries.push(WordEntry {
                word: text,
                group: record.group,
            });
            previous = word;
            pos = next;
        }

        for (letter, (&declared, &found)) in letters.iter().zip(&first_of_letter).enumerate() {
            if declared != found {
                return Err(Error::format(format!(
                    "Letter '{}' points at {declared:#x}, its first word is at {found:#x}",
                    char::from(b'a' + letter as u8)
                )));
            }
        }

        let trailer = bytes[pos..].to_vec();
        if !trailer.is_empty() {
            log::debug!("Dictionary has {} trailing bytes", trailer.len());
        }

        log::debug!("Decoded {} dictionary words", entries.len());
        Ok(Self {
            original: Some(OriginalRecords {
                entries: entries.clone(),
                bytes: bytes.to_vec(),
            }),
            entries,
            preamble: bytes[INDEX_SIZE..start].to_vec(),
            trailer,
        })
    }

    /// Encode the dictionary, sorting words into collation order first.
    ///
    /// A decoded dictionary whose words were not changed encodes to the
    /// bytes it was decoded from.
    ///
    /// Fails with [`Error::Encoding`] for words that the base dictionary
    /// cannot hold (empty, not starting with `a..=z`, non-ASCII after
    /// charset encoding) and for duplicate words.
    pub fn encode(&self, charset: &Charset) -> Result<Vec<u8>> {
        if let Some(original) = &self.original
            && original.entries == self.entries
        {
            return Ok(original.bytes.clone());
        }

        let mut words = self
            .entries
            .iter()
            .map(|entry| Ok((encode_word(&entry.word, charset)?, entry.group)))
            .collect::<Result<Vec<_>>>()?;
        words.sort_by(|a, b| a.0.cmp(&b.0));

        if let Some(pair) = words.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::encoding(format!(
                "Word {:?} appears more than once",
                String::from_utf8_lossy(&pair[0].0)
            )));
        }

        let mut out = vec![0u8; INDEX_SIZE];
        out.extend_from_slice(&self.preamble);

        let mut letters = [0u16; LETTERS];
        let mut previous: &[u8] = &[];
        for (word, group) in &words {
            let pos = u16::try_from(out.len()).map_err(|_| {
                Error::overflow(format!(
                    "Dictionary offset {:#x} does not fit 16 bits",
                    out.len()
                ))
            })?;
            if let Some(letter) = letter_index(word[0]) {
                if letters[letter] == 0 {
                    letters[letter] = pos;
                }
            }

            let prefix = shared_prefix(previous, word);
            out.push(prefix as u8);
            let rest = &word[prefix..];
            for (i, &ch) in rest.iter().enumerate() {
                let stored = ch ^ CHAR_MASK;
                out.push(if i + 1 == rest.len() {
                    stored | LAST_CHAR
                } else {
                    stored
                });
            }
            out.write_u16::<BigEndian>(*group)?;
            previous = word;
        }

        for (letter, offset) in letters.iter().enumerate() {
            out[letter * 2..letter * 2 + 2].copy_from_slice(&offset.to_be_bytes());
        }
        out.extend_from_slice(&self.trailer);
        Ok(out)
    }

    /// Words in their current order (collation order after a decode)
    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the dictionary has no words
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group of `word`
    pub fn lookup(&self, word: &str) -> Option<u16> {
        self.entries
            .iter()
            .find(|entry| entry.word == word)
            .map(|entry| entry.group)
    }

    /// All words of a synonym group
    pub fn synonyms(&self, group: u16) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.group == group)
            .map(|entry| entry.word.as_str())
            .collect()
    }

    /// Words by synonym group
    pub fn groups(&self) -> BTreeMap<u16, Vec<&str>> {
        let mut groups: BTreeMap<u16, Vec<&str>> = BTreeMap::new();
        for entry in &self.entries {
            groups.entry(entry.group).or_default().push(&entry.word);
        }
        groups
    }

    /// Add a word or move it to another group, returning its previous group
    pub fn insert(&mut self, word: impl Into<String>, group: u16) -> Option<u16> {
        let word = word.into();
        match self.entries.iter_mut().find(|entry| entry.word == word) {
            Some(entry) => Some(std::mem::replace(&mut entry.group, group)),
            None => {
                self.entries.push(WordEntry { word, group });
                None
            }
        }
    }

    /// Remove a word, returning its group
    pub fn remove(&mut self, word: &str) -> Option<u16> {
        let index = self.entries.iter().position(|entry| entry.word == word)?;
        Some(self.entries.remove(index).group)
    }

    /// Bytes kept after the last record
    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }
}

struct Record {
    prefix: u8,
    chars: Vec<u8>,
    group: u16,
}

/// Read the record at `pos`, `None` when no complete record remains
fn read_record(bytes: &[u8], pos: usize) -> Option<(Record, usize)> {
    let prefix = *bytes.get(pos)?;
    let mut chars = Vec::new();
    let mut cursor = pos + 1;
    loop {
        let stored = *bytes.get(cursor)?;
        cursor += 1;
        chars.push((stored & CHAR_MASK) ^ CHAR_MASK);
        if stored & LAST_CHAR != 0 {
            break;
        }
    }
    let group = bytes.get(cursor..cursor + 2)?;
    let group = u16::from_be_bytes([group[0], group[1]]);
    Some((
        Record {
            prefix,
            chars,
            group,
        },
        cursor + 2,
    ))
}

fn encode_word(word: &str, charset: &Charset) -> Result<Vec<u8>> {
    let bytes = charset.encode(word)?;
    let Some(&first) = bytes.first() else {
        return Err(Error::encoding("Dictionary words cannot be empty"));
    };
    if letter_index(first).is_none() {
        return Err(Error::encoding(format!(
            "Word {word:?} must start with a letter a-z"
        )));
    }
    if bytes.iter().any(|&b| b > CHAR_MASK) {
        return Err(Error::encoding(format!(
            "Word {word:?} has characters outside the base dictionary's 7-bit range"
        )));
    }
    Ok(bytes)
}

fn letter_index(byte: u8) -> Option<usize> {
    byte.is_ascii_lowercase().then(|| (byte - b'a') as usize)
}

fn shared_prefix(previous: &[u8], word: &[u8]) -> usize {
    previous
        .iter()
        .zip(word)
        .take_while(|(a, b)| a == b)
        .count()
        .min(MAX_PREFIX)
        .min(word.len().saturating_sub(1))
}
