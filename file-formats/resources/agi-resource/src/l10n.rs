//! Checks and transforms for translated text
//!
//! AGI prints text left to right with no bidirectional support, so a
//! right-to-left translation has to be stored in visual order: each line
//! reversed, with runs of digits, Latin letters and `%` format codes kept
//! readable. [`visual_order`] performs that reordering.
//!
//! [`is_untranslated`] and [`compare_lengths`] back the audits run over a
//! game after import.

use crate::charset::Charset;
use crate::Result;

/// Reorder text for a left-to-right renderer.
///
/// Lines without right-to-left letters are returned unchanged. In the
/// other lines characters are reversed, paired brackets are mirrored and
/// runs of ASCII letters, digits and `%` codes keep their own order.
pub fn visual_order(text: &str) -> String {
    text.split('\n')
        .map(visual_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn visual_line(line: &str) -> String {
    if !line.chars().any(is_right_to_left) {
        return line.to_string();
    }

    let mut runs = Vec::new();
    let mut run = String::new();
    for c in line.chars() {
        if c.is_ascii_alphanumeric() || c == '%' {
            run.push(c);
            continue;
        }
        if !run.is_empty() {
            runs.push(std::mem::take(&mut run));
        }
        runs.push(mirror(c).to_string());
    }
    if !run.is_empty() {
        runs.push(run);
    }

    runs.reverse();
    runs.concat()
}

fn is_right_to_left(c: char) -> bool {
    matches!(c, '\u{0590}'..='\u{08FF}' | '\u{FB1D}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFF}')
}

fn mirror(c: char) -> char {
    match c {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        other => other,
    }
}

/// Whether text still reads as untranslated Latin-script text.
///
/// True when the text has ASCII letters outside `%` format codes and no
/// letters of any other script.
pub fn is_untranslated(text: &str) -> bool {
    let mut latin = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            // %v3, %m12, %s1 ...
            chars.next();
            continue;
        }
        if !c.is_alphabetic() {
            continue;
        }
        if !c.is_ascii() {
            return false;
        }
        latin = true;
    }
    latin
}

/// Encoded lengths of an original text and its translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthCheck {
    /// Bytes taken by the original
    pub original: usize,
    /// Bytes taken by the translation
    pub translated: usize,
}

impl LengthCheck {
    /// Bytes the translation needs beyond the original
    pub fn excess(&self) -> usize {
        self.translated.saturating_sub(self.original)
    }

    /// Whether the translation is longer than the original
    pub fn is_longer(&self) -> bool {
        self.translated > self.original
    }

    /// Whether the translation fits in `capacity` bytes
    pub fn fits(&self, capacity: usize) -> bool {
        self.translated <= capacity
    }
}

/// Compare the encoded size of a translation with its original.
///
/// Fails when either text cannot be represented in `charset`.
pub fn compare_lengths(
    original: &str,
    translation: &str,
    charset: &Charset,
) -> Result<LengthCheck> {
    Ok(LengthCheck {
        original: charset.encode(original)?.len(),
        translated: charset.encode(translation)?.len(),
    })
}
