//! Parser vocabulary: `WORDS.TOK` and its extended side file
//!
//! The base dictionary and the extended list are separate artifacts. The
//! interpreter consults the extended list only after a miss in the base
//! dictionary, so neither codec ever moves words between the two.

pub mod dictionary;
pub mod extended;

pub use dictionary::Dictionary;
pub use extended::{Duplicate, DuplicateKind, ExtendedWordEntry, ExtendedWords, LineEnding};

/// Group of words the parser drops from input ("a", "the")
pub const IGNORED_GROUP: u16 = 0;
/// Group matched by any word in `said` tests
pub const ANY_WORD_GROUP: u16 = 1;
/// Group matching the rest of the input line in `said` tests
pub const REST_OF_LINE_GROUP: u16 = 9999;

/// A base dictionary word and its synonym group
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WordEntry {
    /// Word as typed by the player
    pub word: String,
    /// Synonym group
    pub group: u16,
}

impl WordEntry {
    /// Create an entry
    pub fn new(word: impl Into<String>, group: u16) -> Self {
        Self {
            word: word.into(),
            group,
        }
    }

    /// Check if the group is one of the parser's reserved groups
    pub fn is_reserved_group(&self) -> bool {
        matches!(
            self.group,
            IGNORED_GROUP | ANY_WORD_GROUP | REST_OF_LINE_GROUP
        )
    }
}
