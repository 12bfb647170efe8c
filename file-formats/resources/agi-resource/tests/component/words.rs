//! Dictionary and extended word list tests

use agi_resource::words::WordEntry;
use agi_resource::{
    Charset, Dictionary, DuplicateKind, Error, ExtendedWordEntry, ExtendedWords, LineEnding,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::transparent;

proptest! {
    /// Words given in any order are stored in collation order and the
    /// stored form re-encodes to the same bytes
    #[test]
    fn dictionary_collation(words in prop::collection::btree_map("[a-z]{1,10}", 0u16..10_000, 1..80)) {
        let mut entries: Vec<WordEntry> = words
            .iter()
            .map(|(word, group)| WordEntry::new(word.clone(), *group))
            .collect();
        entries.reverse();

        let bytes = Dictionary::from_entries(entries)
            .encode(&transparent())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let decoded = Dictionary::decode(&bytes, &transparent())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let sorted: Vec<(&str, u16)> = words.iter().map(|(w, g)| (w.as_str(), *g)).collect();
        let found: Vec<(&str, u16)> = decoded.entries().iter().map(|e| (e.word.as_str(), e.group)).collect();
        prop_assert_eq!(found, sorted);
        prop_assert_eq!(decoded.encode(&transparent()).map_err(|e| TestCaseError::fail(e.to_string()))?, bytes);
    }

    /// Extended lists keep their exact bytes through a decode
    #[test]
    fn extended_round_trip(
        words in prop::collection::vec(("[a-zA-Z\u{5d0}-\u{5ea} ]{1,12}", 0u16..10_000), 0..40),
        header in any::<bool>(),
        crlf in any::<bool>(),
        final_newline in any::<bool>()
    ) {
        let charset = Charset::windows_1255();
        let newline: &[u8] = if crlf { b"\r\n" } else { b"\n" };
        let mut lines: Vec<Vec<u8>> = Vec::new();
        if header {
            lines.push(b"WORDS.TOK: words.tok".to_vec());
        }
        for (word, group) in &words {
            let mut line = charset.encode(word).map_err(|e| TestCaseError::fail(e.to_string()))?;
            line.push(0);
            line.extend_from_slice(group.to_string().as_bytes());
            lines.push(line);
        }
        prop_assume!(!lines.is_empty());
        let mut bytes = lines.join(newline);
        if final_newline {
            bytes.extend_from_slice(newline);
        }

        let list = ExtendedWords::decode(&bytes, &charset).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(list.len(), words.len());
        prop_assert_eq!(list.header().is_some(), header);
        prop_assert_eq!(list.encode(&charset).map_err(|e| TestCaseError::fail(e.to_string()))?, bytes);
    }
}

#[test]
fn test_decoded_dictionary_lookups() {
    let dictionary = Dictionary::from_entries(vec![
        WordEntry::new("look", 20),
        WordEntry::new("examine", 20),
        WordEntry::new("get", 30),
        WordEntry::new("take", 30),
        WordEntry::new("a", 0),
        WordEntry::new("anyword", 1),
        WordEntry::new("rol", 9999),
    ]);
    let bytes = dictionary.encode(&transparent()).expect("encode");
    let decoded = Dictionary::decode(&bytes, &transparent()).expect("decode");

    assert_eq!(decoded.lookup("take"), Some(30));
    assert_eq!(decoded.synonyms(20), ["examine", "look"]);
    assert_eq!(decoded.groups().len(), 5);
    assert!(decoded.entries().iter().any(WordEntry::is_reserved_group));
    assert_eq!(decoded.lookup("open"), None);
}

#[test]
fn test_dictionary_rejects_non_letter_start() {
    let dictionary = Dictionary::from_entries(vec![WordEntry::new("9lives", 5)]);
    assert!(matches!(
        dictionary.encode(&transparent()),
        Err(Error::Encoding(_))
    ));
}

#[test]
fn test_dictionary_rejects_high_bytes() {
    let dictionary = Dictionary::from_entries(vec![WordEntry::new("caf\u{e9}", 5)]);
    assert!(matches!(
        dictionary.encode(&Charset::windows_1252()),
        Err(Error::Encoding(_))
    ));
}

#[test]
fn test_extended_duplicates_with_line_numbers() {
    let charset = Charset::windows_1255();
    let text = "WORDS.TOK: words.tok\r\nפתח|10\r\nסגור|11\r\n\r\nפתח|10\r\nסגור|12\r\n";
    let encoded: Vec<u8> = charset
        .encode(text)
        .expect("encode fixture")
        .into_iter()
        .map(|b| if b == b'|' { 0 } else { b })
        .collect();
    let list = ExtendedWords::decode(&encoded, &charset).expect("decode");

    assert_eq!(list.line_ending(), LineEnding::CrLf);
    let duplicates = list.duplicates();
    assert_eq!(duplicates.len(), 2);
    assert_eq!(duplicates[0].word, "פתח");
    assert_eq!(duplicates[0].kind, DuplicateKind::Exact);
    assert_eq!(duplicates[0].occurrences, [(10, 2), (10, 5)]);
    assert_eq!(duplicates[1].word, "סגור");
    assert_eq!(duplicates[1].kind, DuplicateKind::Conflict);
    assert_eq!(duplicates[1].occurrences, [(11, 3), (12, 6)]);
}

#[test]
fn test_extended_push_appends_line() {
    let charset = Charset::windows_1255();
    let mut list = ExtendedWords::decode(b"a\x001\n", &charset).expect("decode");
    list.push(ExtendedWordEntry::new("\u{5d3}\u{5dc}\u{5ea}", 42));
    assert_eq!(
        list.encode(&charset).expect("encode"),
        b"a\x001\n\xe3\xec\xfa\x0042\n"
    );
    assert_eq!(list.lookup("\u{5d3}\u{5dc}\u{5ea}"), Some(42));
}
