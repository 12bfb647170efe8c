//! Object table tests

use agi_resource::{Charset, Error, ObjectOptions, ObjectTable, Platform};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::{encrypted_object_file, object_file, transparent};

fn entries_strategy() -> impl Strategy<Value = Vec<(String, u8)>> {
    prop::collection::vec(("[a-z ?]{0,12}", any::<u8>()), 1..40)
}

fn as_refs(entries: &[(String, u8)]) -> Vec<(&str, u8)> {
    entries.iter().map(|(n, r)| (n.as_str(), *r)).collect()
}

proptest! {
    #[test]
    fn plain_table_round_trip(entries in entries_strategy(), max_animated in any::<u8>()) {
        let bytes = object_file(&as_refs(&entries), max_animated);
        let table = ObjectTable::decode(&bytes, &transparent(), &ObjectOptions::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(!table.is_encrypted());
        prop_assert_eq!(table.len(), entries.len());
        prop_assert_eq!(table.max_animated(), max_animated);
        prop_assert_eq!(table.encode(&transparent()).map_err(|e| TestCaseError::fail(e.to_string()))?, bytes);
    }

    #[test]
    fn encrypted_table_round_trip(entries in entries_strategy()) {
        let bytes = encrypted_object_file(&as_refs(&entries), 16);
        let table = ObjectTable::decode(&bytes, &transparent(), &ObjectOptions::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(table.is_encrypted());
        for (entry, (name, room)) in table.entries().iter().zip(&entries) {
            prop_assert_eq!(&entry.name, name);
            prop_assert_eq!(entry.start_room, *room);
        }
        prop_assert_eq!(table.encode(&transparent()).map_err(|e| TestCaseError::fail(e.to_string()))?, bytes);
    }

    /// Names that shrink or keep their length always fit the original file
    #[test]
    fn shortened_names_fit(entries in entries_strategy(), cut in 0usize..4) {
        let bytes = object_file(&as_refs(&entries), 0);
        let mut table = ObjectTable::decode(&bytes, &transparent(), &ObjectOptions::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let renamed: Vec<String> = entries
            .iter()
            .map(|(name, _)| name[..name.len().saturating_sub(cut)].to_uppercase())
            .collect();
        for (index, name) in renamed.iter().enumerate() {
            table.rename(index, name.clone()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        }

        let encoded = table.encode(&transparent()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(encoded.len() <= bytes.len());
        let reread = ObjectTable::decode(&encoded, &transparent(), &ObjectOptions::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let names: Vec<&str> = reread.entries().iter().map(|e| e.name.as_str()).collect();
        prop_assert_eq!(names, renamed.iter().map(String::as_str).collect::<Vec<_>>());
    }
}

#[test]
fn test_growth_past_capacity_overflows() {
    let bytes = object_file(&[("?", 0), ("key", 2)], 4);
    let mut table =
        ObjectTable::decode(&bytes, &transparent(), &ObjectOptions::default()).expect("decode");
    table.rename(1, "golden key").expect("rename");
    assert!(matches!(
        table.encode(&transparent()),
        Err(Error::Overflow(_))
    ));

    let table = table.with_capacity(64);
    let encoded = table.encode(&transparent()).expect("encode");
    let reread =
        ObjectTable::decode(&encoded, &transparent(), &ObjectOptions::default()).expect("decode");
    assert_eq!(reread.get(1).map(|e| e.name.as_str()), Some("golden key"));
}

#[test]
fn test_hebrew_names() {
    let charset = Charset::windows_1255();
    let bytes = object_file(&[("?", 0), ("key", 2), ("bucket", 3)], 4);
    let mut table = ObjectTable::decode(&bytes, &charset, &ObjectOptions::default()).expect("decode");
    table.rename(1, "מפתח").expect("rename");
    table.rename(2, "דלי").expect("rename");

    let encoded = table.encode(&charset).expect("encode");
    assert!(encoded.len() <= bytes.len());
    let reread = ObjectTable::decode(&encoded, &charset, &ObjectOptions::default()).expect("decode");
    assert_eq!(reread.get(1).map(|e| e.name.as_str()), Some("מפתח"));
    assert_eq!(reread.get(2).map(|e| e.name.as_str()), Some("דלי"));
    assert_eq!(reread.get(2).map(|e| e.start_room), Some(3));
}

#[test]
fn test_unrepresentable_name_is_encoding_error() {
    let bytes = object_file(&[("key", 2)], 0);
    let mut table =
        ObjectTable::decode(&bytes, &Charset::windows_1252(), &ObjectOptions::default())
            .expect("decode");
    table.rename(0, "ключ").expect("rename");
    assert!(matches!(
        table.encode(&Charset::windows_1252()),
        Err(Error::Encoding(_))
    ));
}

#[test]
fn test_forced_encryption_flag() {
    let bytes = object_file(&[("lamp", 1)], 0);
    let options = ObjectOptions {
        platform: Platform::Dos,
        encrypted: Some(false),
    };
    let table = ObjectTable::decode(&bytes, &transparent(), &options).expect("decode");
    let obfuscated = table.with_encryption(true).encode(&transparent()).expect("encode");
    assert_eq!(obfuscated, encrypted_object_file(&[("lamp", 1)], 0));
}
