//! Logic message table tests

use std::collections::BTreeMap;

use agi_resource::{
    Charset, Error, LogicOptions, LogicScript, UsageKind, check_references, extract_messages,
    inject_messages, scan_text_references, text_report,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::{room_logic, transparent};

fn messages_strategy() -> impl Strategy<Value = Vec<Option<String>>> {
    prop::collection::vec(prop::option::weighted(0.8, "[ -~]{0,40}"), 0..30)
}

fn fail(e: Error) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

proptest! {
    /// Extracting and re-injecting every message reproduces the payload
    #[test]
    fn reinjection_is_identity(messages in messages_strategy(), encrypted in any::<bool>()) {
        let options = LogicOptions::new(transparent()).with_encryption(encrypted);
        let bytes = LogicScript::new(vec![0x00], messages, options).encode().map_err(fail)?;

        let script = LogicScript::decode(&bytes, &options).map_err(fail)?;
        let extracted: BTreeMap<u8, String> = extract_messages(&script).into_iter().collect();
        let injected = inject_messages(&script, &extracted).map_err(fail)?;
        prop_assert_eq!(injected.encode().map_err(fail)?, bytes);
    }

    /// Translated text reads back and absent slots stay absent
    #[test]
    fn translations_read_back(
        messages in messages_strategy(),
        translations in prop::collection::vec("[ -~]{0,60}", 30)
    ) {
        let options = LogicOptions::new(transparent());
        let bytes = LogicScript::new(vec![0x00], messages.clone(), options).encode().map_err(fail)?;
        let script = LogicScript::decode(&bytes, &options).map_err(fail)?;

        let replacements: BTreeMap<u8, String> = extract_messages(&script)
            .into_iter()
            .map(|(number, _)| (number, translations[usize::from(number) - 1].clone()))
            .collect();
        let translated = inject_messages(&script, &replacements).map_err(fail)?;
        let reread = LogicScript::decode(&translated.encode().map_err(fail)?, &options).map_err(fail)?;

        prop_assert_eq!(reread.bytecode(), script.bytecode());
        prop_assert_eq!(reread.messages().len(), messages.len());
        for (index, original) in messages.iter().enumerate() {
            let number = index as u8 + 1;
            match original {
                Some(_) => prop_assert_eq!(reread.message(number), Some(replacements[&number].as_str())),
                None => prop_assert_eq!(reread.message(number), None),
            }
        }
    }
}

#[test]
fn test_room_logic_report() {
    let script = room_logic();
    let references = scan_text_references(&script).expect("scan");
    let commands: Vec<(&str, u8)> = references
        .iter()
        .map(|r| (r.command, r.message))
        .collect();
    assert_eq!(commands, [("print", 1), ("display", 2)]);

    let report = text_report(&script).expect("report");
    let kinds: Vec<(u8, UsageKind)> = report.iter().map(|u| (u.number, u.kind)).collect();
    assert_eq!(
        kinds,
        [
            (1, UsageKind::Referenced),
            (2, UsageKind::Referenced),
            (3, UsageKind::FreeFloating),
        ]
    );
    assert_eq!(report[1].references, [2]);
    check_references(&script).expect("all references resolve");
}

#[test]
fn test_dangling_reference_is_reported() {
    let script = LogicScript::new(
        vec![0x65, 0x04, 0x00],
        vec![Some("only one".into())],
        LogicOptions::new(transparent()),
    );
    assert!(matches!(check_references(&script), Err(Error::Format(_))));
}

#[test]
fn test_injecting_unknown_message_fails() {
    let script = room_logic();
    let replacements = BTreeMap::from([(9, "nowhere".to_string())]);
    assert!(matches!(
        inject_messages(&script, &replacements),
        Err(Error::Format(_))
    ));
}

#[test]
fn test_capacity_overflow() {
    let bytes = room_logic().encode().expect("encode");
    let script = LogicScript::decode(&bytes, &LogicOptions::new(transparent()))
        .expect("decode")
        .with_capacity(bytes.len());

    let longer = BTreeMap::from([(1, "You are standing in a much larger hall.".to_string())]);
    assert!(matches!(
        inject_messages(&script, &longer),
        Err(Error::Overflow(_))
    ));

    let shorter = BTreeMap::from([(1, "A room.".to_string())]);
    let translated = inject_messages(&script, &shorter).expect("inject");
    assert!(translated.encode().expect("encode").len() < bytes.len());
}

#[test]
fn test_hebrew_messages() {
    let options = LogicOptions::new(Charset::windows_1255());
    let bytes = LogicScript::new(
        vec![0x65, 0x01, 0x00],
        vec![Some("Hello".into())],
        options,
    )
    .encode()
    .expect("encode");
    let script = LogicScript::decode(&bytes, &options).expect("decode");

    let translated = inject_messages(&script, &BTreeMap::from([(1, "שלום".to_string())]))
        .expect("inject");
    let encoded = translated.encode().expect("encode");
    let reread = LogicScript::decode(&encoded, &options).expect("decode");
    assert_eq!(reread.message(1), Some("שלום"));
    assert_eq!(encoded.len(), bytes.len() - 1);
}
