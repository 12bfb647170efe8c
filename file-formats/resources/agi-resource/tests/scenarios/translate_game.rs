//! Translate a small game in place on disk

use std::collections::BTreeMap;

use agi_resource::fs::{replace_atomically, run_batch, write_atomically};
use agi_resource::{
    Charset, Directory, Error, LogicOptions, LogicScript, ObjectOptions, ObjectTable, Placement,
    Volume, VolumeOptions, VolumeResource, extract_messages, inject_messages, read_description,
    write_description,
};
use pretty_assertions::assert_eq;

use crate::common::{object_file, small_game, temp_dir};

fn hebrew() -> LogicOptions {
    LogicOptions::new(Charset::windows_1255())
}

#[test]
fn test_translate_logic_with_relocation() {
    let dir = temp_dir();
    let game = small_game();
    let logdir_path = dir.path().join("LOGDIR");
    let vol_path = dir.path().join("VOL.0");
    std::fs::write(&logdir_path, &game.logdir).expect("write LOGDIR");
    std::fs::write(&vol_path, &game.vol0).expect("write VOL.0");

    let directory = Directory::decode(&std::fs::read(&logdir_path).expect("read")).expect("dir");
    let mut volume = Volume::new(
        0,
        std::fs::read(&vol_path).expect("read"),
        VolumeOptions::v2(),
    );

    // Logic 0 grows, so it has to move to the end of the volume
    let block = volume.read_entry(directory.get(0)).expect("read logic 0");
    let script = LogicScript::decode(block.payload(), &hebrew()).expect("decode");
    let translations = BTreeMap::from([
        (1, "אתה נמצא בחדר קטן מאוד, עם חלון אחד ודלת אחת.".to_string()),
        (2, "יש דלת בקיר הצפוני של החדר.".to_string()),
        (3, "לא קורה כלום.".to_string()),
    ]);
    let translated = inject_messages(&script, &translations).expect("inject");
    let block = block
        .with_payload(translated.encode().expect("encode"))
        .expect("block");

    let old_offset = directory.get(0).location().map(|(_, o)| o as usize).expect("present");
    let outcome = volume
        .write_resource(old_offset, &block, Placement::Auto)
        .expect("write");
    assert!(outcome.is_relocated());
    let new_entry = outcome.directory_entry(volume.number()).expect("entry");

    write_atomically(&vol_path, volume.data()).expect("write volume");
    let changed = replace_atomically(&logdir_path, |bytes| -> Result<Vec<u8>, Error> {
        let mut directory = Directory::decode(bytes)?;
        directory.set(0, new_entry);
        directory.encode()
    })
    .expect("update LOGDIR");
    assert!(changed);

    // Re-read everything from disk
    let directory = Directory::decode(&std::fs::read(&logdir_path).expect("read")).expect("dir");
    let volume = Volume::new(0, std::fs::read(&vol_path).expect("read"), VolumeOptions::v2());
    directory
        .validate_against(&[volume.len()])
        .expect("directory is consistent");

    let logic0 = LogicScript::decode(
        volume.read_entry(directory.get(0)).expect("read").payload(),
        &hebrew(),
    )
    .expect("decode");
    let texts: BTreeMap<u8, String> = extract_messages(&logic0).into_iter().collect();
    assert_eq!(texts, translations);
    assert_eq!(logic0.bytecode(), script.bytecode());

    // Logic 2 did not move and still reads back
    let logic2 = LogicScript::decode(
        volume.read_entry(directory.get(2)).expect("read").payload(),
        &hebrew(),
    )
    .expect("decode");
    assert_eq!(logic2.message(1), Some("Game over."));
    assert!(!directory.get(1).is_present());
}

#[test]
fn test_untouched_game_is_not_rewritten() {
    let dir = temp_dir();
    let game = small_game();
    let logdir_path = dir.path().join("LOGDIR");
    std::fs::write(&logdir_path, &game.logdir).expect("write LOGDIR");

    let changed = replace_atomically(&logdir_path, |bytes| -> Result<Vec<u8>, Error> {
        Directory::decode(bytes)?.encode()
    })
    .expect("round trip");
    assert!(!changed);
    assert_eq!(std::fs::read(&logdir_path).expect("read"), game.logdir);
}

#[test]
fn test_failed_transform_leaves_file_alone() {
    let dir = temp_dir();
    let path = dir.path().join("OBJECT");
    let original = object_file(&[("?", 0), ("key", 2)], 4);
    std::fs::write(&path, &original).expect("write OBJECT");

    let charset = Charset::windows_1255();
    let result = replace_atomically(&path, |bytes| -> Result<Vec<u8>, Error> {
        let mut table = ObjectTable::decode(bytes, &charset, &ObjectOptions::default())?;
        table.rename(1, "מפתח זהב גדול")?;
        table.encode(&charset)
    });
    assert!(matches!(result, Err(Error::Overflow(_))));
    assert_eq!(std::fs::read(&path).expect("read"), original);
}

#[test]
fn test_key_and_bucket_shrink() {
    let dir = temp_dir();
    let path = dir.path().join("OBJECT");
    let original = object_file(&[("?", 0), ("key", 2), ("bucket", 3)], 4);
    std::fs::write(&path, &original).expect("write OBJECT");

    let charset = Charset::transparent();
    replace_atomically(&path, |bytes| -> Result<Vec<u8>, Error> {
        let mut table = ObjectTable::decode(bytes, &charset, &ObjectOptions::default())?;
        table.rename(1, "pa")?;
        table.encode(&charset)
    })
    .expect("rename");

    let table = ObjectTable::decode(
        &std::fs::read(&path).expect("read"),
        &charset,
        &ObjectOptions::default(),
    )
    .expect("decode");
    let names: Vec<&str> = table.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["?", "pa", "bucket"]);
    assert_eq!(table.get(2).map(|e| e.start_room), Some(3));
}

#[test]
fn test_view_description_in_volume() {
    let options = VolumeOptions::v2();
    let charset = Charset::windows_1255();
    // Five header bytes, description pointer at 3..5, then the text
    let mut payload = vec![0x01, 0x01, 0x00, 0x05, 0x00];
    payload.extend_from_slice(b"A shiny key.\0");
    let block = VolumeResource::new(0, payload, options).expect("block");
    let mut volume = Volume::new(0, block.encode().expect("encode"), options);

    let block = volume.read_resource(0).expect("read");
    let description = read_description(block.payload(), &charset)
        .expect("read")
        .expect("has description");
    assert_eq!(description.text, "A shiny key.");

    let updated = write_description(block.payload(), "מפתח נוצץ.", &charset, Placement::Auto)
        .expect("write");
    let outcome = volume
        .write_resource(0, &block.with_payload(updated).expect("block"), Placement::Auto)
        .expect("write block");
    assert!(!outcome.is_relocated());

    let reread = volume.read_resource(0).expect("read");
    let description = read_description(reread.payload(), &charset)
        .expect("read")
        .expect("has description");
    assert_eq!(description.text.trim_end(), "מפתח נוצץ.");
}

#[test]
fn test_batch_translation_reports_each_failure() {
    let options = hebrew();
    let logics: Vec<Vec<u8>> = ["one", "two", "three"]
        .iter()
        .map(|text| {
            LogicScript::new(vec![0x65, 0x01, 0x00], vec![Some(text.to_string())], options)
                .encode()
                .expect("encode")
        })
        .collect();

    let job = |(index, bytes): (usize, Vec<u8>)| -> Result<Vec<u8>, Error> {
        let script = LogicScript::decode(&bytes, &options)?;
        let number = if index == 1 { 7 } else { 1 };
        let replacements = BTreeMap::from([(number, "אחד".to_string())]);
        inject_messages(&script, &replacements)?.encode()
    };
    let results = run_batch(logics.into_iter().enumerate().collect(), job);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::Format(_))));
    assert!(results[2].is_ok());
}
