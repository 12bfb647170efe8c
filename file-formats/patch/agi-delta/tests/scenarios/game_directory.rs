//! Shipping a translation as a directory of patches

use crate::common::{temp_dir, volume_like, write_tree};
use agi_delta::{Error, PatchSet};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn original_game() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("LOGDIR", vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x1C, 0xFF, 0xFF, 0xFF]),
        (
            "VOL.0",
            volume_like(&[
                "You are standing in front of a small house.",
                "The door is locked.",
                "There is a key under the mat.",
            ]),
        ),
        ("WORDS.TOK", b"\x00\x34\x00\x00dictionary".to_vec()),
        ("sub/OBJECT", b"\x03\x00\x00key\x00".to_vec()),
    ]
}

fn translated_game() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("LOGDIR", vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x1C, 0x00, 0x00, 0x58]),
        (
            "VOL.0",
            volume_like(&[
                "Vous etes devant une petite maison.",
                "The door is locked.",
                "Il y a une clef sous le paillasson.",
            ]),
        ),
        ("WORDS.TOK", b"\x00\x34\x00\x00dictionary".to_vec()),
        ("sub/OBJECT", b"\x03\x00\x00clef\x00".to_vec()),
        ("README.FR", b"Traduction francaise".to_vec()),
    ]
}

fn as_refs<'a>(files: &'a [(&'static str, Vec<u8>)]) -> Vec<(&'static str, &'a [u8])> {
    files.iter().map(|(name, data)| (*name, data.as_slice())).collect()
}

#[test]
fn test_patch_set_round_trip() {
    let workspace = temp_dir();
    let original = workspace.path().join("original");
    let translated = workspace.path().join("translated");
    let patches = workspace.path().join("patches");
    let output = workspace.path().join("output");

    let original_files = original_game();
    let translated_files = translated_game();
    write_tree(&original, &as_refs(&original_files));
    write_tree(&translated, &as_refs(&translated_files));

    let set = PatchSet::build(&original, &translated).expect("build");
    let patched: Vec<_> = set.entries().iter().map(|e| e.path.clone()).collect();
    assert_eq!(
        patched,
        [
            PathBuf::from("LOGDIR"),
            PathBuf::from("VOL.0"),
            PathBuf::from("sub/OBJECT")
        ]
    );
    assert_eq!(set.unchanged(), [PathBuf::from("WORDS.TOK")]);
    assert_eq!(set.unmatched(), [PathBuf::from("README.FR")]);

    let written = set.write_to(&patches).expect("write");
    assert_eq!(written.len(), 3);
    assert!(patches.join("VOL.0.agip").is_file());
    assert!(patches.join("sub/OBJECT.agip").is_file());

    let loaded = PatchSet::read_from(&patches).expect("read");
    assert_eq!(loaded.entries(), set.entries());

    loaded.apply_to(&original, &output).expect("apply");
    for (name, data) in &translated_files {
        if *name == "README.FR" || *name == "WORDS.TOK" {
            assert!(!output.join(name).exists());
            continue;
        }
        assert_eq!(&std::fs::read(output.join(name)).expect("read output"), data);
    }
}

#[test]
fn test_wrong_game_version_writes_nothing() {
    let workspace = temp_dir();
    let original = workspace.path().join("original");
    let translated = workspace.path().join("translated");
    let other = workspace.path().join("other");
    let output = workspace.path().join("output");

    let original_files = original_game();
    write_tree(&original, &as_refs(&original_files));
    write_tree(&translated, &as_refs(&translated_game()));

    // Same files, but OBJECT comes from another release
    let mut other_files = original_files.clone();
    other_files[3].1 = b"\x03\x00\x01key\x00".to_vec();
    write_tree(&other, &as_refs(&other_files));

    let set = PatchSet::build(&original, &translated).expect("build");
    let err = set.apply_to(&other, &output).unwrap_err();
    match err {
        Error::PatchMismatch(msg) => assert!(msg.contains("OBJECT"), "{msg}"),
        other => panic!("expected a mismatch, got {other}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_failed_write_leaves_output_untouched() {
    let workspace = temp_dir();
    let original = workspace.path().join("original");
    let translated = workspace.path().join("translated");
    let output = workspace.path().join("output");

    write_tree(&original, &as_refs(&original_game()));
    write_tree(&translated, &as_refs(&translated_game()));

    // LOGDIR is staged first; "sub" is a file, so sub/OBJECT cannot be written
    write_tree(
        &output,
        &[("LOGDIR", b"previous".as_slice()), ("sub", b"not a directory".as_slice())],
    );

    let set = PatchSet::build(&original, &translated).expect("build");
    let err = set.apply_to(&original, &output).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");

    assert_eq!(std::fs::read(output.join("LOGDIR")).expect("read"), b"previous");
    assert!(!output.join("VOL.0").exists());
    assert_eq!(std::fs::read_dir(&output).expect("list").count(), 2);
}

#[test]
fn test_apply_into_the_game_directory() {
    let workspace = temp_dir();
    let game = workspace.path().join("game");
    let translated = workspace.path().join("translated");
    let original_files = original_game();
    let translated_files = translated_game();
    write_tree(&game, &as_refs(&original_files));
    write_tree(&translated, &as_refs(&translated_files));

    let set = PatchSet::build(&game, &translated).expect("build");
    set.apply_to(&game, &game).expect("apply");
    for (name, data) in &translated_files {
        if *name != "README.FR" {
            assert_eq!(&std::fs::read(game.join(name)).expect("read"), data);
        }
    }
    assert_eq!(std::fs::read_dir(&game).expect("list").count(), 4);
}

#[test]
fn test_identical_trees_need_no_patches() {
    let workspace = temp_dir();
    let original = workspace.path().join("original");
    let copy = workspace.path().join("copy");
    let files = original_game();
    write_tree(&original, &as_refs(&files));
    write_tree(&copy, &as_refs(&files));

    let set = PatchSet::build(&original, &copy).expect("build");
    assert!(set.is_empty());
    assert_eq!(set.unchanged().len(), files.len());
}
