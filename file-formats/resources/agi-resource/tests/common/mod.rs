//! Common test utilities and fixtures

#![allow(dead_code)]

use agi_resource::crypto::{AVIS_DURGAN, xor};
use agi_resource::{
    Charset, Directory, DirectoryEntry, LogicOptions, LogicScript, VolumeOptions, VolumeResource,
};
use tempfile::TempDir;

/// Create a temporary directory for tests
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Charset that maps every byte to a character and back
pub fn transparent() -> Charset {
    Charset::transparent()
}

/// Build a clear-text OBJECT file with names packed in entry order
pub fn object_file(entries: &[(&str, u8)], max_animated: u8) -> Vec<u8> {
    let names_offset = entries.len() * 3;
    let mut header = vec![0u8; 3];
    header[..2].copy_from_slice(&(names_offset as u16).to_le_bytes());
    header[2] = max_animated;

    let mut names = Vec::new();
    for (name, room) in entries {
        let offset = (names_offset + names.len()) as u16;
        header.extend_from_slice(&offset.to_le_bytes());
        header.push(*room);
        names.extend_from_slice(name.as_bytes());
        names.push(0);
    }
    header.extend_from_slice(&names);
    header
}

/// The same OBJECT file obfuscated with the interpreter's key
pub fn encrypted_object_file(entries: &[(&str, u8)], max_animated: u8) -> Vec<u8> {
    xor(&object_file(entries, max_animated), AVIS_DURGAN)
}

/// Logic `print(1); display(1, 1, 2); print.v(v30); return;` with three messages
pub fn room_logic() -> LogicScript {
    LogicScript::new(
        vec![0x65, 0x01, 0x67, 0x01, 0x01, 0x02, 0x66, 0x1E, 0x00],
        vec![
            Some("You are in a small room.".into()),
            Some("There is a door to the north.".into()),
            Some("Nothing happens.".into()),
        ],
        LogicOptions::new(transparent()),
    )
}

/// A small v2 game: `LOGDIR` and `VOL.0` holding logic 0 and logic 2
pub struct Game {
    pub logdir: Vec<u8>,
    pub vol0: Vec<u8>,
}

pub fn small_game() -> Game {
    let options = VolumeOptions::v2();
    let logic0 = room_logic().encode().expect("encode logic");
    let logic2 = LogicScript::new(
        vec![0x65, 0x01, 0x00],
        vec![Some("Game over.".into())],
        LogicOptions::new(transparent()),
    )
    .encode()
    .expect("encode logic");

    let mut vol0 = Vec::new();
    let mut directory = Directory::new();
    for (number, payload) in [(0usize, logic0), (2, logic2)] {
        let offset = vol0.len() as u32;
        let block = VolumeResource::new(0, payload, options)
            .and_then(|r| r.encode())
            .expect("encode block");
        vol0.extend_from_slice(&block);
        directory.set(number, DirectoryEntry::new(0, offset).expect("entry"));
    }

    Game {
        logdir: directory.encode().expect("encode directory"),
        vol0,
    }
}
