//! Directory codec tests

use agi_resource::{Directory, DirectoryBundle, DirectoryEntry, Error, ResourceKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use test_case::test_case;

proptest! {
    /// Any whole number of records decodes and re-encodes unchanged
    #[test]
    fn directory_round_trip(records in prop::collection::vec(any::<[u8; 3]>(), 0..200)) {
        let bytes: Vec<u8> = records.concat();
        let directory = Directory::decode(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(directory.len(), records.len());
        prop_assert_eq!(directory.encode().map_err(|e| TestCaseError::fail(e.to_string()))?, bytes);
    }

    /// Lengths that are not a multiple of three are rejected
    #[test]
    fn partial_record_rejected(
        records in prop::collection::vec(any::<[u8; 3]>(), 0..20),
        extra in prop::collection::vec(any::<u8>(), 1..3)
    ) {
        let mut bytes: Vec<u8> = records.concat();
        bytes.extend_from_slice(&extra);
        prop_assert!(matches!(Directory::decode(&bytes), Err(Error::Format(_))));
    }
}

#[test_case([0x00, 0x00, 0x00], 0, 0 ; "start of volume zero")]
#[test_case([0x21, 0x23, 0x45], 2, 0x12345 ; "volume two")]
#[test_case([0xF0, 0x00, 0x10], 15, 0x10 ; "last volume")]
#[test_case([0x0F, 0xFF, 0xFF], 0, 0xFFFFF ; "largest offset")]
fn test_record_layout(bytes: [u8; 3], volume: u8, offset: u32) {
    let entry = DirectoryEntry::from_bytes(bytes);
    assert_eq!(entry.location(), Some((volume, offset)));
    assert_eq!(entry.to_bytes().expect("encode"), bytes);
}

#[test_case(16, 0 ; "volume out of range")]
#[test_case(0, 0x10_0000 ; "offset out of range")]
#[test_case(15, 0xFFFFF ; "absent marker")]
fn test_unencodable_entries(volume: u8, offset: u32) {
    assert!(matches!(
        DirectoryEntry::new(volume, offset),
        Err(Error::Overflow(_))
    ));
}

#[test]
fn test_absent_entries_are_skipped() {
    let bytes = [0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x21, 0x23, 0x45];
    let directory = Directory::decode(&bytes).expect("decode");
    let present: Vec<_> = directory.iter_present().collect();
    assert_eq!(present, [(0, 0, 0), (2, 2, 0x12345)]);
    assert_eq!(directory.get(1), DirectoryEntry::Absent);
    assert_eq!(directory.get(99), DirectoryEntry::Absent);
}

#[test]
fn test_validate_against_volume_lengths() {
    let directory = Directory::from_entries(vec![
        DirectoryEntry::new(0, 0x10).expect("entry"),
        DirectoryEntry::Absent,
        DirectoryEntry::new(1, 0x200).expect("entry"),
    ]);
    directory.validate_against(&[0x20, 0x201]).expect("valid");
    assert!(directory.validate_against(&[0x20, 0x200]).is_err());
    assert!(directory.validate_against(&[0x20]).is_err());
}

#[test]
fn test_set_grows_with_absent_padding() {
    let mut directory = Directory::new();
    directory.set(3, DirectoryEntry::new(1, 5).expect("entry"));
    assert_eq!(
        directory.encode().expect("encode"),
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x10, 0x00, 0x05]
    );
}

#[test]
fn test_v3_bundle_round_trip() {
    let mut bundle = DirectoryBundle::default();
    bundle
        .get_mut(ResourceKind::Logic)
        .set(0, DirectoryEntry::new(0, 0).expect("entry"));
    bundle
        .get_mut(ResourceKind::View)
        .set(1, DirectoryEntry::new(2, 0x1234).expect("entry"));
    bundle
        .get_mut(ResourceKind::Sound)
        .set(0, DirectoryEntry::new(1, 7).expect("entry"));

    let bytes = bundle.encode_v3().expect("encode");
    let decoded = DirectoryBundle::decode_v3(&bytes).expect("decode");
    assert_eq!(decoded, bundle);
    assert_eq!(decoded.get(ResourceKind::Picture).len(), 0);
    assert_eq!(decoded.encode_v3().expect("encode"), bytes);
}
