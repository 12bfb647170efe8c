//! Volume block tests

use agi_resource::{
    Compression, Directory, DirectoryEntry, Error, Placement, Volume, VolumeOptions,
    VolumeResource, WriteOutcome,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

proptest! {
    /// v3 blocks survive append, read and re-encode, compressed or not
    #[test]
    fn v3_blocks_round_trip(payloads in prop::collection::vec(
        prop::collection::vec(0u8..8, 0..600), 1..6
    )) {
        let options = VolumeOptions::v3();
        let mut volume = Volume::new(3, Vec::new(), options);
        let mut offsets = Vec::new();
        for payload in &payloads {
            let block = VolumeResource::compressed(0, payload.clone(), Compression::Lzw, options)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            offsets.push(volume.append_resource(&block).map_err(|e| TestCaseError::fail(e.to_string()))?);
        }

        for (payload, &offset) in payloads.iter().zip(&offsets) {
            let block = volume.read_resource(offset).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(block.payload(), payload.as_slice());
            prop_assert_eq!(block.volume(), 3);
            let encoded = block.encode().map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(encoded.as_slice(), &volume.data()[offset..offset + block.block_len()]);
        }
    }

    /// Shrinking writes never relocate and never change the volume length
    #[test]
    fn shrinking_write_stays_in_place(
        payload in prop::collection::vec(any::<u8>(), 1..200),
        keep in any::<prop::sample::Index>()
    ) {
        let options = VolumeOptions::v2();
        let block = VolumeResource::new(0, payload.clone(), options)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let mut volume = Volume::new(0, block.encode().map_err(|e| TestCaseError::fail(e.to_string()))?, options);
        let length = volume.len();

        let shorter = payload[..keep.index(payload.len() + 1)].to_vec();
        let replacement = block.with_payload(shorter.clone()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let outcome = volume.write_resource(0, &replacement, Placement::Auto)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert!(!outcome.is_relocated());
        prop_assert_eq!(volume.len(), length);
        let reread = volume.read_resource(0).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(reread.payload(), shorter.as_slice());
    }
}

#[test]
fn test_growing_write_relocates_and_updates_directory() {
    let options = VolumeOptions::v2();
    let first = VolumeResource::new(0, b"short".to_vec(), options).expect("block");
    let second = VolumeResource::new(0, b"neighbour".to_vec(), options).expect("block");

    let mut volume = Volume::new(0, Vec::new(), options);
    let first_offset = volume.append_resource(&first).expect("append");
    let second_offset = volume.append_resource(&second).expect("append");
    let mut directory = Directory::from_entries(vec![
        DirectoryEntry::new(0, first_offset as u32).expect("entry"),
        DirectoryEntry::new(0, second_offset as u32).expect("entry"),
    ]);

    let longer = first
        .with_payload(b"a considerably longer payload".to_vec())
        .expect("block");
    let outcome = volume
        .write_resource(first_offset, &longer, Placement::Auto)
        .expect("write");
    assert_eq!(
        outcome,
        WriteOutcome::Relocated {
            old_offset: 0,
            offset: 24
        }
    );
    directory.set(0, outcome.directory_entry(0).expect("entry"));

    let moved = volume.read_entry(directory.get(0)).expect("read");
    assert_eq!(moved.payload(), b"a considerably longer payload");
    let untouched = volume.read_entry(directory.get(1)).expect("read");
    assert_eq!(untouched.payload(), b"neighbour");
    directory
        .validate_against(&[volume.len()])
        .expect("directory fits the volume");
}

#[test]
fn test_in_place_placement_refuses_growth() {
    let options = VolumeOptions::v2();
    let block = VolumeResource::new(0, b"abc".to_vec(), options).expect("block");
    let mut volume = Volume::new(0, block.encode().expect("encode"), options);
    let before = volume.data().to_vec();

    let grown = block.with_payload(b"abcdef".to_vec()).expect("block");
    let err = volume
        .write_resource(0, &grown, Placement::InPlace)
        .unwrap_err();
    assert!(matches!(err, Error::Overflow(_)));
    assert_eq!(volume.data(), before.as_slice());
}

#[test]
fn test_append_placement_always_moves() {
    let options = VolumeOptions::v2();
    let block = VolumeResource::new(0, b"abc".to_vec(), options).expect("block");
    let mut volume = Volume::new(0, block.encode().expect("encode"), options);

    let outcome = volume
        .write_resource(0, &block.with_payload(b"x".to_vec()).expect("block"), Placement::Append)
        .expect("write");
    assert_eq!(outcome.offset(), 8);
    assert!(outcome.is_relocated());
    assert_eq!(volume.read_resource(0).expect("read").payload(), b"abc");
    assert_eq!(volume.read_resource(8).expect("read").payload(), b"x");
}

#[test]
fn test_truncated_block_reports_lengths() {
    let options = VolumeOptions::v2();
    let mut data = VolumeResource::new(0, vec![1; 10], options)
        .expect("block")
        .encode()
        .expect("encode");
    data.truncate(9);

    match Volume::new(0, data, options).read_resource(0) {
        Err(Error::TruncatedResource {
            offset,
            declared,
            available,
        }) => {
            assert_eq!(offset, 0);
            assert_eq!(declared, 10);
            assert_eq!(available, 4);
        }
        other => panic!("expected truncation, got {other:?}"),
    }
}

#[test]
fn test_custom_signature() {
    let options = VolumeOptions::v2().with_signature([0xAB, 0xCD]);
    let block = VolumeResource::new(1, b"data".to_vec(), options).expect("block");
    let bytes = block.encode().expect("encode");
    assert_eq!(&bytes[..5], &[0xAB, 0xCD, 0x01, 0x04, 0x00]);

    assert!(matches!(
        Volume::new(1, bytes.clone(), VolumeOptions::v2()).read_resource(0),
        Err(Error::Format(_))
    ));
    assert_eq!(
        Volume::new(1, bytes, options)
            .read_resource(0)
            .expect("read")
            .payload(),
        b"data"
    );
}

#[test]
fn test_compression_needs_v3_headers() {
    assert!(matches!(
        VolumeResource::compressed(0, vec![0; 64], Compression::Lzw, VolumeOptions::v2()),
        Err(Error::Format(_))
    ));
}
