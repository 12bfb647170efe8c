//! AGIP artifact tests

use agi_delta::{DiffOptions, Error, PATCH_MAGIC, PATCH_VERSION, PatchFile};
use proptest::prelude::*;

fn create(original: &[u8], modified: &[u8]) -> Result<PatchFile, TestCaseError> {
    PatchFile::create(original, modified, &DiffOptions::default())
        .map_err(|e| TestCaseError::fail(e.to_string()))
}

proptest! {
    #[test]
    fn serialized_patch_parses_back(
        original in prop::collection::vec(any::<u8>(), 0..1000),
        modified in prop::collection::vec(any::<u8>(), 0..1000),
    ) {
        let patch = create(&original, &modified)?;
        let bytes = patch.to_bytes().map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&bytes[..4], &PATCH_MAGIC[..]);
        prop_assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), PATCH_VERSION);

        let parsed = PatchFile::parse(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let output = parsed.apply(&original).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(parsed, patch);
        prop_assert_eq!(output, modified);
    }

    #[test]
    fn every_truncation_is_a_format_error(
        original in prop::collection::vec(any::<u8>(), 0..300),
        modified in prop::collection::vec(any::<u8>(), 0..300),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = create(&original, &modified)?
            .to_bytes()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let cut = cut.index(bytes.len());
        prop_assert!(matches!(PatchFile::parse(&bytes[..cut]), Err(Error::Format(_))));
    }

    #[test]
    fn changed_original_is_refused(
        original in prop::collection::vec(any::<u8>(), 1..1000),
        at in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut translated = original.clone();
        translated.extend_from_slice(b" (translated)");
        let patch = create(&original, &translated)?;

        let mut other = original.clone();
        let position = at.index(other.len());
        other[position] ^= flip;
        prop_assert!(matches!(patch.apply(&other), Err(Error::PatchMismatch(_))));
    }
}

#[test]
fn test_insert_longer_than_artifact() {
    let mut bytes = b"AGIP".to_vec();
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(b"").to_le_bytes());
    bytes.push(0x02);
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    bytes.extend_from_slice(b"abc");

    let err = PatchFile::parse(&bytes).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_future_version_rejected() {
    let mut bytes = PatchFile::create(b"a", b"b", &DiffOptions::default())
        .expect("create")
        .to_bytes()
        .expect("serialize");
    bytes[4] = 2;
    let err = PatchFile::parse(&bytes).unwrap_err();
    assert!(err.to_string().contains("version 2"));
}
