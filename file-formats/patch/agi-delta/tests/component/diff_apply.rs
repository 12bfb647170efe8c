//! Diff and apply properties

use agi_delta::{DiffOptions, PatchOp, apply, diff, diff_with};
use proptest::prelude::*;

/// An original buffer and a copy with a run of bytes replaced
fn spliced() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (
        prop::collection::vec(any::<u8>(), 0..3000),
        any::<prop::sample::Index>(),
        0usize..64,
        prop::collection::vec(any::<u8>(), 0..96),
    )
        .prop_map(|(original, at, removed, inserted)| {
            let start = if original.is_empty() {
                0
            } else {
                at.index(original.len())
            };
            let end = (start + removed).min(original.len());
            let mut modified = original[..start].to_vec();
            modified.extend_from_slice(&inserted);
            modified.extend_from_slice(&original[end..]);
            (original, modified)
        })
}

proptest! {
    #[test]
    fn apply_rebuilds_random_buffers(
        original in prop::collection::vec(any::<u8>(), 0..1500),
        modified in prop::collection::vec(any::<u8>(), 0..1500),
    ) {
        let record = diff(&original, &modified);
        prop_assert_eq!(record.output_len(), modified.len());
        let rebuilt = apply(&original, &record).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(rebuilt, modified);
    }

    #[test]
    fn apply_rebuilds_edited_buffers((original, modified) in spliced(), window in 1usize..16) {
        let options = DiffOptions::default().with_window(window);
        let record = diff_with(&original, &modified, &options);
        let rebuilt = apply(&original, &record).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(rebuilt, modified);
    }

    #[test]
    fn diff_is_deterministic((original, modified) in spliced()) {
        prop_assert_eq!(diff(&original, &modified), diff(&original, &modified));
    }

    #[test]
    fn copies_are_at_least_one_window((original, modified) in spliced()) {
        let options = DiffOptions::default();
        let record = diff_with(&original, &modified, &options);
        if original != modified {
            for op in record.ops() {
                if let PatchOp::Copy { length, .. } = op {
                    prop_assert!(*length >= options.window);
                }
            }
        }
    }

    #[test]
    fn neighbouring_ops_never_mergeable((original, modified) in spliced()) {
        let record = diff(&original, &modified);
        for pair in record.ops().windows(2) {
            match (&pair[0], &pair[1]) {
                (PatchOp::Insert(_), PatchOp::Insert(_)) => {
                    prop_assert!(false, "adjacent inserts");
                }
                (
                    PatchOp::Copy { offset, length },
                    PatchOp::Copy { offset: next, .. },
                ) => prop_assert_ne!(offset + length, *next),
                _ => {}
            }
        }
    }

    #[test]
    fn identical_buffers_single_copy(data in prop::collection::vec(any::<u8>(), 1..2000)) {
        let record = diff(&data, &data);
        prop_assert_eq!(
            record.ops(),
            [PatchOp::Copy { offset: 0, length: data.len() }]
        );
    }

    #[test]
    fn one_byte_change_stays_small(
        original in prop::collection::vec(any::<u8>(), 64..2000),
        at in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut modified = original.clone();
        let position = at.index(modified.len());
        modified[position] ^= flip;

        let options = DiffOptions::default();
        let record = diff_with(&original, &modified, &options);
        prop_assert!(record.inserted_len() <= options.window);
        prop_assert!(record.len() <= 3);
    }
}

#[test]
fn test_translated_sentence_reuses_surroundings() {
    let original = b"\x01\x02\x03\x04You are in a small room. A door leads north and a window faces east.\x00\xff\xfe\xfd\xfc";
    let modified = b"\x01\x02\x03\x04Tu es dans une petite salle. A door leads north and a window faces east.\x00\xff\xfe\xfd\xfc";
    let record = diff_with(original, modified, &DiffOptions::default().with_window(4));

    assert!(record.copied_len() > record.inserted_len());
    assert_eq!(apply(original, &record).expect("apply"), modified);
}

#[test]
fn test_empty_original_is_one_insert() {
    let record = diff(b"", b"new file");
    assert_eq!(record.ops(), [PatchOp::Insert(b"new file".to_vec())]);
}
