//! LZW and picture compression tests

use agi_resource::Compression;
use agi_resource::compression::{lzw, picture};
use proptest::prelude::*;

/// Picture command streams whose colour arguments fit a nibble
fn picture_stream() -> impl Strategy<Value = Vec<u8>> {
    let step = prop_oneof![
        (0u8..0xF0).prop_map(|b| vec![b]),
        (0xF3u8..0xFF).prop_map(|b| vec![b]),
        (0u8..16).prop_map(|c| vec![0xF0, c]),
        (0u8..16).prop_map(|c| vec![0xF2, c]),
        Just(vec![0xF1]),
        Just(vec![0xF3]),
    ];
    prop::collection::vec(step, 0..300).prop_map(|steps| {
        let mut stream = steps.concat();
        stream.push(0xFF);
        stream
    })
}

proptest! {
    #[test]
    fn lzw_round_trip(data in prop::collection::vec(any::<u8>(), 0..4000)) {
        let packed = lzw::compress(&data);
        let unpacked = lzw::decompress(&packed, data.len())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(unpacked, data);
    }

    #[test]
    fn lzw_round_trip_low_entropy(data in prop::collection::vec(0u8..4, 0..20_000)) {
        let packed = lzw::compress(&data);
        let unpacked = lzw::decompress(&packed, data.len())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(unpacked, data);
    }

    #[test]
    fn picture_round_trip(stream in picture_stream()) {
        let packed = picture::compress(&stream).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(packed.len() <= stream.len());
        let unpacked = picture::decompress(&packed, stream.len())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(unpacked, stream);
    }
}

#[test]
fn test_compression_dispatch() {
    let data = b"the quick brown fox jumps over the lazy dog, the lazy dog sleeps".to_vec();
    for scheme in [Compression::None, Compression::Lzw] {
        let stored = scheme.compress(&data).expect("compress");
        assert_eq!(
            scheme.decompress(&stored, data.len()).expect("decompress"),
            data
        );
    }
    assert_eq!(Compression::None.compress(&data).expect("compress"), data);
}

#[test]
fn test_picture_rejects_data_after_end() {
    assert!(picture::compress(&[0xF1, 0xFF, 0x00]).is_err());
}
