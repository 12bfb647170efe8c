//! Compression schemes used inside AGI v3 volumes

pub mod lzw;
pub mod picture;

use crate::Result;

/// How a resource payload is stored inside its volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Compression {
    /// Stored verbatim
    #[default]
    None,
    /// LZW (v3 logics, views and sounds)
    Lzw,
    /// Nibble-packed colour arguments (v3 pictures)
    Picture,
}

impl Compression {
    /// Expand stored bytes to a payload of `expected` bytes
    pub fn decompress(self, stored: &[u8], expected: usize) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(stored.to_vec()),
            Compression::Lzw => lzw::decompress(stored, expected),
            Compression::Picture => picture::decompress(stored, expected),
        }
    }

    /// Pack a payload into stored bytes
    pub fn compress(self, payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(payload.to_vec()),
            Compression::Lzw => Ok(lzw::compress(payload)),
            Compression::Picture => picture::compress(payload),
        }
    }
}
