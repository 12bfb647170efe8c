//! Per-resource block headers inside volume files

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::compression::Compression;
use crate::{Error, Result};

/// Layout of the block header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderFormat {
    /// `signature(2) volume(1) length(2)`
    #[default]
    V2,
    /// `signature(2) volume|picture-flag(1) length(2) stored-length(2)`
    V3,
}

impl HeaderFormat {
    /// Size of the header in bytes
    pub fn header_size(self) -> usize {
        match self {
            HeaderFormat::V2 => 5,
            HeaderFormat::V3 => 7,
        }
    }
}

/// Options for reading and writing volume blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeOptions {
    /// Magic bytes opening every block
    pub signature: [u8; 2],
    /// Header layout
    pub format: HeaderFormat,
}

impl VolumeOptions {
    /// Signature used by all Sierra interpreters
    pub const AGI_SIGNATURE: [u8; 2] = [0x12, 0x34];

    /// v2 headers with the standard signature
    pub fn v2() -> Self {
        Self {
            signature: Self::AGI_SIGNATURE,
            format: HeaderFormat::V2,
        }
    }

    /// v3 headers with the standard signature
    pub fn v3() -> Self {
        Self {
            signature: Self::AGI_SIGNATURE,
            format: HeaderFormat::V3,
        }
    }

    /// Use a different block signature
    pub fn with_signature(mut self, signature: [u8; 2]) -> Self {
        self.signature = signature;
        self
    }
}

impl Default for VolumeOptions {
    fn default() -> Self {
        Self::v2()
    }
}

/// Decoded block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceHeader {
    /// Volume number recorded in the block
    pub volume: u8,
    /// Payload length after decompression
    pub length: u16,
    /// Length of the bytes following the header
    pub stored_length: u16,
    /// Storage scheme
    pub compression: Compression,
}

impl ResourceHeader {
    const PICTURE_FLAG: u8 = 0x80;

    /// Read the header of the block starting at `offset`
    pub fn read(volume: &[u8], offset: usize, options: &VolumeOptions) -> Result<Self> {
        let header_size = options.format.header_size();
        let available = volume.len().saturating_sub(offset);
        if available < header_size {
            return Err(Error::TruncatedResource {
                offset,
                declared: header_size,
                available,
            });
        }

        let bytes = &volume[offset..offset + header_size];
        if bytes[..2] != options.signature {
            return Err(Error::format(format!(
                "Bad resource signature at offset {offset:#x}: expected {:02X}{:02X}, found {:02X}{:02X}",
                options.signature[0], options.signature[1], bytes[0], bytes[1]
            )));
        }

        let mut cursor = Cursor::new(&bytes[2..]);
        let volume_byte = cursor.read_u8()?;
        let length = cursor.read_u16::<LittleEndian>()?;

        let header = match options.format {
            HeaderFormat::V2 => Self {
                volume: volume_byte,
                length,
                stored_length: length,
                compression: Compression::None,
            },
            HeaderFormat::V3 => {
                let stored_length = cursor.read_u16::<LittleEndian>()?;
                let compression = if volume_byte & Self::PICTURE_FLAG != 0 {
                    Compression::Picture
                } else if stored_length != length {
                    Compression::Lzw
                } else {
                    Compression::None
                };
                Self {
                    volume: volume_byte & !Self::PICTURE_FLAG,
                    length,
                    stored_length,
                    compression,
                }
            }
        };

        log::trace!("Block header at {offset:#x}: {header:?}");
        Ok(header)
    }

    /// Write the header
    pub fn write(&self, options: &VolumeOptions, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&options.signature);
        match options.format {
            HeaderFormat::V2 => {
                if self.compression != Compression::None {
                    return Err(Error::format(
                        "v2 volume headers cannot describe compressed resources",
                    ));
                }
                out.write_u8(self.volume)?;
                out.write_u16::<LittleEndian>(self.length)?;
            }
            HeaderFormat::V3 => {
                if self.volume & Self::PICTURE_FLAG != 0 {
                    return Err(Error::overflow(format!(
                        "Volume number {} collides with the picture flag",
                        self.volume
                    )));
                }
                let flag = if self.compression == Compression::Picture {
                    Self::PICTURE_FLAG
                } else {
                    0
                };
                out.write_u8(self.volume | flag)?;
                out.write_u16::<LittleEndian>(self.length)?;
                out.write_u16::<LittleEndian>(self.stored_length)?;
            }
        }
        Ok(())
    }

    /// Total size of the block, header included
    pub fn block_len(&self, options: &VolumeOptions) -> usize {
        options.format.header_size() + self.stored_length as usize
    }
}
