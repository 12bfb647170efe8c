//! A single resource block read from a volume

use super::header::{HeaderFormat, ResourceHeader, VolumeOptions};
use crate::compression::Compression;
use crate::{Error, Result};

/// A resource block: header fields plus its payload.
///
/// The stored (possibly compressed) bytes are kept alongside the payload so
/// that an unmodified block re-encodes byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeResource {
    options: VolumeOptions,
    volume: u8,
    compression: Compression,
    payload: Vec<u8>,
    stored: Option<Vec<u8>>,
}

impl VolumeResource {
    /// Largest payload a block header can describe
    pub const MAX_LENGTH: usize = u16::MAX as usize;

    /// Create an uncompressed resource
    pub fn new(volume: u8, payload: Vec<u8>, options: VolumeOptions) -> Result<Self> {
        check_length(payload.len())?;
        Ok(Self {
            options,
            volume,
            compression: Compression::None,
            payload,
            stored: None,
        })
    }

    /// Create a resource stored with `compression` (v3 volumes only).
    ///
    /// LZW output that would not be smaller than the payload is stored
    /// verbatim instead, since the interpreter tells the two apart by
    /// comparing lengths.
    pub fn compressed(
        volume: u8,
        payload: Vec<u8>,
        compression: Compression,
        options: VolumeOptions,
    ) -> Result<Self> {
        check_length(payload.len())?;
        if compression != Compression::None && options.format != HeaderFormat::V3 {
            return Err(Error::format(
                "Compressed resources require v3 volume headers",
            ));
        }

        let (compression, stored) = match compression {
            Compression::None => (Compression::None, None),
            Compression::Lzw => {
                let packed = compression.compress(&payload)?;
                if packed.len() >= payload.len() {
                    log::debug!(
                        "LZW did not shrink {} byte payload, storing uncompressed",
                        payload.len()
                    );
                    (Compression::None, None)
                } else {
                    (Compression::Lzw, Some(packed))
                }
            }
            Compression::Picture => {
                let packed = compression.compress(&payload)?;
                check_length(packed.len())?;
                (Compression::Picture, Some(packed))
            }
        };

        Ok(Self {
            options,
            volume,
            compression,
            payload,
            stored,
        })
    }

    /// Read the block starting at `offset` of a volume
    pub fn read(volume: &[u8], offset: usize, options: &VolumeOptions) -> Result<Self> {
        let header = ResourceHeader::read(volume, offset, options)?;
        let start = offset + options.format.header_size();
        let declared = header.stored_length as usize;
        let available = volume.len() - start;
        if declared > available {
            return Err(Error::TruncatedResource {
                offset,
                declared,
                available,
            });
        }

        let stored = &volume[start..start + declared];
        let payload = header
            .compression
            .decompress(stored, header.length as usize)?;
        if payload.len() != header.length as usize {
            return Err(Error::format(format!(
                "Resource at {offset:#x} expands to {} bytes, header declares {}",
                payload.len(),
                header.length
            )));
        }

        Ok(Self {
            options: *options,
            volume: header.volume,
            compression: header.compression,
            payload,
            stored: (header.compression != Compression::None).then(|| stored.to_vec()),
        })
    }

    /// A copy of this resource with a new payload, stored the same way
    pub fn with_payload(&self, payload: Vec<u8>) -> Result<Self> {
        Self::compressed(self.volume, payload, self.compression, self.options)
    }

    /// A copy of this resource recorded under another volume number
    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume;
        self
    }

    /// Decompressed payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the resource, returning its payload
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Volume number recorded in the block header
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Storage scheme
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Check if the payload is stored compressed
    pub fn is_compressed(&self) -> bool {
        self.compression != Compression::None
    }

    /// Options the block was read or created with
    pub fn options(&self) -> &VolumeOptions {
        &self.options
    }

    /// Bytes following the header on disk
    pub fn stored(&self) -> &[u8] {
        self.stored.as_deref().unwrap_or(&self.payload)
    }

    /// Block header describing this resource
    pub fn header(&self) -> ResourceHeader {
        ResourceHeader {
            volume: self.volume,
            length: self.payload.len() as u16,
            stored_length: self.stored().len() as u16,
            compression: self.compression,
        }
    }

    /// Size of the encoded block, header included
    pub fn block_len(&self) -> usize {
        self.options.format.header_size() + self.stored().len()
    }

    /// Encode header and stored bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.block_len());
        self.header().write(&self.options, &mut out)?;
        out.extend_from_slice(self.stored());
        Ok(out)
    }
}

fn check_length(length: usize) -> Result<()> {
    if length > VolumeResource::MAX_LENGTH {
        return Err(Error::overflow(format!(
            "Resource of {length} bytes exceeds the {} byte block limit",
            VolumeResource::MAX_LENGTH
        )));
    }
    Ok(())
}
