//! AGIP patch artifact
//!
//! ```text
//! "AGIP"                 magic
//! u16                    format version
//! u32                    length of the original
//! u32                    CRC32 of the original
//! opcodes:
//!   0x01 u32 u32         copy offset, length
//!   0x02 u32 bytes       insert length, literal bytes
//!   0x00                 end of instructions
//! u32                    CRC32 of the expected output
//! ```
//!
//! All integers are little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

use crate::apply::apply;
use crate::diff::{DiffOptions, PatchOp, PatchRecord, diff_with};
use crate::{Error, Result};

/// Magic bytes opening every patch
pub const PATCH_MAGIC: [u8; 4] = *b"AGIP";

/// Version written by this crate
pub const PATCH_VERSION: u16 = 1;

const OP_END: u8 = 0x00;
const OP_COPY: u8 = 0x01;
const OP_INSERT: u8 = 0x02;

/// A self-checking patch for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFile {
    /// Length of the original the patch was made against
    pub source_len: u32,
    /// CRC32 of that original
    pub source_crc: u32,
    /// Instructions
    pub record: PatchRecord,
    /// CRC32 of the output
    pub output_crc: u32,
}

impl PatchFile {
    /// Diff two buffers into a patch
    pub fn create(original: &[u8], modified: &[u8], options: &DiffOptions) -> Result<Self> {
        let source_len = to_u32(original.len(), "Original")?;
        to_u32(modified.len(), "Modified file")?;
        Ok(Self {
            source_len,
            source_crc: crc32fast::hash(original),
            record: diff_with(original, modified, options),
            output_crc: crc32fast::hash(modified),
        })
    }

    /// Parse a serialized patch
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(data);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(truncated)?;
        if magic != PATCH_MAGIC {
            return Err(Error::format(format!(
                "Invalid patch magic: expected {PATCH_MAGIC:02X?}, got {magic:02X?}"
            )));
        }

        let version = reader.read_u16::<LittleEndian>().map_err(truncated)?;
        if version != PATCH_VERSION {
            return Err(Error::format(format!(
                "Unsupported patch version {version}, expected {PATCH_VERSION}"
            )));
        }

        let source_len = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let source_crc = reader.read_u32::<LittleEndian>().map_err(truncated)?;

        let mut ops = Vec::new();
        loop {
            let opcode = reader.read_u8().map_err(truncated)?;
            match opcode {
                OP_END => break,
                OP_COPY => {
                    let offset = reader.read_u32::<LittleEndian>().map_err(truncated)?;
                    let length = reader.read_u32::<LittleEndian>().map_err(truncated)?;
                    ops.push(PatchOp::Copy {
                        offset: offset as usize,
                        length: length as usize,
                    });
                }
                OP_INSERT => {
                    let length = reader.read_u32::<LittleEndian>().map_err(truncated)? as usize;
                    let remaining = data.len() - reader.position() as usize;
                    if length > remaining {
                        return Err(Error::format(format!(
                            "Insert of {length} bytes with only {remaining} left in the patch"
                        )));
                    }
                    let mut bytes = vec![0u8; length];
                    reader.read_exact(&mut bytes).map_err(truncated)?;
                    ops.push(PatchOp::Insert(bytes));
                }
                other => {
                    return Err(Error::format(format!(
                        "Unknown opcode {other:#04x} at offset {:#x}",
                        reader.position() - 1
                    )));
                }
            }
        }

        let output_crc = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let trailing = data.len() - reader.position() as usize;
        if trailing != 0 {
            return Err(Error::format(format!(
                "{trailing} unexpected bytes after the patch"
            )));
        }

        log::debug!(
            "Parsed patch: {} instructions against a {source_len} byte original",
            ops.len()
        );
        Ok(Self {
            source_len,
            source_crc,
            record: PatchRecord::from_ops(ops),
            output_crc,
        })
    }

    /// Serialize the patch
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(&PATCH_MAGIC);
        out.write_u16::<LittleEndian>(PATCH_VERSION)?;
        out.write_u32::<LittleEndian>(self.source_len)?;
        out.write_u32::<LittleEndian>(self.source_crc)?;

        for op in self.record.ops() {
            match op {
                PatchOp::Copy { offset, length } => {
                    out.write_u8(OP_COPY)?;
                    out.write_u32::<LittleEndian>(to_u32(*offset, "Copy offset")?)?;
                    out.write_u32::<LittleEndian>(to_u32(*length, "Copy length")?)?;
                }
                PatchOp::Insert(bytes) => {
                    out.write_u8(OP_INSERT)?;
                    out.write_u32::<LittleEndian>(to_u32(bytes.len(), "Insert length")?)?;
                    out.extend_from_slice(bytes);
                }
            }
        }
        out.write_u8(OP_END)?;
        out.write_u32::<LittleEndian>(self.output_crc)?;
        Ok(out)
    }

    /// Check that `original` is the file this patch was made against
    pub fn verify_source(&self, original: &[u8]) -> Result<()> {
        if original.len() != self.source_len as usize {
            return Err(Error::mismatch(format!(
                "Original is {} bytes, patch expects {}",
                original.len(),
                self.source_len
            )));
        }
        let crc = crc32fast::hash(original);
        if crc != self.source_crc {
            return Err(Error::mismatch(format!(
                "Original CRC32 mismatch: expected {:08x}, got {crc:08x}",
                self.source_crc
            )));
        }
        Ok(())
    }

    /// Verify the original, apply the instructions and verify the output
    pub fn apply(&self, original: &[u8]) -> Result<Vec<u8>> {
        self.verify_source(original)?;
        let output = apply(original, &self.record)?;

        let crc = crc32fast::hash(&output);
        if crc != self.output_crc {
            return Err(Error::mismatch(format!(
                "Patched output CRC32 mismatch: expected {:08x}, got {crc:08x}",
                self.output_crc
            )));
        }
        Ok(output)
    }
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::format(format!("{what} of {value} does not fit 32 bits")))
}

fn truncated(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::format("Patch ends unexpectedly"),
        _ => Error::Io(e),
    }
}
