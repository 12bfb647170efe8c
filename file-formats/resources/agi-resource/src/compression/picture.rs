//! Picture compression used by AGI v3 picture resources
//!
//! The colour argument following a `0xF0` (set visual colour) or `0xF2`
//! (set priority colour) command is stored as a single nibble; everything
//! else stays a full byte, which can leave the stream half-byte aligned.
//! The picture ends at the `0xFF` command.

use crate::{Error, Result};

const SET_VISUAL: u8 = 0xF0;
const SET_PRIORITY: u8 = 0xF2;
const END_OF_PICTURE: u8 = 0xFF;

struct NibbleReader<'a> {
    data: &'a [u8],
    nibble: usize,
}

impl NibbleReader<'_> {
    fn nibble(&mut self) -> Result<u8> {
        let byte = self.data.get(self.nibble / 2).ok_or_else(|| {
            Error::format("Compressed picture ended in the middle of a command")
        })?;
        let value = if self.nibble % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        };
        self.nibble += 1;
        Ok(value)
    }

    fn byte(&mut self) -> Result<u8> {
        let high = self.nibble()?;
        let low = self.nibble()?;
        Ok((high << 4) | low)
    }

    fn at_end(&self) -> bool {
        self.nibble / 2 >= self.data.len()
    }
}

#[derive(Default)]
struct NibbleWriter {
    out: Vec<u8>,
    half: bool,
}

impl NibbleWriter {
    fn nibble(&mut self, value: u8) {
        if self.half {
            if let Some(last) = self.out.last_mut() {
                *last |= value & 0x0F;
            }
        } else {
            self.out.push(value << 4);
        }
        self.half = !self.half;
    }

    fn byte(&mut self, value: u8) {
        self.nibble(value >> 4);
        self.nibble(value & 0x0F);
    }
}

/// Expand a compressed picture to `expected` bytes
pub fn decompress(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut reader = NibbleReader { data, nibble: 0 };
    let mut out = Vec::with_capacity(expected);

    while out.len() < expected && !reader.at_end() {
        let byte = reader.byte()?;
        out.push(byte);
        if byte == END_OF_PICTURE {
            break;
        }
        if byte == SET_VISUAL || byte == SET_PRIORITY {
            out.push(reader.nibble()?);
        }
    }

    if out.len() != expected {
        return Err(Error::format(format!(
            "Compressed picture expanded to {} bytes, expected {expected}",
            out.len()
        )));
    }
    Ok(out)
}

/// Compress a picture.
///
/// Colour arguments must be below 16, and nothing may follow the end of
/// picture command, otherwise the picture cannot be represented.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut writer = NibbleWriter::default();
    let mut iter = data.iter().enumerate();

    while let Some((pos, &byte)) = iter.next() {
        writer.byte(byte);
        if byte == END_OF_PICTURE {
            if pos + 1 != data.len() {
                return Err(Error::format(format!(
                    "Picture has {} bytes after the end command",
                    data.len() - pos - 1
                )));
            }
            break;
        }
        if byte == SET_VISUAL || byte == SET_PRIORITY {
            let (_, &colour) = iter.next().ok_or_else(|| {
                Error::format("Picture ends before a colour argument")
            })?;
            if colour > 0x0F {
                return Err(Error::format(format!(
                    "Colour argument {colour:#04x} at offset {} does not fit a nibble",
                    pos + 1
                )));
            }
            writer.nibble(colour);
        }
    }

    Ok(writer.out)
}
