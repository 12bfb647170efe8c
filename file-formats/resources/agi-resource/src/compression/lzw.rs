//! LZW compression used by AGI v3 volume resources
//!
//! Codes are written least-significant bit first. Widths start at 9 bits
//! and grow to at most 11; the interpreter widens one entry earlier than
//! textbook LZW (when the entry about to be defined exceeds `2^width - 2`).
//! Code `0x100` clears the table and `0x101` ends the stream. Streams open
//! with a clear code.

use std::collections::HashMap;

use crate::{Error, Result};

const RESET: u16 = 0x100;
const END: u16 = 0x101;
const START_BITS: u32 = 9;
const MAX_BITS: u32 = 11;
/// Last entry the encoder defines before clearing the table
const LAST_ENTRY: usize = (1 << MAX_BITS) - 1;
/// Prefix value of the two reserved slots (`0x100`, `0x101`)
const RESERVED: u16 = u16::MAX;

struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Read `width` bits, `None` once the input is exhausted
    fn read(&mut self, width: u32) -> Option<u16> {
        if self.bit_pos + width as usize > self.data.len() * 8 {
            return None;
        }
        let mut value = 0u32;
        for i in 0..width as usize {
            let pos = self.bit_pos + i;
            let bit = (self.data[pos / 8] >> (pos % 8)) & 1;
            value |= u32::from(bit) << i;
        }
        self.bit_pos += width as usize;
        Some(value as u16)
    }
}

#[derive(Default)]
struct BitWriter {
    out: Vec<u8>,
    buffer: u32,
    bits: u32,
}

impl BitWriter {
    fn write(&mut self, code: u16, width: u32) {
        self.buffer |= u32::from(code) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.out.push(self.buffer as u8);
            self.buffer >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.buffer as u8);
        }
        self.out
    }
}

/// Entries for codes >= 0x100 as `(prefix code, appended byte)`
struct Table {
    entries: Vec<(u16, u8)>,
}

impl Table {
    fn new() -> Self {
        Self {
            entries: vec![(RESERVED, 0), (RESERVED, 0)],
        }
    }

    fn reset(&mut self) {
        self.entries.truncate(2);
        self.entries[1] = (RESERVED, 0);
    }

    fn define(&mut self, code: usize, prefix: u16, byte: u8) {
        let slot = code - 0x100;
        if slot < self.entries.len() {
            self.entries[slot] = (prefix, byte);
        } else {
            self.entries.push((prefix, byte));
        }
    }

    /// Append the string for `code` to `out`
    fn expand(&self, code: u16, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        let mut code = code;
        while code >= 0x100 {
            let &(prefix, byte) = self
                .entries
                .get((code - 0x100) as usize)
                .filter(|(prefix, _)| *prefix != RESERVED)
                .ok_or_else(|| Error::format(format!("LZW code {code:#x} is not defined")))?;
            out.push(byte);
            code = prefix;
        }
        out.push(code as u8);
        out[start..].reverse();
        Ok(())
    }
}

/// Decompress an LZW stream into at most `expected` bytes.
///
/// Fails with [`Error::Format`] on undefined codes or when the stream ends
/// before `expected` bytes were produced.
pub fn decompress(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut reader = BitReader::new(data);
    let mut table = Table::new();
    let mut width = START_BITS;
    let mut next = 0x101usize;
    let mut out = Vec::with_capacity(expected);

    let truncated = || Error::format("LZW stream ended before its first codes");
    let mut old = reader.read(width).ok_or_else(truncated)?;
    let mut last_first = old as u8;
    let mut new = reader.read(width).unwrap_or(END);

    while out.len() < expected && new != END {
        if new == RESET {
            next = 0x102;
            width = START_BITS;
            table.reset();
            old = reader.read(width).ok_or_else(truncated)?;
            if old >= 0x100 {
                return Err(Error::format(format!(
                    "LZW code {old:#x} cannot follow a table reset"
                )));
            }
            last_first = old as u8;
            out.push(last_first);
            new = reader.read(width).unwrap_or(END);
            continue;
        }

        let start = out.len();
        if new as usize >= next {
            if new as usize > next {
                return Err(Error::format(format!(
                    "LZW code {new:#x} is ahead of the table ({next:#x})"
                )));
            }
            table.expand(old, &mut out)?;
            out.push(last_first);
        } else {
            table.expand(new, &mut out)?;
        }
        last_first = out[start];

        if next > (1 << width) - 2 && width < MAX_BITS {
            width += 1;
        }
        table.define(next, old, last_first);
        next += 1;

        old = new;
        new = reader.read(width).unwrap_or(END);
    }

    if out.len() != expected {
        return Err(Error::format(format!(
            "LZW stream produced {} bytes, expected {expected}",
            out.len()
        )));
    }
    Ok(out)
}

/// Compress `data` into an LZW stream accepted by [`decompress`]
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut writer = BitWriter::default();
    let mut width = START_BITS;
    writer.write(RESET, width);

    let Some((&first, rest)) = data.split_first() else {
        writer.write(END, width);
        return writer.finish();
    };

    let mut dict: HashMap<(u16, u8), u16> = HashMap::new();
    // Mirror of the decoder's next free code and whether it will skip
    // defining an entry for the code it reads next
    let mut decoder_next = 0x101usize;
    let mut skip_define = false;
    let mut current = u16::from(first);

    for &byte in rest {
        if let Some(&code) = dict.get(&(current, byte)) {
            current = code;
            continue;
        }

        writer.write(current, width);
        if skip_define {
            skip_define = false;
        } else {
            if decoder_next > (1 << width) - 2 && width < MAX_BITS {
                width += 1;
            }
            decoder_next += 1;
        }

        if decoder_next > LAST_ENTRY {
            writer.write(RESET, width);
            dict.clear();
            width = START_BITS;
            decoder_next = 0x102;
            skip_define = true;
        } else {
            dict.insert((current, byte), decoder_next as u16);
        }
        current = u16::from(byte);
    }

    writer.write(current, width);
    if !skip_define && decoder_next > (1 << width) - 2 && width < MAX_BITS {
        width += 1;
    }
    writer.write(END, width);

    log::trace!(
        "LZW compressed {} bytes into {} bytes",
        data.len(),
        writer.out.len()
    );
    writer.finish()
}
