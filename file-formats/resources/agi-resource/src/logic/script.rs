//! Logic resource layout: bytecode followed by the message section

use byteorder::{LittleEndian, WriteBytesExt};

use crate::charset::Charset;
use crate::crypto::{AVIS_DURGAN, xor_in_place};
use crate::strings::{PoolEntry, pack, read_cstr};
use crate::{Error, Result};

/// Bytes before the message section header's pointer table
const SECTION_HEADER: usize = 3;

/// Options for decoding and encoding logic resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicOptions {
    /// Charset of the message text
    pub charset: Charset,
    /// Whether message text is XORed with `"Avis Durgan"`. Compressed v3
    /// logics store their messages in the clear.
    pub messages_encrypted: bool,
}

impl LogicOptions {
    /// Encrypted messages in `charset`
    pub fn new(charset: Charset) -> Self {
        Self {
            charset,
            messages_encrypted: true,
        }
    }

    /// Turn message encryption on or off
    pub fn with_encryption(mut self, messages_encrypted: bool) -> Self {
        self.messages_encrypted = messages_encrypted;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OriginalSection {
    messages: Vec<Option<String>>,
    offsets: Vec<Option<usize>>,
    bytes: Vec<u8>,
}

/// A decoded logic resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicScript {
    bytecode: Vec<u8>,
    messages: Vec<Option<String>>,
    capacity: usize,
    options: LogicOptions,
    original: Option<OriginalSection>,
}

impl LogicScript {
    /// Default size limit of an encoded logic
    pub const MAX_CAPACITY: usize = u16::MAX as usize;

    /// Build a script from bytecode and messages (message 1 first)
    pub fn new(bytecode: Vec<u8>, messages: Vec<Option<String>>, options: LogicOptions) -> Self {
        Self {
            bytecode,
            messages,
            capacity: Self::MAX_CAPACITY,
            options,
            original: None,
        }
    }

    /// Decode a logic resource payload
    pub fn decode(bytes: &[u8], options: &LogicOptions) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(Error::format("Logic is too short to hold its header"));
        }
        let section = 2 + u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
        if section + SECTION_HEADER > bytes.len() {
            return Err(Error::format(format!(
                "Message section at {section:#x} lies past the end of a {} byte logic",
                bytes.len()
            )));
        }

        let count = bytes[section] as usize;
        let base = section + 1;
        let text_start = section + SECTION_HEADER + count * 2;
        if text_start > bytes.len() {
            return Err(Error::format(format!(
                "Logic declares {count} messages but the pointer table is truncated"
            )));
        }

        let mut text = bytes[text_start..].to_vec();
        if options.messages_encrypted {
            xor_in_place(&mut text, AVIS_DURGAN);
        }

        let end = u16::from_le_bytes([bytes[section + 1], bytes[section + 2]]) as usize;
        if base + end > bytes.len() {
            log::warn!(
                "Message end pointer {end:#x} lies past the end of the logic ({} bytes)",
                bytes.len()
            );
        }

        let mut messages = Vec::with_capacity(count);
        let mut offsets = Vec::with_capacity(count);
        for number in 1..=count {
            let at = section + SECTION_HEADER + (number - 1) * 2;
            let pointer = u16::from_le_bytes([bytes[at], bytes[at + 1]]) as usize;
            if pointer == 0 {
                messages.push(None);
                offsets.push(None);
                continue;
            }

            let offset = (base + pointer).checked_sub(text_start).ok_or_else(|| {
                Error::format(format!(
                    "Message {number} pointer {pointer:#x} points into the pointer table"
                ))
            })?;
            let raw = read_cstr(&text, offset).ok_or_else(|| {
                Error::format(format!(
                    "Message {number} pointer {pointer:#x} lies past the end of the logic"
                ))
            })?;
            let message = options.charset.decode(raw)?;
            log::trace!("Message {number}: {message:?}");
            messages.push(Some(message));
            offsets.push(Some(offset));
        }

        log::debug!(
            "Decoded logic: {} bytes of code, {count} messages",
            section - 2
        );
        Ok(Self {
            bytecode: bytes[2..section].to_vec(),
            messages: messages.clone(),
            capacity: Self::MAX_CAPACITY,
            options: *options,
            original: Some(OriginalSection {
                messages,
                offsets,
                bytes: bytes[section..].to_vec(),
            }),
        })
    }

    /// Encode the logic.
    ///
    /// An unmodified message section is written back byte for byte;
    /// otherwise the strings are repacked in their original order and the
    /// pointer table is rebuilt.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let code_len = u16::try_from(self.bytecode.len()).map_err(|_| {
            Error::overflow(format!(
                "Bytecode of {} bytes does not fit a logic",
                self.bytecode.len()
            ))
        })?;

        let section = match &self.original {
            Some(original) if original.messages == self.messages => original.bytes.clone(),
            _ => self.encode_section()?,
        };

        let mut out = Vec::with_capacity(2 + self.bytecode.len() + section.len());
        out.write_u16::<LittleEndian>(code_len)?;
        out.extend_from_slice(&self.bytecode);
        out.extend_from_slice(&section);

        if out.len() > self.capacity {
            return Err(Error::overflow(format!(
                "Logic needs {} bytes, capacity is {}",
                out.len(),
                self.capacity
            )));
        }
        Ok(out)
    }

    fn encode_section(&self) -> Result<Vec<u8>> {
        let count = u8::try_from(self.messages.len()).map_err(|_| {
            Error::overflow(format!(
                "{} messages exceed the 255 message limit",
                self.messages.len()
            ))
        })?;

        let texts = self
            .messages
            .iter()
            .map(|message| {
                message
                    .as_deref()
                    .map(|text| self.options.charset.encode(text))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;

        let originals = self.original.as_ref().map(|o| o.offsets.as_slice());
        let entries = texts
            .iter()
            .enumerate()
            .map(|(i, text)| PoolEntry {
                original: originals.and_then(|offsets| offsets.get(i).copied().flatten()),
                text: text.as_deref(),
            })
            .collect::<Vec<_>>();
        let mut pool = pack(&entries);

        // Pointers are relative to the byte after the count
        let text_base = 2 + usize::from(count) * 2;
        let pointer = |offset: usize| {
            u16::try_from(text_base + offset).map_err(|_| {
                Error::overflow(format!(
                    "Message offset {:#x} does not fit 16 bits",
                    text_base + offset
                ))
            })
        };

        let mut section = Vec::with_capacity(SECTION_HEADER + text_base + pool.bytes.len());
        section.push(count);
        section.write_u16::<LittleEndian>(pointer(pool.bytes.len())?)?;
        for offset in &pool.offsets {
            let value = match offset {
                Some(offset) => pointer(*offset)?,
                None => 0,
            };
            section.write_u16::<LittleEndian>(value)?;
        }

        if self.options.messages_encrypted {
            xor_in_place(&mut pool.bytes, AVIS_DURGAN);
        }
        section.extend_from_slice(&pool.bytes);

        log::debug!(
            "Rebuilt message section: {count} messages, {} bytes",
            section.len()
        );
        Ok(section)
    }

    /// Bytecode between the header and the message section
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// Message table; index 0 holds message 1
    pub fn messages(&self) -> &[Option<String>] {
        &self.messages
    }

    /// Text of message `number` (1-based)
    pub fn message(&self, number: u8) -> Option<&str> {
        let index = usize::from(number).checked_sub(1)?;
        self.messages.get(index)?.as_deref()
    }

    /// Replace the text of an existing message
    pub fn set_message(&mut self, number: u8, text: impl Into<String>) -> Result<()> {
        let count = self.messages.len();
        let slot = usize::from(number)
            .checked_sub(1)
            .and_then(|index| self.messages.get_mut(index))
            .and_then(Option::as_mut)
            .ok_or_else(|| {
                Error::format(format!(
                    "Message {number} does not exist ({count} message slots)"
                ))
            })?;
        *slot = text.into();
        Ok(())
    }

    /// Options the script was decoded with
    pub fn options(&self) -> &LogicOptions {
        &self.options
    }

    /// Largest encoded size accepted by [`encode`](Self::encode)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Limit the encoded size, e.g. to the space a block has in its volume
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}
