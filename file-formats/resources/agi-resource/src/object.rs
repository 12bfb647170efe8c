//! OBJECT file codec
//!
//! The inventory object table starts with a three byte header
//! (`names_offset: u16`, `max_animated: u8`), followed by one record per
//! object (`name_offset: u16`, `start_room: u8`, plus a pad byte on Amiga)
//! and the pool of NUL-terminated names. Name offsets are relative to the
//! end of the header. Most games XOR the whole file with `"Avis Durgan"`.
//!
//! ```
//! use agi_resource::{Charset, ObjectOptions, ObjectTable};
//!
//! # fn main() -> Result<(), agi_resource::Error> {
//! let bytes = [6, 0, 0, 6, 0, 0, 8, 0, 3, b'?', 0, b'k', b'e', b'y', 0];
//! let charset = Charset::transparent();
//! let mut table = ObjectTable::decode(&bytes, &charset, &ObjectOptions::default())?;
//! assert_eq!(table.entries()[1].name, "key");
//!
//! table.rename(1, "ko")?;
//! let encoded = table.encode(&charset)?;
//! assert!(encoded.len() <= bytes.len());
//! # Ok(())
//! # }
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::charset::Charset;
use crate::crypto::{AVIS_DURGAN, xor_in_place};
use crate::strings::{PoolEntry, pack, read_cstr};
use crate::{Error, Result};

const HEADER_SIZE: usize = 3;

/// Most objects an interpreter can address
pub const MAX_OBJECTS: usize = 256;

/// Record layout of the target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Platform {
    /// 3 byte records
    #[default]
    Dos,
    /// 4 byte records
    Amiga,
}

impl Platform {
    /// Bytes per object record
    pub fn record_width(self) -> usize {
        match self {
            Platform::Dos => 3,
            Platform::Amiga => 4,
        }
    }
}

/// Options for decoding an object table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectOptions {
    /// Record layout
    pub platform: Platform,
    /// Force obfuscation on or off; detected from the header when `None`
    pub encrypted: Option<bool>,
}

/// One inventory object
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectEntry {
    /// Displayed name
    pub name: String,
    /// Room the object starts in (255 means carried by ego)
    pub start_room: u8,
}

/// Position of an entry's name as decoded
#[derive(Debug, Clone)]
struct OriginalName {
    offset: usize,
    name: String,
}

/// A decoded OBJECT file
#[derive(Debug, Clone)]
pub struct ObjectTable {
    entries: Vec<ObjectEntry>,
    max_animated: u8,
    encrypted: bool,
    platform: Platform,
    capacity: usize,
    originals: Vec<OriginalName>,
    pads: Vec<u8>,
    names_area: Vec<u8>,
}

impl ObjectTable {
    /// Decode an OBJECT file
    pub fn decode(bytes: &[u8], charset: &Charset, options: &ObjectOptions) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::format(format!(
                "Object file of {} bytes is shorter than its header",
                bytes.len()
            )));
        }

        let raw_first = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
        let encrypted = options.encrypted.unwrap_or(raw_first > bytes.len());
        let mut data = bytes.to_vec();
        if encrypted {
            log::debug!("Object file is obfuscated, decrypting");
            xor_in_place(&mut data, AVIS_DURGAN);
        }

        let mut cursor = Cursor::new(&data[..]);
        let names_offset = cursor.read_u16::<LittleEndian>()? as usize;
        let max_animated = cursor.read_u8()?;

        let width = options.platform.record_width();
        let names_start = HEADER_SIZE + names_offset;
        if names_start > data.len() {
            return Err(Error::format(format!(
                "Object names start at {names_start:#x}, past the end of a {} byte file",
                data.len()
            )));
        }
        if names_offset % width != 0 {
            return Err(Error::format(format!(
                "Name table offset {names_offset} is not a multiple of the {width} byte record"
            )));
        }
        let count = names_offset / width;
        if count > MAX_OBJECTS {
            return Err(Error::format(format!(
                "Object file declares {count} objects, at most {MAX_OBJECTS} are supported"
            )));
        }

        let mut entries = Vec::with_capacity(count);
        let mut originals = Vec::with_capacity(count);
        let mut pads = Vec::with_capacity(count);
        for index in 0..count {
            let record = HEADER_SIZE + index * width;
            let mut cursor = Cursor::new(&data[record..record + width]);
            let offset = cursor.read_u16::<LittleEndian>()? as usize;
            let start_room = cursor.read_u8()?;
            if width > 3 {
                pads.push(cursor.read_u8()?);
            }

            let raw_name = read_cstr(&data, HEADER_SIZE + offset).ok_or_else(|| {
                Error::format(format!(
                    "Object {index} name offset {offset:#x} is past the end of the file"
                ))
            })?;
            let name = charset.decode(raw_name)?;
            log::trace!("Object {index}: {name:?} in room {start_room}");

            originals.push(OriginalName {
                offset,
                name: name.clone(),
            });
            entries.push(ObjectEntry { name, start_room });
        }

        log::debug!("Decoded {count} objects ({} bytes)", bytes.len());
        Ok(Self {
            entries,
            max_animated,
            encrypted,
            platform: options.platform,
            capacity: bytes.len(),
            originals,
            pads,
            names_area: data[names_start..].to_vec(),
        })
    }

    /// Objects in index order
    pub fn entries(&self) -> &[ObjectEntry] {
        &self.entries
    }

    /// Object at `index`
    pub fn get(&self, index: usize) -> Option<&ObjectEntry> {
        self.entries.get(index)
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no objects
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Header byte giving the number of animated objects the game allocates
    pub fn max_animated(&self) -> u8 {
        self.max_animated
    }

    /// Whether the file is written obfuscated
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Record layout
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Largest encoded size accepted by [`encode`](Self::encode)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allow the encoded table to grow up to `capacity` bytes
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Write the table obfuscated or in the clear
    pub fn with_encryption(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Replace the name of object `index`
    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let count = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or_else(|| Error::format(format!("Object {index} does not exist ({count} objects)")))?;
        entry.name = name.into();
        Ok(())
    }

    /// Change the room object `index` starts in
    pub fn set_start_room(&mut self, index: usize, room: u8) -> Result<()> {
        let count = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or_else(|| Error::format(format!("Object {index} does not exist ({count} objects)")))?;
        entry.start_room = room;
        Ok(())
    }

    /// Encode the table.
    ///
    /// When every name is unchanged the name pool is written back as
    /// decoded, so only start rooms can differ from the input.
    pub fn encode(&self, charset: &Charset) -> Result<Vec<u8>> {
        let names = self
            .entries
            .iter()
            .map(|entry| charset.encode(&entry.name))
            .collect::<Result<Vec<_>>>()?;

        let width = self.platform.record_width();
        let names_offset = self.entries.len() * width;
        let unchanged = self
            .entries
            .iter()
            .zip(&self.originals)
            .all(|(entry, original)| entry.name == original.name);

        let (offsets, area) = if unchanged {
            let offsets = self.originals.iter().map(|o| o.offset).collect::<Vec<_>>();
            (offsets, self.names_area.clone())
        } else {
            self.relayout(&names, names_offset)
        };

        let mut out = Vec::with_capacity(HEADER_SIZE + names_offset + area.len());
        out.write_u16::<LittleEndian>(to_u16(names_offset)?)?;
        out.write_u8(self.max_animated)?;
        for (index, (entry, offset)) in self.entries.iter().zip(&offsets).enumerate() {
            out.write_u16::<LittleEndian>(to_u16(*offset)?)?;
            out.write_u8(entry.start_room)?;
            if width > 3 {
                out.write_u8(self.pads.get(index).copied().unwrap_or(0))?;
            }
        }
        out.extend_from_slice(&area);

        if out.len() > self.capacity {
            return Err(Error::overflow(format!(
                "Object table needs {} bytes, capacity is {}",
                out.len(),
                self.capacity
            )));
        }

        if self.encrypted {
            xor_in_place(&mut out, AVIS_DURGAN);
        }
        Ok(out)
    }

    /// Pack renamed names, keeping bytes that followed the last name
    fn relayout(&self, names: &[Vec<u8>], names_offset: usize) -> (Vec<usize>, Vec<u8>) {
        let pool_entries = names
            .iter()
            .zip(&self.originals)
            .map(|(name, original)| PoolEntry {
                original: Some(original.offset),
                text: Some(name.as_slice()),
            })
            .collect::<Vec<_>>();
        let mut pool = pack(&pool_entries);

        let used_end = self
            .originals
            .iter()
            .filter_map(|o| {
                let start = o.offset.checked_sub(names_offset)?;
                read_cstr(&self.names_area, start).map(|name| start + name.len() + 1)
            })
            .max()
            .unwrap_or(0);
        if let Some(trailer) = self.names_area.get(used_end..) {
            pool.bytes.extend_from_slice(trailer);
        }

        log::debug!(
            "Rebuilt object name pool: {} -> {} bytes",
            self.names_area.len(),
            pool.bytes.len()
        );

        let offsets = pool
            .offsets
            .iter()
            .map(|offset| offset.unwrap_or(0) + names_offset)
            .collect();
        (offsets, pool.bytes)
    }
}

fn to_u16(value: usize) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| Error::overflow(format!("Object offset {value:#x} does not fit 16 bits")))
}
