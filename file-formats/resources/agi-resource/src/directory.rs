//! Resource directory files (LOGDIR, PICDIR, VIEWDIR, SNDDIR)
//!
//! A directory is a flat array of 3-byte records, one per logical resource
//! number. Each record packs a volume number into the high nibble and a
//! 20-bit byte offset into the remaining bits:
//!
//! ```text
//! byte 0: VVVV OOOO   volume (4 bits), offset bits 19..16
//! byte 1: OOOO OOOO   offset bits 15..8
//! byte 2: OOOO OOOO   offset bits 7..0
//! ```
//!
//! `FF FF FF` marks a resource number that is not present. AGI v3 games merge
//! the four directories into a single `xxDIR` file, handled by
//! [`DirectoryBundle`].

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::Cursor;

use crate::{Error, Result};

/// Kind of resource addressed by a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    /// Logic scripts (LOGDIR)
    Logic,
    /// Pictures (PICDIR)
    Picture,
    /// Views (VIEWDIR)
    View,
    /// Sounds (SNDDIR)
    Sound,
}

impl ResourceKind {
    /// All kinds in v3 directory order
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Logic,
        ResourceKind::Picture,
        ResourceKind::View,
        ResourceKind::Sound,
    ];

    /// File name of the v2 directory for this kind
    pub fn dir_file_name(self) -> &'static str {
        match self {
            ResourceKind::Logic => "LOGDIR",
            ResourceKind::Picture => "PICDIR",
            ResourceKind::View => "VIEWDIR",
            ResourceKind::Sound => "SNDDIR",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Logic => "logic",
            ResourceKind::Picture => "picture",
            ResourceKind::View => "view",
            ResourceKind::Sound => "sound",
        };
        f.write_str(name)
    }
}

/// One directory record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectoryEntry {
    /// Resource number is not used
    Absent,
    /// Resource lives at `offset` inside volume file `VOL.<volume>`
    Present {
        /// Volume number (0..=15)
        volume: u8,
        /// Byte offset of the resource header inside the volume
        offset: u32,
    },
}

impl DirectoryEntry {
    /// Size of an on-disk record
    pub const SIZE: usize = 3;
    /// Largest representable volume number
    pub const MAX_VOLUME: u8 = 0x0F;
    /// Largest representable offset
    pub const MAX_OFFSET: u32 = 0x000F_FFFF;

    const ABSENT_BYTES: [u8; 3] = [0xFF, 0xFF, 0xFF];

    /// Create a present entry, checking that it fits the record layout
    pub fn new(volume: u8, offset: u32) -> Result<Self> {
        if volume > Self::MAX_VOLUME {
            return Err(Error::overflow(format!(
                "Volume {volume} exceeds the directory limit of {}",
                Self::MAX_VOLUME
            )));
        }
        if offset > Self::MAX_OFFSET {
            return Err(Error::overflow(format!(
                "Offset {offset:#x} exceeds the 20-bit directory limit"
            )));
        }
        if volume == Self::MAX_VOLUME && offset == Self::MAX_OFFSET {
            return Err(Error::overflow(
                "Volume 15 offset 0xFFFFF collides with the absent marker",
            ));
        }
        Ok(DirectoryEntry::Present { volume, offset })
    }

    /// Decode a record
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        if bytes == Self::ABSENT_BYTES {
            return DirectoryEntry::Absent;
        }
        DirectoryEntry::Present {
            volume: bytes[0] >> 4,
            offset: (u32::from(bytes[0] & 0x0F) << 16)
                | (u32::from(bytes[1]) << 8)
                | u32::from(bytes[2]),
        }
    }

    /// Encode a record
    pub fn to_bytes(&self) -> Result<[u8; 3]> {
        match *self {
            DirectoryEntry::Absent => Ok(Self::ABSENT_BYTES),
            DirectoryEntry::Present { volume, offset } => {
                // Re-validate: the variant fields are public
                Self::new(volume, offset)?;
                Ok([
                    (volume << 4) | ((offset >> 16) as u8 & 0x0F),
                    (offset >> 8) as u8,
                    offset as u8,
                ])
            }
        }
    }

    /// Check if this entry points at a resource
    pub fn is_present(&self) -> bool {
        matches!(self, DirectoryEntry::Present { .. })
    }

    /// `(volume, offset)` for present entries
    pub fn location(&self) -> Option<(u8, u32)> {
        match *self {
            DirectoryEntry::Absent => None,
            DirectoryEntry::Present { volume, offset } => Some((volume, offset)),
        }
    }
}

/// An ordered directory for one resource kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory from entries
    pub fn from_entries(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    /// Decode a directory file
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % DirectoryEntry::SIZE != 0 {
            return Err(Error::format(format!(
                "Directory length {} is not a multiple of {}",
                bytes.len(),
                DirectoryEntry::SIZE
            )));
        }

        let entries = bytes
            .chunks_exact(DirectoryEntry::SIZE)
            .map(|chunk| DirectoryEntry::from_bytes([chunk[0], chunk[1], chunk[2]]))
            .collect::<Vec<_>>();

        log::trace!(
            "Decoded directory with {} entries ({} present)",
            entries.len(),
            entries.iter().filter(|e| e.is_present()).count()
        );

        Ok(Self { entries })
    }

    /// Encode the directory
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.entries.len() * DirectoryEntry::SIZE);
        for entry in &self.entries {
            out.extend_from_slice(&entry.to_bytes()?);
        }
        Ok(out)
    }

    /// Number of records, present or absent
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the directory has no records
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All records in resource-number order
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Record for a resource number; numbers past the end are absent
    pub fn get(&self, number: usize) -> DirectoryEntry {
        self.entries
            .get(number)
            .copied()
            .unwrap_or(DirectoryEntry::Absent)
    }

    /// Replace the record for a resource number, padding with absent
    /// records if the directory must grow
    pub fn set(&mut self, number: usize, entry: DirectoryEntry) {
        if number >= self.entries.len() {
            self.entries.resize(number + 1, DirectoryEntry::Absent);
        }
        self.entries[number] = entry;
    }

    /// Iterate present records as `(number, volume, offset)`
    pub fn iter_present(&self) -> impl Iterator<Item = (usize, u8, u32)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(number, entry)| entry.location().map(|(v, o)| (number, v, o)))
    }

    /// Check every present record against the byte lengths of the volumes,
    /// indexed by volume number.
    pub fn validate_against(&self, volume_lengths: &[usize]) -> Result<()> {
        for (number, volume, offset) in self.iter_present() {
            let length = volume_lengths.get(volume as usize).ok_or_else(|| {
                Error::format(format!(
                    "Resource {number} refers to missing volume {volume}"
                ))
            })?;
            if offset as usize >= *length {
                return Err(Error::format(format!(
                    "Resource {number} offset {offset:#x} is outside volume {volume} ({length} bytes)"
                )));
            }
        }
        Ok(())
    }
}

/// The four directories of a game, as stored in a v3 combined directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryBundle {
    /// Logic directory
    pub logic: Directory,
    /// Picture directory
    pub picture: Directory,
    /// View directory
    pub view: Directory,
    /// Sound directory
    pub sound: Directory,
}

impl DirectoryBundle {
    const HEADER_SIZE: usize = 8;

    /// Directory for a resource kind
    pub fn get(&self, kind: ResourceKind) -> &Directory {
        match kind {
            ResourceKind::Logic => &self.logic,
            ResourceKind::Picture => &self.picture,
            ResourceKind::View => &self.view,
            ResourceKind::Sound => &self.sound,
        }
    }

    /// Mutable directory for a resource kind
    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut Directory {
        match kind {
            ResourceKind::Logic => &mut self.logic,
            ResourceKind::Picture => &mut self.picture,
            ResourceKind::View => &mut self.view,
            ResourceKind::Sound => &mut self.sound,
        }
    }

    /// Decode a v3 combined directory: four little-endian u16 section
    /// offsets followed by the sections back to back.
    pub fn decode_v3(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(Error::format(format!(
                "Combined directory too small: {} bytes",
                bytes.len()
            )));
        }

        let mut cursor = Cursor::new(bytes);
        let mut offsets = [0usize; 4];
        for offset in &mut offsets {
            *offset = cursor.read_u16::<LittleEndian>()? as usize;
        }

        if offsets[0] != Self::HEADER_SIZE {
            return Err(Error::format(format!(
                "Combined directory logic section starts at {}, expected {}",
                offsets[0],
                Self::HEADER_SIZE
            )));
        }

        let mut bundle = Self::default();
        for (i, kind) in ResourceKind::ALL.iter().enumerate() {
            let start = offsets[i];
            let end = offsets.get(i + 1).copied().unwrap_or(bytes.len());
            if start > end || end > bytes.len() {
                return Err(Error::format(format!(
                    "Combined directory {kind} section {start}..{end} is out of order or out of bounds"
                )));
            }
            *bundle.get_mut(*kind) = Directory::decode(&bytes[start..end])?;
        }

        Ok(bundle)
    }

    /// Encode as a v3 combined directory
    pub fn encode_v3(&self) -> Result<Vec<u8>> {
        let sections = ResourceKind::ALL
            .iter()
            .map(|kind| self.get(*kind).encode())
            .collect::<Result<Vec<_>>>()?;

        let mut header = Vec::with_capacity(Self::HEADER_SIZE);
        let mut position = Self::HEADER_SIZE;
        for section in &sections {
            let offset = u16::try_from(position).map_err(|_| {
                Error::overflow(format!(
                    "Combined directory section offset {position} exceeds 16 bits"
                ))
            })?;
            header.write_u16::<LittleEndian>(offset)?;
            position += section.len();
        }

        let mut out = header;
        for section in sections {
            out.extend_from_slice(&section);
        }
        Ok(out)
    }
}
