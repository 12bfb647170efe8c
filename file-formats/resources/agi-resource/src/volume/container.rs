//! Whole volume files and resource placement

use super::header::{ResourceHeader, VolumeOptions};
use super::resource::VolumeResource;
use crate::directory::DirectoryEntry;
use crate::{Error, Result};

/// Where [`Volume::write_resource`] may put a rewritten block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Overwrite the old block; fail with [`Error::Overflow`] if it does not fit
    InPlace,
    /// Always append at the end of the volume
    Append,
    /// Overwrite when the block fits, append otherwise
    #[default]
    Auto,
}

/// What [`Volume::write_resource`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a relocated resource needs its directory entry updated"]
pub enum WriteOutcome {
    /// The block was overwritten at its old offset
    InPlace {
        /// Offset of the block
        offset: usize,
        /// Bytes of the old block left untouched after the new one
        unused: usize,
    },
    /// The block was appended; the directory entry must move to `offset`
    Relocated {
        /// Offset the directory pointed at before
        old_offset: usize,
        /// New offset of the block
        offset: usize,
    },
}

impl WriteOutcome {
    /// Offset the block now lives at
    pub fn offset(&self) -> usize {
        match *self {
            WriteOutcome::InPlace { offset, .. } | WriteOutcome::Relocated { offset, .. } => offset,
        }
    }

    /// Check if the caller must update the directory
    pub fn is_relocated(&self) -> bool {
        matches!(self, WriteOutcome::Relocated { .. })
    }

    /// Directory entry pointing at the block inside volume `volume`
    pub fn directory_entry(&self, volume: u8) -> Result<DirectoryEntry> {
        let offset = u32::try_from(self.offset())
            .map_err(|_| Error::overflow(format!("Offset {:#x} exceeds 32 bits", self.offset())))?;
        DirectoryEntry::new(volume, offset)
    }
}

/// An in-memory `VOL.n` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    number: u8,
    data: Vec<u8>,
    options: VolumeOptions,
}

impl Volume {
    /// Wrap the bytes of volume file `number`
    pub fn new(number: u8, data: Vec<u8>, options: VolumeOptions) -> Self {
        Self {
            number,
            data,
            options,
        }
    }

    /// Volume number
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the volume, returning its bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the volume holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Header options
    pub fn options(&self) -> &VolumeOptions {
        &self.options
    }

    /// Read the block at `offset`
    pub fn read_resource(&self, offset: usize) -> Result<VolumeResource> {
        VolumeResource::read(&self.data, offset, &self.options)
    }

    /// Read the block a directory entry points at.
    ///
    /// Absent entries and entries for other volumes are a [`Error::Format`].
    pub fn read_entry(&self, entry: DirectoryEntry) -> Result<VolumeResource> {
        match entry.location() {
            Some((volume, offset)) if volume == self.number => self.read_resource(offset as usize),
            Some((volume, _)) => Err(Error::format(format!(
                "Entry for volume {volume} read from volume {}",
                self.number
            ))),
            None => Err(Error::format("Cannot read an absent resource")),
        }
    }

    /// Replace the block at `offset` with `resource`.
    ///
    /// An in-place write leaves the bytes of the old block beyond the new
    /// one as they were; the engine never reads past the declared length.
    pub fn write_resource(
        &mut self,
        offset: usize,
        resource: &VolumeResource,
        placement: Placement,
    ) -> Result<WriteOutcome> {
        let old = ResourceHeader::read(&self.data, offset, &self.options)?;
        let old_len = old.block_len(&self.options);
        let block = self.encode_block(resource)?;

        let fits = block.len() <= old_len && offset + old_len <= self.data.len();
        match placement {
            Placement::InPlace if !fits => Err(Error::overflow(format!(
                "Resource of {} bytes does not fit the {old_len} byte block at {offset:#x}",
                block.len()
            ))),
            Placement::InPlace | Placement::Auto if fits => {
                self.data[offset..offset + block.len()].copy_from_slice(&block);
                log::debug!(
                    "Rewrote block at {offset:#x} in volume {} ({} of {old_len} bytes)",
                    self.number,
                    block.len()
                );
                Ok(WriteOutcome::InPlace {
                    offset,
                    unused: old_len - block.len(),
                })
            }
            _ => {
                let new_offset = self.append_block(&block)?;
                log::debug!(
                    "Relocated block {offset:#x} -> {new_offset:#x} in volume {}",
                    self.number
                );
                Ok(WriteOutcome::Relocated {
                    old_offset: offset,
                    offset: new_offset,
                })
            }
        }
    }

    /// Append a new block, returning its offset
    pub fn append_resource(&mut self, resource: &VolumeResource) -> Result<usize> {
        let block = self.encode_block(resource)?;
        self.append_block(&block)
    }

    fn encode_block(&self, resource: &VolumeResource) -> Result<Vec<u8>> {
        if resource.options() != &self.options {
            return Err(Error::format(
                "Resource header options differ from the volume's",
            ));
        }
        resource.clone().with_volume(self.number).encode()
    }

    fn append_block(&mut self, block: &[u8]) -> Result<usize> {
        let offset = self.data.len();
        if offset > DirectoryEntry::MAX_OFFSET as usize {
            return Err(Error::overflow(format!(
                "Volume {} is {offset:#x} bytes, past the directory's addressable range",
                self.number
            )));
        }
        self.data.extend_from_slice(block);
        Ok(offset)
    }
}

/// Read the block at `offset` of raw volume bytes
pub fn read_resource(
    volume: &[u8],
    offset: usize,
    options: &VolumeOptions,
) -> Result<VolumeResource> {
    VolumeResource::read(volume, offset, options)
}

/// Rewrite the block at `offset`, returning the new volume bytes and what happened
pub fn write_resource(
    volume: &[u8],
    number: u8,
    offset: usize,
    resource: &VolumeResource,
    placement: Placement,
) -> Result<(Vec<u8>, WriteOutcome)> {
    let mut container = Volume::new(number, volume.to_vec(), *resource.options());
    let outcome = container.write_resource(offset, resource, placement)?;
    Ok((container.into_data(), outcome))
}
