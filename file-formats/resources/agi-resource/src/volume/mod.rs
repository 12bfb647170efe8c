//! Volume container codec
//!
//! Resources live back to back in `VOL.n` files. Each block opens with a
//! two byte signature and a small header giving the volume number and
//! payload length; v3 headers add the stored length and a picture flag so
//! the payload can be compressed.

mod container;
mod header;
mod resource;

pub use container::{Placement, Volume, WriteOutcome, read_resource, write_resource};
pub use header::{HeaderFormat, ResourceHeader, VolumeOptions};
pub use resource::VolumeResource;
