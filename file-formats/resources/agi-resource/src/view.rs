//! Inventory descriptions embedded in VIEW resources
//!
//! Bytes 3..5 of a view payload hold a little-endian offset to a
//! NUL-terminated description shown when the player looks at an inventory
//! item, or 0 when the view has none.

use crate::charset::Charset;
use crate::strings::read_cstr;
use crate::volume::Placement;
use crate::{Error, Result};

const POINTER: std::ops::Range<usize> = 3..5;

/// Description text and where it lives in the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescription {
    /// Offset of the text inside the payload
    pub offset: usize,
    /// Decoded text
    pub text: String,
    /// Encoded length of the current text, the room available in place
    pub capacity: usize,
}

/// Read the description of a view payload
pub fn read_description(payload: &[u8], charset: &Charset) -> Result<Option<ViewDescription>> {
    let offset = description_offset(payload)?;
    if offset == 0 {
        return Ok(None);
    }

    let raw = read_cstr(payload, offset).ok_or_else(|| {
        Error::format(format!(
            "Description offset {offset:#x} lies past the end of a {} byte view",
            payload.len()
        ))
    })?;
    Ok(Some(ViewDescription {
        offset,
        text: charset.decode(raw)?,
        capacity: raw.len(),
    }))
}

/// Replace (or add) the description of a view payload.
///
/// Shorter text is written over the old one and padded with spaces so
/// the payload keeps its size. Longer text is appended to the payload
/// when `placement` allows it, with the pointer moved to the new copy.
pub fn write_description(
    payload: &[u8],
    text: &str,
    charset: &Charset,
    placement: Placement,
) -> Result<Vec<u8>> {
    let encoded = charset.encode(text)?;
    let current = read_description(payload, charset)?;
    let mut out = payload.to_vec();

    let fits = current
        .as_ref()
        .is_some_and(|current| encoded.len() <= current.capacity);

    match (placement, current) {
        (Placement::InPlace | Placement::Auto, Some(current)) if fits => {
            let end = current.offset + current.capacity;
            out[current.offset..current.offset + encoded.len()].copy_from_slice(&encoded);
            out[current.offset + encoded.len()..end].fill(b' ');
            log::debug!(
                "Wrote view description in place ({} of {} bytes)",
                encoded.len(),
                current.capacity
            );
        }
        (Placement::InPlace, current) => {
            return Err(Error::overflow(format!(
                "Description of {} bytes does not fit the {} bytes available",
                encoded.len(),
                current.map_or(0, |c| c.capacity)
            )));
        }
        _ => {
            let offset = u16::try_from(out.len()).map_err(|_| {
                Error::overflow(format!(
                    "View of {} bytes is too large to address a relocated description",
                    out.len()
                ))
            })?;
            out.extend_from_slice(&encoded);
            out.push(0);
            out[POINTER].copy_from_slice(&offset.to_le_bytes());
            log::debug!("Relocated view description to {offset:#x}");
        }
    }

    if out.len() > u16::MAX as usize {
        return Err(Error::overflow(format!(
            "View grew to {} bytes, past the block limit",
            out.len()
        )));
    }
    Ok(out)
}

fn description_offset(payload: &[u8]) -> Result<usize> {
    let bytes = payload.get(POINTER).ok_or_else(|| {
        Error::format(format!(
            "View of {} bytes is shorter than its header",
            payload.len()
        ))
    })?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as usize)
}
