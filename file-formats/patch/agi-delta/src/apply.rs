//! Patch application

use crate::diff::{PatchOp, PatchRecord};
use crate::{Error, Result};

/// Rebuild the modified buffer from `original` and a record.
///
/// Fails with [`Error::PatchMismatch`] when a copy reads outside
/// `original`; nothing is returned in that case.
pub fn apply(original: &[u8], record: &PatchRecord) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(record.output_len());
    for (index, op) in record.ops().iter().enumerate() {
        match op {
            PatchOp::Copy { offset, length } => {
                let source = offset
                    .checked_add(*length)
                    .and_then(|end| original.get(*offset..end))
                    .ok_or_else(|| {
                        Error::mismatch(format!(
                            "Instruction {index} copies {length} bytes from {offset:#x}, the original has {} bytes",
                            original.len()
                        ))
                    })?;
                out.extend_from_slice(source);
            }
            PatchOp::Insert(bytes) => out.extend_from_slice(bytes),
        }
    }

    log::trace!(
        "Applied {} instructions: {} -> {} bytes",
        record.len(),
        original.len(),
        out.len()
    );
    Ok(out)
}
