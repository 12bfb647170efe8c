//! Packed pools of NUL-terminated strings
//!
//! Object names and logic messages are stored as a pointer table followed
//! by a pool of NUL-terminated strings. When a pool is rebuilt the strings
//! keep their original relative order, and entries that pointed at the same
//! bytes keep doing so as long as their text is still identical.

/// One pool member
#[derive(Debug, Clone, Copy)]
pub(crate) struct PoolEntry<'a> {
    /// Offset the entry had in the decoded pool, `None` for new entries
    pub(crate) original: Option<usize>,
    /// Encoded text, `None` when the entry has no string
    pub(crate) text: Option<&'a [u8]>,
}

/// A rebuilt pool and the offset of each entry inside it
#[derive(Debug, Default)]
pub(crate) struct PackedPool {
    pub(crate) bytes: Vec<u8>,
    pub(crate) offsets: Vec<Option<usize>>,
}

/// Pack `entries` into a pool.
///
/// Strings are placed in order of their original offset (new entries last,
/// by index) and each one is followed by a NUL.
pub(crate) fn pack(entries: &[PoolEntry<'_>]) -> PackedPool {
    let mut order: Vec<usize> = (0..entries.len())
        .filter(|&i| entries[i].text.is_some())
        .collect();
    order.sort_by_key(|&i| (entries[i].original.unwrap_or(usize::MAX), i));

    let mut pool = PackedPool {
        bytes: Vec::new(),
        offsets: vec![None; entries.len()],
    };
    // (original offset, text, packed offset) of strings already placed
    let mut placed: Vec<(usize, &[u8], usize)> = Vec::new();

    for index in order {
        let entry = entries[index];
        let Some(text) = entry.text else { continue };

        let shared = entry.original.and_then(|original| {
            placed
                .iter()
                .find(|(o, t, _)| *o == original && *t == text)
                .map(|&(_, _, packed)| packed)
        });

        let offset = match shared {
            Some(offset) => offset,
            None => {
                let offset = pool.bytes.len();
                pool.bytes.extend_from_slice(text);
                pool.bytes.push(0);
                if let Some(original) = entry.original {
                    placed.push((original, text, offset));
                }
                offset
            }
        };
        pool.offsets[index] = Some(offset);
    }

    pool
}

/// Read the NUL-terminated string starting at `offset`.
///
/// Returns `None` when the offset is out of range; an unterminated string
/// runs to the end of `data`.
pub(crate) fn read_cstr(data: &[u8], offset: usize) -> Option<&[u8]> {
    let tail = data.get(offset..)?;
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Some(&tail[..end])
}
