//! Greedy block-matching diff
//!
//! Every `window`-byte block of the original is indexed by a polynomial
//! rolling hash. The modified buffer is scanned left to right; at each
//! position the candidates sharing the block's hash are verified and
//! extended forward, and the longest run becomes a copy. Bytes between
//! runs become inserts.

use std::collections::HashMap;

const BASE: u64 = 0x0100_0000_01B3;

/// One patch instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOp {
    /// Copy `length` bytes starting at `offset` of the original
    Copy {
        /// Source offset
        offset: usize,
        /// Number of bytes
        length: usize,
    },
    /// Emit literal bytes
    Insert(Vec<u8>),
}

impl PatchOp {
    /// Bytes this instruction contributes to the output
    pub fn output_len(&self) -> usize {
        match self {
            PatchOp::Copy { length, .. } => *length,
            PatchOp::Insert(bytes) => bytes.len(),
        }
    }
}

/// Ordered instructions that rebuild a modified buffer from its original
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchRecord {
    ops: Vec<PatchOp>,
}

impl PatchRecord {
    /// Empty record, which produces an empty output
    pub fn new() -> Self {
        Self::default()
    }

    /// Record from instructions, merging neighbours where possible
    pub fn from_ops(ops: impl IntoIterator<Item = PatchOp>) -> Self {
        let mut record = Self::new();
        for op in ops {
            record.push(op);
        }
        record
    }

    /// Append an instruction.
    ///
    /// Empty instructions are dropped, consecutive inserts are joined and a
    /// copy continuing the previous copy's source range extends it.
    pub fn push(&mut self, op: PatchOp) {
        if op.output_len() == 0 {
            return;
        }
        if let Some(last) = self.ops.last_mut() {
            match (last, &op) {
                (PatchOp::Insert(last), PatchOp::Insert(bytes)) => {
                    last.extend_from_slice(bytes);
                    return;
                }
                (
                    PatchOp::Copy {
                        offset: last_offset,
                        length: last_length,
                    },
                    PatchOp::Copy { offset, length },
                ) if *last_offset + *last_length == *offset => {
                    *last_length += *length;
                    return;
                }
                _ => {}
            }
        }
        self.ops.push(op);
    }

    /// Instructions in application order
    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the record has no instructions
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Length of the output
    pub fn output_len(&self) -> usize {
        self.ops.iter().map(PatchOp::output_len).sum()
    }

    /// Output bytes taken from the original
    pub fn copied_len(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PatchOp::Copy { .. }))
            .map(PatchOp::output_len)
            .sum()
    }

    /// Output bytes carried literally in the patch
    pub fn inserted_len(&self) -> usize {
        self.output_len() - self.copied_len()
    }
}

/// Tuning for [`diff_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Shortest run worth a copy instruction
    pub window: usize,
    /// Most original offsets remembered per block hash
    pub max_candidates: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            window: 8,
            max_candidates: 64,
        }
    }
}

impl DiffOptions {
    /// Use a different block size
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Use a different candidate limit
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }
}

/// Diff with default options
pub fn diff(original: &[u8], modified: &[u8]) -> PatchRecord {
    diff_with(original, modified, &DiffOptions::default())
}

/// Compute the instructions turning `original` into `modified`.
///
/// Identical non-empty buffers give a single copy, buffers without a
/// common block give a single insert and an empty `modified` gives an
/// empty record. Two empty buffers are the one identical pair without a
/// copy: a zero-length copy would be dropped like any other empty
/// instruction. Among equally long runs the earliest source offset wins,
/// so the output is deterministic.
pub fn diff_with(original: &[u8], modified: &[u8], options: &DiffOptions) -> PatchRecord {
    let mut record = PatchRecord::new();
    if modified.is_empty() {
        return record;
    }
    if original == modified {
        record.push(PatchOp::Copy {
            offset: 0,
            length: original.len(),
        });
        return record;
    }

    let window = options.window.max(1);
    if original.len() < window || modified.len() < window {
        record.push(PatchOp::Insert(modified.to_vec()));
        return record;
    }

    let index = BlockIndex::build(original, window, options.max_candidates.max(1));
    let power = BASE.wrapping_pow(u32::try_from(window - 1).unwrap_or(u32::MAX));

    let mut pos = 0;
    let mut literal_start = 0;
    let mut hash = block_hash(&modified[..window]);
    while pos + window <= modified.len() {
        if let Some((offset, length)) = index.longest_match(original, &modified[pos..], hash) {
            if literal_start < pos {
                record.push(PatchOp::Insert(modified[literal_start..pos].to_vec()));
            }
            record.push(PatchOp::Copy { offset, length });
            pos += length;
            literal_start = pos;
            if pos + window <= modified.len() {
                hash = block_hash(&modified[pos..pos + window]);
            }
            continue;
        }

        if pos + window < modified.len() {
            hash = roll(hash, modified[pos], modified[pos + window], power);
        }
        pos += 1;
    }
    if literal_start < modified.len() {
        record.push(PatchOp::Insert(modified[literal_start..].to_vec()));
    }

    log::debug!(
        "Diffed {} -> {} bytes: {} instructions, {} bytes copied, {} inserted",
        original.len(),
        modified.len(),
        record.len(),
        record.copied_len(),
        record.inserted_len()
    );
    record
}

fn block_hash(block: &[u8]) -> u64 {
    block
        .iter()
        .fold(0u64, |hash, &byte| hash.wrapping_mul(BASE).wrapping_add(u64::from(byte)))
}

fn roll(hash: u64, outgoing: u8, incoming: u8, power: u64) -> u64 {
    hash.wrapping_sub(u64::from(outgoing).wrapping_mul(power))
        .wrapping_mul(BASE)
        .wrapping_add(u64::from(incoming))
}

/// Offsets of every original block, keyed by hash, in ascending order
struct BlockIndex {
    window: usize,
    blocks: HashMap<u64, Vec<usize>>,
}

impl BlockIndex {
    fn build(original: &[u8], window: usize, max_candidates: usize) -> Self {
        let power = BASE.wrapping_pow(u32::try_from(window - 1).unwrap_or(u32::MAX));
        let mut blocks: HashMap<u64, Vec<usize>> = HashMap::new();
        let mut hash = block_hash(&original[..window]);
        for offset in 0..=original.len() - window {
            let candidates = blocks.entry(hash).or_default();
            if candidates.len() < max_candidates {
                candidates.push(offset);
            }
            if offset + window < original.len() {
                hash = roll(hash, original[offset], original[offset + window], power);
            }
        }
        log::trace!(
            "Indexed {} distinct blocks of {window} bytes",
            blocks.len()
        );
        Self { window, blocks }
    }

    /// Longest verified run of `target` in `original`, as `(offset, length)`
    fn longest_match(&self, original: &[u8], target: &[u8], hash: u64) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for &offset in self.blocks.get(&hash)? {
            let source = &original[offset..];
            if source[..self.window] != target[..self.window] {
                continue;
            }
            let length = self.window
                + source[self.window..]
                    .iter()
                    .zip(&target[self.window..])
                    .take_while(|(a, b)| a == b)
                    .count();
            if best.is_none_or(|(_, best_length)| length > best_length) {
                best = Some((offset, length));
            }
        }
        best
    }
}
