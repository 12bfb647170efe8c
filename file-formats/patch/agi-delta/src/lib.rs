//! # agi_delta - binary patches for translated game files
//!
//! Computes compact instruction lists that turn an original file into its
//! translated counterpart, so a translation can be shipped without the
//! copyrighted game data it was made from.
//!
//! ## Features
//!
//! - Greedy block-matching diff over a polynomial rolling hash
//! - Deterministic output for identical inputs
//! - Self-checking `AGIP` artifact with CRC32 of original and output
//! - Patch sets covering a whole game directory, diffed in parallel
//!
//! ## Examples
//!
//! ### Patching one file
//!
//! ```
//! use agi_delta::{DiffOptions, PatchFile};
//!
//! # fn main() -> Result<(), agi_delta::Error> {
//! let original = b"There is a door to the north.";
//! let translated = b"There is a wooden door to the north.";
//!
//! let patch = PatchFile::create(original, translated, &DiffOptions::default())?;
//! let bytes = patch.to_bytes()?;
//!
//! let patch = PatchFile::parse(&bytes)?;
//! assert_eq!(patch.apply(original)?, translated);
//! # Ok(())
//! # }
//! ```
//!
//! ### Patching a game directory
//!
//! ```no_run
//! use agi_delta::PatchSet;
//!
//! # fn main() -> Result<(), agi_delta::Error> {
//! let set = PatchSet::build("game", "game-he")?;
//! set.write_to("patches")?;
//!
//! let set = PatchSet::read_from("patches")?;
//! set.apply_to("game", "game-patched")?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod apply;
pub mod diff;
pub mod error;
pub mod format;
pub mod set;

pub use apply::apply;
pub use diff::{DiffOptions, PatchOp, PatchRecord, diff, diff_with};
pub use error::{Error, Result};
pub use format::{PATCH_MAGIC, PATCH_VERSION, PatchFile};
pub use set::{PATCH_EXTENSION, PatchSet, PatchSetEntry};
