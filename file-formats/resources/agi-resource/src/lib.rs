//! # agi_resource - Sierra AGI resource containers
//!
//! Readers and writers for the resource files of Sierra's Adventure Game
//! Interpreter (AGI v2 and v3), built for translating games: text can be
//! pulled out of and pushed back into every container that holds it,
//! without disturbing the bytes the interpreter depends on.
//!
//! ## Features
//!
//! - Resource directories (`LOGDIR`, `PICDIR`, `VIEWDIR`, `SNDDIR` and the
//!   combined v3 directory)
//! - Volume blocks with v2 and v3 headers, LZW and picture compression
//! - Inventory object table, with or without obfuscation
//! - Parser dictionary (`WORDS.TOK`) and the `WORDS.TOK.EXTENDED` side list
//! - Logic message tables, text references and injection
//! - Inventory descriptions stored in views
//! - Visual ordering for right-to-left text and post-import audits
//! - Explicit code pages for all text through [`Charset`]
//!
//! Every codec is a pure function over byte buffers. Unmodified input
//! encodes back to identical bytes.
//!
//! ## Examples
//!
//! ### Translating a logic
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use agi_resource::{
//!     Charset, Directory, LogicOptions, LogicScript, Placement, Volume, VolumeOptions,
//!     inject_messages,
//! };
//!
//! # fn main() -> Result<(), agi_resource::Error> {
//! let directory = Directory::decode(&std::fs::read("LOGDIR")?)?;
//! let mut volume = Volume::new(0, std::fs::read("VOL.0")?, VolumeOptions::v2());
//!
//! let Some((_, offset)) = directory.get(7).location() else {
//!     return Ok(());
//! };
//! let block = volume.read_resource(offset as usize)?;
//! let options = LogicOptions::new(Charset::windows_1255());
//! let script = LogicScript::decode(block.payload(), &options)?;
//!
//! let translated = BTreeMap::from([(1, "שלום".to_string())]);
//! let script = inject_messages(&script, &translated)?;
//!
//! let block = block.with_payload(script.encode()?)?;
//! let outcome = volume.write_resource(offset as usize, &block, Placement::Auto)?;
//! if outcome.is_relocated() {
//!     // record outcome.directory_entry(0)? in LOGDIR
//! }
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

pub mod charset;
pub mod compression;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod fs;
pub mod l10n;
pub mod logic;
pub mod object;
pub mod view;
pub mod volume;
pub mod words;

mod strings;

// Re-export commonly used types
pub use charset::Charset;
pub use compression::Compression;
pub use directory::{Directory, DirectoryBundle, DirectoryEntry, ResourceKind};
pub use error::{Error, Result};
pub use l10n::{LengthCheck, compare_lengths, is_untranslated, visual_order};
pub use logic::{
    LogicOptions, LogicScript, MessageUsage, SaidTest, TextReference, UsageKind, check_references,
    extract_messages, inject_messages, scan_said_tests, scan_text_references, text_report,
};
pub use object::{ObjectEntry, ObjectOptions, ObjectTable, Platform};
pub use view::{ViewDescription, read_description, write_description};
pub use volume::{
    HeaderFormat, Placement, ResourceHeader, Volume, VolumeOptions, VolumeResource, WriteOutcome,
};
pub use words::{
    Dictionary, Duplicate, DuplicateKind, ExtendedWordEntry, ExtendedWords, LineEnding, WordEntry,
};
