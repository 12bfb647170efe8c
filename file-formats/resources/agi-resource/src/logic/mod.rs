//! Logic resources and their text
//!
//! A logic payload starts with a little-endian `u16` giving the size of
//! the bytecode. The message section follows the bytecode:
//!
//! ```text
//! count: u8
//! end: u16            end of the text, relative to the byte after `count`
//! pointers: [u16; count]   relative to the byte after `count`, 0 = no message
//! text                NUL-terminated strings, XORed with "Avis Durgan"
//! ```
//!
//! Messages are numbered from 1.

pub mod opcodes;
mod script;
mod text;

pub use script::{LogicOptions, LogicScript};
pub use text::{
    MessageUsage, SaidTest, TextReference, UsageKind, check_references, extract_messages,
    inject_messages, scan_said_tests, scan_text_references, text_report,
};
