//! Code page handling for on-disk text
//!
//! AGI stores text as raw single bytes in whatever code page the game (or
//! its translation) was authored in. Every codec that turns bytes into
//! strings takes a [`Charset`] explicitly; there is no global default.
//!
//! ```
//! use agi_resource::Charset;
//!
//! # fn main() -> Result<(), agi_resource::Error> {
//! let hebrew = Charset::for_label("windows-1255")?;
//! let bytes = hebrew.encode("שלום")?;
//! assert_eq!(bytes, [0xF9, 0xEC, 0xE5, 0xED]);
//! assert_eq!(hebrew.decode(&bytes)?, "שלום");
//! # Ok(())
//! # }
//! ```

use encoding_rs::{Encoding, WINDOWS_1252, WINDOWS_1255, X_USER_DEFINED};

use crate::{Error, Result};

/// A legacy code page used to map strings to and from resource bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charset {
    encoding: &'static Encoding,
}

impl Charset {
    /// Byte-transparent charset: ASCII maps to itself and every high byte
    /// maps to a private-use code point, so any byte string round-trips.
    pub fn transparent() -> Self {
        Self {
            encoding: X_USER_DEFINED,
        }
    }

    /// Windows-1255 (Hebrew)
    pub fn windows_1255() -> Self {
        Self {
            encoding: WINDOWS_1255,
        }
    }

    /// Windows-1252 (Western European)
    pub fn windows_1252() -> Self {
        Self {
            encoding: WINDOWS_1252,
        }
    }

    /// Look up a charset by its WHATWG label (e.g. `"windows-1255"`, `"cp1255"`)
    pub fn for_label(label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| Error::encoding(format!("Unknown charset label: {label}")))?;
        Self::from_encoding(encoding)
    }

    /// Wrap an `encoding_rs` encoding. Only ASCII-compatible encodings are
    /// accepted because resource structures rely on ASCII NUL terminators.
    pub fn from_encoding(encoding: &'static Encoding) -> Result<Self> {
        if !encoding.is_ascii_compatible() || encoding.output_encoding() != encoding {
            return Err(Error::encoding(format!(
                "Charset {} cannot be used for resource text",
                encoding.name()
            )));
        }
        Ok(Self { encoding })
    }

    /// Canonical name of the underlying encoding
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Encode text to on-disk bytes.
    ///
    /// Fails with [`Error::Encoding`] if any character is unmappable or the
    /// text contains NUL, which is reserved as a terminator.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        if text.contains('\0') {
            return Err(Error::encoding(format!(
                "Text contains a NUL character: {text:?}"
            )));
        }

        let (bytes, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(Error::encoding(format!(
                "Text {text:?} cannot be represented in {}",
                self.name()
            )));
        }
        Ok(bytes.into_owned())
    }

    /// Decode on-disk bytes to text. Bytes undefined in the code page fail
    /// with [`Error::Encoding`] rather than being replaced.
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or_else(|| {
                Error::encoding(format!(
                    "Bytes {bytes:02X?} are not valid {}",
                    self.name()
                ))
            })
    }
}
