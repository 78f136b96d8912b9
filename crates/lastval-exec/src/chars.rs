//! UTF-16 character storage.
//!
//! Strings are stored as a u32 unit count followed by little-endian UTF-16
//! code units, so a string of `n` units takes `2 * n + 4` bytes.

use std::fmt::{self, Write as _};

/// Size of the length prefix in front of stored characters.
pub const STR_LEN_SIZE: usize = 4;

/// Returns the number of bytes `value` takes once stored.
#[inline]
pub fn stored_str_size(utf16_len: usize) -> usize {
    STR_LEN_SIZE + utf16_len * 2
}

/// Writes `value` as length-prefixed UTF-16 into `dst` and returns the
/// number of bytes written.
///
/// # Panics
/// Panics if `dst` is shorter than the stored size of `value`.
pub fn write_utf16(dst: &mut [u8], value: &str) -> usize {
    let mut len = 0usize;
    for unit in value.encode_utf16() {
        let at = STR_LEN_SIZE + len * 2;
        dst[at..at + 2].copy_from_slice(&unit.to_le_bytes());
        len += 1;
    }
    dst[..STR_LEN_SIZE].copy_from_slice(&(len as u32).to_le_bytes());
    stored_str_size(len)
}

/// Zero-copy window over stored UTF-16 characters.
#[derive(Clone, Copy)]
pub struct Utf16Str<'a> {
    bytes: &'a [u8],
}

impl<'a> Utf16Str<'a> {
    /// Wraps raw little-endian UTF-16 bytes (without the length prefix).
    pub fn new(bytes: &'a [u8]) -> Self {
        debug_assert!(bytes.len() % 2 == 0);
        Self { bytes }
    }

    /// Returns the number of UTF-16 code units.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the code unit at `index`.
    #[inline]
    pub fn unit_at(&self, index: usize) -> u16 {
        let at = index * 2;
        u16::from_le_bytes([self.bytes[at], self.bytes[at + 1]])
    }

    /// Returns the raw bytes of the window.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterates over the code units.
    pub fn units(self) -> impl Iterator<Item = u16> + 'a {
        self.bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }

    /// Iterates over decoded characters. Unpaired surrogates decode to
    /// U+FFFD.
    pub fn chars(self) -> impl Iterator<Item = char> + 'a {
        char::decode_utf16(self.units()).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Appends the decoded characters to `sink`.
    pub fn write_into(self, sink: &mut String) {
        sink.reserve(self.len());
        sink.extend(self.chars());
    }
}

impl fmt::Display for Utf16Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Utf16Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

impl PartialEq<str> for Utf16Str<'_> {
    fn eq(&self, other: &str) -> bool {
        self.units().eq(other.encode_utf16())
    }
}

impl PartialEq<&str> for Utf16Str<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.units().eq(other.encode_utf16())
    }
}
