#![forbid(unsafe_code)]

//! Code page 437, graphical variant.
//!
//! Glyph sheets in the 16×16 layout are conventionally ordered by CP437, so
//! a character's glyph index is its CP437 byte. The control range `0x01..=0x1F`
//! and `0x7F` map to their display symbols (☺, ♥, ↑, ⌂, …) instead of
//! control characters.

use codepage_437::CP437_WINGDINGS;

use crate::channel::GlyphIndex;

/// CP437 byte for a character, if the code page has it.
///
/// Besides the primary mapping this accepts the usual look-alike variants
/// (`€`, `β`, `µ`/`μ`, `∑`, `✓`, ...).
#[must_use]
pub fn encode(ch: char) -> Option<u8> {
    CP437_WINGDINGS.encode(ch)
}

/// Character displayed for a CP437 byte.
#[must_use]
pub fn decode(byte: u8) -> char {
    CP437_WINGDINGS.decode(byte)
}

/// Glyph index of a character in a CP437-ordered sheet.
#[must_use]
pub fn glyph_for(ch: char) -> Option<GlyphIndex> {
    encode(ch).map(GlyphIndex)
}
