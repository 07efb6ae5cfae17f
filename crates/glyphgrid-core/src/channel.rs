#![forbid(unsafe_code)]

//! Small integers carried through unorm texture channels.
//!
//! The index and set maps store one byte per cell in an `R8Unorm` texture.
//! Sampling hands the shader `byte / 255` as a float, and the compositor
//! recovers the byte with `trunc(value * 255)`. Both ends of that contract go
//! through [`UnormChannel`] so the producer and the compositor cannot drift.
//!
//! The truncation is exact in `f32` for every byte: `(i as f32 / 255.0) * 255.0`
//! never lands below `i`.

/// Largest value a unorm8 channel can hold.
pub const UNORM8_MAX: f32 = 255.0;

/// A byte-sized integer stored in a single unorm8 texture channel.
pub trait UnormChannel: Copy {
    /// Wrap a raw texel byte.
    fn from_byte(byte: u8) -> Self;

    /// The raw texel byte.
    fn byte(self) -> u8;

    /// Normalised value a sampler returns for this texel.
    #[inline]
    fn to_unorm(self) -> f32 {
        f32::from(self.byte()) / UNORM8_MAX
    }

    /// Recover the integer from a sampled value (scale by 255, truncate).
    ///
    /// Values outside `[0, 1]` saturate; NaN decodes to 0.
    #[inline]
    fn from_unorm(value: f32) -> Self {
        Self::from_byte(decode_unorm8(value))
    }
}

/// Scale a sampled unorm value by 255 and truncate toward zero.
#[inline]
#[must_use]
pub fn decode_unorm8(value: f32) -> u8 {
    // `as` saturates and maps NaN to 0, which is the behaviour a GPU
    // float-to-uint conversion of a clamped value gives.
    (value * UNORM8_MAX) as u8
}

/// Glyph position inside one atlas layer, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlyphIndex(pub u8);

/// Atlas layer ("set") a cell samples its glyph from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerIndex(pub u8);

impl UnormChannel for GlyphIndex {
    #[inline]
    fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    #[inline]
    fn byte(self) -> u8 {
        self.0
    }
}

impl UnormChannel for LayerIndex {
    #[inline]
    fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    #[inline]
    fn byte(self) -> u8 {
        self.0
    }
}

impl From<u8> for GlyphIndex {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<u8> for LayerIndex {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
