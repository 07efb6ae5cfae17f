#![forbid(unsafe_code)]

//! CPU-side layered glyph atlas.
//!
//! Each layer is an RGBA8 sheet of `layout.cols() × layout.rows()` equally
//! sized glyph cells. White ink with alpha coverage is the usual convention
//! (the fg colour tints it), but any RGBA works. Layers correspond to "sets":
//! font variants or tile styles selected per cell by the set map.

use std::fmt;

use crate::channel::LayerIndex;
use crate::color::{Rgba, Rgba8};
use crate::geometry::AtlasLayout;

#[cfg(feature = "tracing")]
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtlasError {
    /// No layers supplied.
    NoLayers,
    /// A layer's byte length does not match `width * height * 4`.
    LayerSizeMismatch {
        layer: usize,
        expected: usize,
        actual: usize,
    },
    /// Sheet width/height is not a whole number of glyph cells.
    NotCellAligned {
        width: u32,
        height: u32,
        layout: AtlasLayout,
    },
    /// More layers than a set index can address.
    TooManyLayers(usize),
    /// Sheet dimensions or byte size overflow.
    SheetTooLarge {
        cell_width: u32,
        cell_height: u32,
        layout: AtlasLayout,
    },
    /// Image decoding failed.
    Decode(String),
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLayers => write!(f, "atlas needs at least one layer"),
            Self::LayerSizeMismatch {
                layer,
                expected,
                actual,
            } => write!(
                f,
                "atlas layer {layer} has {actual} bytes, expected {expected}"
            ),
            Self::NotCellAligned {
                width,
                height,
                layout,
            } => write!(
                f,
                "atlas sheet {width}x{height} is not divisible into {}x{} glyph cells",
                layout.cols(),
                layout.rows()
            ),
            Self::TooManyLayers(n) => write!(f, "atlas has {n} layers, at most 256 are addressable"),
            Self::SheetTooLarge {
                cell_width,
                cell_height,
                layout,
            } => write!(
                f,
                "atlas of {}x{} glyph cells at {cell_width}x{cell_height} px overflows",
                layout.cols(),
                layout.rows()
            ),
            Self::Decode(msg) => write!(f, "atlas image decode failed: {msg}"),
        }
    }
}

impl std::error::Error for AtlasError {}

/// Layered RGBA8 glyph sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    layout: AtlasLayout,
    layers: Vec<Vec<u8>>,
}

impl GlyphAtlas {
    /// Build an atlas from raw RGBA8 layers (row-major, 4 bytes per texel).
    pub fn new(
        width: u32,
        height: u32,
        layers: Vec<Vec<u8>>,
        layout: AtlasLayout,
    ) -> Result<Self, AtlasError> {
        if layers.is_empty() {
            return Err(AtlasError::NoLayers);
        }
        if layers.len() > 256 {
            return Err(AtlasError::TooManyLayers(layers.len()));
        }
        if width == 0
            || height == 0
            || width % u32::from(layout.cols()) != 0
            || height % u32::from(layout.rows()) != 0
        {
            return Err(AtlasError::NotCellAligned {
                width,
                height,
                layout,
            });
        }
        let expected = sheet_bytes(width, height).ok_or(AtlasError::SheetTooLarge {
            cell_width: width / u32::from(layout.cols()),
            cell_height: height / u32::from(layout.rows()),
            layout,
        })?;
        for (layer, bytes) in layers.iter().enumerate() {
            if bytes.len() != expected {
                return Err(AtlasError::LayerSizeMismatch {
                    layer,
                    expected,
                    actual: bytes.len(),
                });
            }
        }
        #[cfg(feature = "tracing")]
        debug!(
            width,
            height,
            layers = layers.len(),
            cols = layout.cols(),
            rows = layout.rows(),
            "glyph atlas built"
        );
        Ok(Self {
            width,
            height,
            layout,
            layers,
        })
    }

    /// Build an atlas by calling `paint(layer, glyph, x, y)` for every texel,
    /// where `x`/`y` are pixel offsets inside the glyph cell.
    pub fn from_fn<F>(
        cell_width: u32,
        cell_height: u32,
        layer_count: usize,
        layout: AtlasLayout,
        mut paint: F,
    ) -> Result<Self, AtlasError>
    where
        F: FnMut(usize, u32, u32, u32) -> Rgba8,
    {
        if layer_count == 0 {
            return Err(AtlasError::NoLayers);
        }
        if layer_count > 256 {
            return Err(AtlasError::TooManyLayers(layer_count));
        }
        let too_large = AtlasError::SheetTooLarge {
            cell_width,
            cell_height,
            layout,
        };
        let (Some(width), Some(height)) = (
            cell_width.checked_mul(u32::from(layout.cols())),
            cell_height.checked_mul(u32::from(layout.rows())),
        ) else {
            return Err(too_large);
        };
        if width == 0 || height == 0 {
            return Err(AtlasError::NotCellAligned {
                width,
                height,
                layout,
            });
        }
        let Some(size) = sheet_bytes(width, height) else {
            return Err(too_large);
        };
        let mut layers = Vec::with_capacity(layer_count);
        for layer in 0..layer_count {
            let mut bytes = vec![0u8; size];
            for y in 0..height {
                for x in 0..width {
                    let glyph = (y / cell_height) * u32::from(layout.cols()) + x / cell_width;
                    let texel = paint(layer, glyph, x % cell_width, y % cell_height);
                    let at = (y as usize * width as usize + x as usize) * 4;
                    bytes[at..at + 4].copy_from_slice(&texel.to_bytes());
                }
            }
            layers.push(bytes);
        }
        Self::new(width, height, layers, layout)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn layout(&self) -> AtlasLayout {
        self.layout
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Pixel size of one glyph cell.
    #[must_use]
    pub fn cell_size(&self) -> (u32, u32) {
        (
            self.width / u32::from(self.layout.cols()),
            self.height / u32::from(self.layout.rows()),
        )
    }

    /// Raw RGBA8 bytes of one layer, for upload.
    #[must_use]
    pub fn layer_bytes(&self, layer: usize) -> Option<&[u8]> {
        self.layers.get(layer).map(Vec::as_slice)
    }

    #[must_use]
    pub fn texel(&self, layer: usize, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bytes = self.layers.get(layer)?;
        let at = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba8::from_bytes([
            bytes[at],
            bytes[at + 1],
            bytes[at + 2],
            bytes[at + 3],
        ]))
    }

    /// Nearest-filter sample with clamp-to-edge addressing.
    ///
    /// The layer index is clamped to the last layer, as array-texture
    /// sampling does with an out-of-range layer.
    #[must_use]
    pub fn sample(&self, uv: [f32; 2], layer: LayerIndex) -> Rgba {
        let layer = usize::from(layer.0).min(self.layers.len() - 1);
        let x = nearest_texel(uv[0], self.width);
        let y = nearest_texel(uv[1], self.height);
        self.texel(layer, x, y)
            .map(Rgba8::to_unorm)
            .unwrap_or(Rgba::TRANSPARENT)
    }
}

/// Nearest texel for a normalised coordinate, clamped to the edge.
#[inline]
#[must_use]
pub fn nearest_texel(coord: f32, size: u32) -> u32 {
    let t = (coord * size as f32).floor();
    // NaN and negatives saturate to 0.
    (t as u32).min(size.saturating_sub(1))
}

/// Bytes in one RGBA8 layer, `None` on overflow.
fn sheet_bytes(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(4)
}

#[cfg(feature = "image")]
impl GlyphAtlas {
    /// One layer per image; images must share dimensions.
    pub fn from_images(
        images: &[image::DynamicImage],
        layout: AtlasLayout,
    ) -> Result<Self, AtlasError> {
        let Some(first) = images.first() else {
            return Err(AtlasError::NoLayers);
        };
        let (width, height) = (first.width(), first.height());
        let layers = images
            .iter()
            .map(|img| img.to_rgba8().into_raw())
            .collect();
        Self::new(width, height, layers, layout)
    }

    /// Decode PNG-encoded sheets, one per layer.
    pub fn from_png_layers(pngs: &[&[u8]], layout: AtlasLayout) -> Result<Self, AtlasError> {
        let images = pngs
            .iter()
            .map(|bytes| {
                image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
                    .map_err(|e| AtlasError::Decode(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_images(&images, layout)
    }
}
