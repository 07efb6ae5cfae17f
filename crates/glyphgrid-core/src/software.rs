#![forbid(unsafe_code)]

//! CPU rasteriser for the compositor.
//!
//! Evaluates [`fragment_stage`] at every pixel centre of a `width × height`
//! target covered by the full-screen quad, sampling the attribute maps and
//! atlas with nearest filtering and clamp-to-edge addressing.

use std::fmt;

use crate::atlas::{GlyphAtlas, nearest_texel};
use crate::attributes::AttributeMaps;
use crate::channel::{GlyphIndex, LayerIndex, UnormChannel};
use crate::color::{Rgba, Rgba8};
use crate::compositor::{CompositorConfig, CompositorTextures, fragment_stage};
use crate::geometry::GridDimensions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    /// Attribute maps were built for a different grid than the config.
    GridMismatch {
        expected: GridDimensions,
        actual: GridDimensions,
    },
    /// Zero-width or zero-height target.
    EmptyTarget { width: u32, height: u32 },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GridMismatch { expected, actual } => write!(
                f,
                "attribute maps are {}x{}, compositor expects {}x{}",
                actual.cols(),
                actual.rows(),
                expected.cols(),
                expected.rows()
            ),
            Self::EmptyTarget { width, height } => {
                write!(f, "render target {width}x{height} has no pixels")
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Binds CPU attribute maps and an atlas as compositor textures.
#[derive(Debug, Clone, Copy)]
pub struct SoftwareTextures<'a> {
    maps: &'a AttributeMaps,
    atlas: &'a GlyphAtlas,
}

impl<'a> SoftwareTextures<'a> {
    #[must_use]
    pub fn new(maps: &'a AttributeMaps, atlas: &'a GlyphAtlas) -> Self {
        Self { maps, atlas }
    }

    /// Linear index of the attribute texel a nearest sampler picks for `uv`.
    fn texel_index(&self, uv: [f32; 2]) -> usize {
        let grid = self.maps.grid();
        let x = nearest_texel(uv[0], u32::from(grid.cols())) as usize;
        let y = nearest_texel(uv[1], u32::from(grid.rows())) as usize;
        y * usize::from(grid.cols()) + x
    }

    fn color_at(plane: &[u8], i: usize) -> Rgba {
        Rgba8::from_bytes([
            plane[i * 4],
            plane[i * 4 + 1],
            plane[i * 4 + 2],
            plane[i * 4 + 3],
        ])
        .to_unorm()
    }
}

impl CompositorTextures for SoftwareTextures<'_> {
    fn sample_index(&self, uv: [f32; 2]) -> f32 {
        GlyphIndex(self.maps.glyph_plane()[self.texel_index(uv)]).to_unorm()
    }

    fn sample_set(&self, uv: [f32; 2]) -> f32 {
        LayerIndex(self.maps.set_plane()[self.texel_index(uv)]).to_unorm()
    }

    fn sample_fg(&self, uv: [f32; 2]) -> Rgba {
        Self::color_at(self.maps.fg_plane(), self.texel_index(uv))
    }

    fn sample_bg(&self, uv: [f32; 2]) -> Rgba {
        Self::color_at(self.maps.bg_plane(), self.texel_index(uv))
    }

    fn sample_atlas(&self, uv: [f32; 2], layer: LayerIndex) -> Rgba {
        self.atlas.sample(uv, layer)
    }
}

/// Unquantised render output, row-major from the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Framebuffer {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Quantise to RGBA8 the way a unorm colour attachment stores it.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.to_rgba8().to_bytes())
            .collect()
    }
}

/// Headless compositor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareRenderer {
    config: CompositorConfig,
}

impl SoftwareRenderer {
    #[must_use]
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Render the full-screen quad into a `width × height` target.
    pub fn render(
        &self,
        maps: &AttributeMaps,
        atlas: &GlyphAtlas,
        width: u32,
        height: u32,
    ) -> Result<Framebuffer, RenderError> {
        if maps.grid() != self.config.grid {
            return Err(RenderError::GridMismatch {
                expected: self.config.grid,
                actual: maps.grid(),
            });
        }
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyTarget { width, height });
        }

        let textures = SoftwareTextures::new(maps, atlas);
        let (w, h) = (width as f32, height as f32);
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let v = (y as f32 + 0.5) / h;
            for x in 0..width {
                let u = (x as f32 + 0.5) / w;
                pixels.push(fragment_stage(&self.config, &textures, [u, v]));
            }
        }
        Ok(Framebuffer {
            width,
            height,
            pixels,
        })
    }
}
