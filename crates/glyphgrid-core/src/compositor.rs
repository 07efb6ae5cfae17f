#![forbid(unsafe_code)]

//! Reference implementation of the two compositor stages.
//!
//! The WGSL in `glyphgrid-wgpu` performs exactly these steps; keeping a Rust
//! copy lets the math be tested without a GPU and gives the software renderer
//! something to run.
//!
//! Fragment stage, per pixel:
//!
//! 1. locate the UV on the grid (cell + in-cell fraction);
//! 2. decode the set and glyph indices from the set/index maps;
//! 3. turn glyph + fraction into an atlas UV and sample the selected layer;
//! 4. blend the fg-tinted glyph texel over the background by glyph alpha;
//! 5. combine glyph and background alpha per [`AlphaPolicy`].

use std::fmt;

use crate::channel::{GlyphIndex, LayerIndex, UnormChannel};
use crate::color::Rgba;
use crate::geometry::{AtlasLayout, GridDimensions};

/// Environment override for [`AlphaPolicy`] (`sum` | `clamp` | `max`).
pub const ENV_ALPHA_POLICY: &str = "GLYPHGRID_ALPHA_POLICY";

/// How output alpha combines glyph coverage and background alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlphaPolicy {
    /// `glyph.a + bg.a`, unclamped. May exceed 1.
    #[default]
    Sum,
    /// `min(1, glyph.a + bg.a)`.
    Clamped,
    /// `max(glyph.a, bg.a)`.
    Max,
}

impl AlphaPolicy {
    /// Numeric tag the WGSL template switches on.
    #[must_use]
    pub const fn shader_tag(self) -> u32 {
        match self {
            Self::Sum => 0,
            Self::Clamped => 1,
            Self::Max => 2,
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "clamp" | "clamped" => Some(Self::Clamped),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// Read [`ENV_ALPHA_POLICY`], falling back to `default` when unset or
    /// unrecognised.
    #[must_use]
    pub fn from_env_or(default: Self) -> Self {
        Self::from_value(std::env::var(ENV_ALPHA_POLICY).ok().as_deref(), default)
    }

    /// Parse an optional setting, falling back to `default` when it is
    /// missing or unrecognised.
    #[must_use]
    pub fn from_value(value: Option<&str>, default: Self) -> Self {
        value.and_then(Self::parse).unwrap_or(default)
    }

    #[inline]
    #[must_use]
    pub fn resolve(self, glyph_alpha: f32, bg_alpha: f32) -> f32 {
        match self {
            Self::Sum => glyph_alpha + bg_alpha,
            Self::Clamped => (glyph_alpha + bg_alpha).min(1.0),
            Self::Max => glyph_alpha.max(bg_alpha),
        }
    }
}

impl fmt::Display for AlphaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sum => write!(f, "sum"),
            Self::Clamped => write!(f, "clamp"),
            Self::Max => write!(f, "max"),
        }
    }
}

/// Build-time constants of the compositor.
///
/// These are baked into the shader source, not bound at draw time; changing
/// any of them means rebuilding the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompositorConfig {
    pub grid: GridDimensions,
    pub atlas: AtlasLayout,
    pub alpha: AlphaPolicy,
}

impl CompositorConfig {
    #[must_use]
    pub fn new(grid: GridDimensions) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_atlas(mut self, atlas: AtlasLayout) -> Self {
        self.atlas = atlas;
        self
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: AlphaPolicy) -> Self {
        self.alpha = alpha;
        self
    }
}

// ---------------------------------------------------------------------------
// Vertex stage
// ---------------------------------------------------------------------------

/// One vertex of the full-screen quad.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexInput {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    /// Homogeneous clip position, `w = 1`.
    pub clip_position: [f32; 4],
    pub uv: [f32; 2],
}

/// Identity transform: the host supplies already-projected coordinates.
#[inline]
#[must_use]
pub fn vertex_stage(input: VertexInput) -> VertexOutput {
    let [x, y, z] = input.position;
    VertexOutput {
        clip_position: [x, y, z, 1.0],
        uv: input.uv,
    }
}

// ---------------------------------------------------------------------------
// Fragment stage
// ---------------------------------------------------------------------------

/// The five bound textures plus their shared sampler.
///
/// Each method is one `textureSample` call in the shader. Attribute maps are
/// sampled at the fragment UV; the atlas at the computed atlas UV and layer.
pub trait CompositorTextures {
    fn sample_index(&self, uv: [f32; 2]) -> f32;
    fn sample_set(&self, uv: [f32; 2]) -> f32;
    fn sample_fg(&self, uv: [f32; 2]) -> Rgba;
    fn sample_bg(&self, uv: [f32; 2]) -> Rgba;
    fn sample_atlas(&self, uv: [f32; 2], layer: LayerIndex) -> Rgba;
}

/// Intermediate values of one fragment invocation, for tests and debugging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentTrace {
    pub fraction: [f32; 2],
    pub set: LayerIndex,
    pub glyph: GlyphIndex,
    pub atlas_uv: [f32; 2],
    pub glyph_sample: Rgba,
    pub fg: Rgba,
    pub bg: Rgba,
    pub output: Rgba,
}

/// Blend a glyph texel over the background.
///
/// Colour is `bg * (1 - a) + glyph * fg * a` with `a = glyph.a`; written in
/// that form (rather than `bg + (x - bg) * a`) so `a = 0` yields `bg` and
/// `a = 1` yields `glyph * fg` exactly.
#[inline]
#[must_use]
pub fn blend(glyph: Rgba, fg: Rgba, bg: Rgba, alpha: AlphaPolicy) -> Rgba {
    let a = glyph.a;
    let keep = 1.0 - a;
    Rgba::new(
        bg.r * keep + glyph.r * fg.r * a,
        bg.g * keep + glyph.g * fg.g * a,
        bg.b * keep + glyph.b * fg.b * a,
        alpha.resolve(a, bg.a),
    )
}

/// Run the fragment stage and keep every intermediate value.
#[must_use]
pub fn trace_fragment<T: CompositorTextures + ?Sized>(
    config: &CompositorConfig,
    textures: &T,
    uv: [f32; 2],
) -> FragmentTrace {
    let fraction = config.grid.locate(uv).fraction;
    let set = LayerIndex::from_unorm(textures.sample_set(uv));
    let glyph = GlyphIndex::from_unorm(textures.sample_index(uv));
    let atlas_uv = config.atlas.atlas_uv(glyph, fraction);
    let glyph_sample = textures.sample_atlas(atlas_uv, set);
    let fg = textures.sample_fg(uv);
    let bg = textures.sample_bg(uv);
    let output = blend(glyph_sample, fg, bg, config.alpha);
    FragmentTrace {
        fraction,
        set,
        glyph,
        atlas_uv,
        glyph_sample,
        fg,
        bg,
        output,
    }
}

/// Fragment stage: the colour written to attachment 0 for one pixel.
#[inline]
#[must_use]
pub fn fragment_stage<T: CompositorTextures + ?Sized>(
    config: &CompositorConfig,
    textures: &T,
    uv: [f32; 2],
) -> Rgba {
    trace_fragment(config, textures, uv).output
}
