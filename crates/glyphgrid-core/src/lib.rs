#![forbid(unsafe_code)]

//! Character-grid glyph compositor.
//!
//! # Role in glyphgrid
//! `glyphgrid-core` holds everything about the glyph compositor that does not
//! need a GPU. It turns per-cell attribute maps and a layered glyph atlas into
//! pixels.
//!
//! # Primary responsibilities
//! - **Channel encoding**: [`channel::UnormChannel`] fixes how small integers
//!   (glyph index, atlas layer) travel through unorm texture channels.
//! - **Geometry**: [`geometry::GridDimensions`] and [`geometry::AtlasLayout`]
//!   map a screen UV to a grid cell and a glyph index to an atlas region.
//! - **Compositor**: [`compositor`] is the reference implementation of the
//!   vertex and fragment stages, bit-for-bit the same math as the WGSL.
//! - **Producer**: [`attributes::AttributeMaps`] is the CPU-side shadow of the
//!   four attribute textures, with print/rect/snapshot helpers.
//!   [`text::TextBuilder`] lays out coloured runs on top of it, and
//!   [`cp437`] maps characters to glyph indices.
//! - **Software renderer**: [`software::SoftwareRenderer`] evaluates the
//!   compositor at every pixel centre for headless tests.
//!
//! # How it fits in the system
//! `glyphgrid-wgpu` injects [`compositor::CompositorConfig`] into its shader
//! template and binds the textures the host uploads from
//! [`attributes::AttributeMaps`]. The software renderer is the oracle its
//! conformance test compares against.

pub mod atlas;
pub mod attributes;
pub mod channel;
pub mod color;
pub mod compositor;
pub mod cp437;
pub mod geometry;
pub mod palette;
pub mod software;
pub mod text;

pub use atlas::{AtlasError, GlyphAtlas};
pub use attributes::{AttributeError, AttributeMaps, CellAttributes, CellStyle, Snapshot};
pub use channel::{GlyphIndex, LayerIndex, UnormChannel};
pub use color::{Rgba, Rgba8};
pub use compositor::{AlphaPolicy, CompositorConfig};
pub use geometry::{AtlasLayout, CellCoord, CellLocation, GridDimensions, GridError};
pub use software::{Framebuffer, RenderError, SoftwareRenderer, SoftwareTextures};
pub use text::{TextBuilder, TextSegment};
