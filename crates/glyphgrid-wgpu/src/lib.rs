#![forbid(unsafe_code)]

//! wgpu backend for the glyphgrid compositor.
//!
//! # Role in glyphgrid
//! `glyphgrid-wgpu` turns a [`glyphgrid_core::CompositorConfig`] into a
//! render pipeline and keeps the GPU copies of the atlas and attribute maps.
//!
//! # Primary responsibilities
//! - **Shader**: [`shader::compositor_wgsl`] injects grid size, atlas layout
//!   and alpha policy into the WGSL template.
//! - **Textures**: [`textures::GpuTextures`] owns the six group-0 resources
//!   and uploads [`glyphgrid_core::AttributeMaps`] planes when they are dirty.
//! - **Pipeline**: [`pipeline::GlyphCompositorPipeline`] builds the render
//!   pipeline, validates bindings and records the full-screen draw.
//!
//! # Binding contract (group 0)
//!
//! | Slot | Resource |
//! |-----:|----------|
//! | 0 | glyph atlas, `texture_2d_array<f32>` |
//! | 1 | sampler, nearest + clamp-to-edge |
//! | 2 | index map, `R8Unorm` |
//! | 3 | foreground map, `Rgba8Unorm` |
//! | 4 | background map, `Rgba8Unorm` |
//! | 5 | set map, `R8Unorm` |
//!
//! Vertex input: position `Float32x3` at location 0, UV `Float32x2` at
//! location 1. Output: one colour to attachment 0.

pub mod error;
pub mod pipeline;
pub mod shader;
pub mod textures;

pub use error::CompositorError;
pub use pipeline::{FULLSCREEN_QUAD, GlyphCompositorPipeline, PipelineOptions, Vertex};
pub use shader::compositor_wgsl;
pub use textures::{AttributeMapKind, GpuTextures};
