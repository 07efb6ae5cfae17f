#![forbid(unsafe_code)]

//! WGSL source for the compositor.
//!
//! The grid size, atlas layout and alpha policy are compile-time constants of
//! the shader, injected by text substitution into [`SHADER_TEMPLATE`].

use glyphgrid_core::CompositorConfig;
use tracing::debug;

/// Template with `{{NAME}}` placeholders.
pub const SHADER_TEMPLATE: &str = include_str!("glyph_compositor.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Render the WGSL source for one configuration.
#[must_use]
pub fn compositor_wgsl(config: &CompositorConfig) -> String {
    let replacements = [
        ("{{GRID_COLS}}", wgsl_float(config.grid.cols())),
        ("{{GRID_ROWS}}", wgsl_float(config.grid.rows())),
        ("{{ATLAS_COLS}}", wgsl_float(config.atlas.cols())),
        ("{{ATLAS_ROWS}}", wgsl_float(config.atlas.rows())),
        ("{{ATLAS_COLUMNS}}", config.atlas.cols().to_string()),
        ("{{ALPHA_POLICY}}", config.alpha.shader_tag().to_string()),
    ];
    replacements
        .iter()
        .fold(SHADER_TEMPLATE.to_owned(), |src, (key, value)| {
            src.replace(key, value)
        })
}

/// Compile the compositor for `config`.
pub fn create_shader_module(device: &wgpu::Device, config: &CompositorConfig) -> wgpu::ShaderModule {
    let source = compositor_wgsl(config);
    debug!(
        cols = config.grid.cols(),
        rows = config.grid.rows(),
        atlas_cols = config.atlas.cols(),
        atlas_rows = config.atlas.rows(),
        alpha = %config.alpha,
        "compiling glyph compositor shader"
    );
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("glyph_compositor"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

/// Integer as a WGSL float literal (`80` → `80.0`).
fn wgsl_float(value: u16) -> String {
    format!("{value}.0")
}
