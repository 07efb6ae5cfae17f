#![forbid(unsafe_code)]

//! GPU copies of the atlas and attribute maps.
//!
//! | Map | Format | Binding |
//! |-----|--------|--------:|
//! | index | `R8Unorm` | 2 |
//! | foreground | `Rgba8Unorm` | 3 |
//! | background | `Rgba8Unorm` | 4 |
//! | set | `R8Unorm` | 5 |
//!
//! The atlas is an `Rgba8Unorm` 2D texture with one array layer per set,
//! viewed as `D2Array` at binding 0. All reads share one nearest,
//! clamp-to-edge sampler at binding 1 so every fragment in a cell reads that
//! cell's attribute texel unfiltered.

use std::fmt;

use glyphgrid_core::{AttributeMaps, GlyphAtlas, GridDimensions};
use tracing::{debug, trace};

use crate::error::CompositorError;

/// Format of the layered glyph atlas.
pub const ATLAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub const BINDING_ATLAS: u32 = 0;
pub const BINDING_SAMPLER: u32 = 1;

/// One of the four per-cell attribute textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeMapKind {
    Index,
    Foreground,
    Background,
    Set,
}

impl AttributeMapKind {
    pub const ALL: [Self; 4] = [Self::Index, Self::Foreground, Self::Background, Self::Set];

    #[must_use]
    pub const fn format(self) -> wgpu::TextureFormat {
        match self {
            Self::Index | Self::Set => wgpu::TextureFormat::R8Unorm,
            Self::Foreground | Self::Background => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    #[must_use]
    pub const fn bytes_per_texel(self) -> u32 {
        match self {
            Self::Index | Self::Set => 1,
            Self::Foreground | Self::Background => 4,
        }
    }

    #[must_use]
    pub const fn binding(self) -> u32 {
        match self {
            Self::Index => 2,
            Self::Foreground => 3,
            Self::Background => 4,
            Self::Set => 5,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Index => "glyph_index_map",
            Self::Foreground => "glyph_fg_map",
            Self::Background => "glyph_bg_map",
            Self::Set => "glyph_set_map",
        }
    }

    /// The CPU plane backing this map.
    #[must_use]
    pub fn plane(self, maps: &AttributeMaps) -> &[u8] {
        match self {
            Self::Index => maps.glyph_plane(),
            Self::Foreground => maps.fg_plane(),
            Self::Background => maps.bg_plane(),
            Self::Set => maps.set_plane(),
        }
    }
}

impl fmt::Display for AttributeMapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Index => "index",
            Self::Foreground => "foreground",
            Self::Background => "background",
            Self::Set => "set",
        })
    }
}

/// Descriptor for an attribute map texture, one texel per grid cell.
#[must_use]
pub fn attribute_texture_descriptor(
    kind: AttributeMapKind,
    grid: GridDimensions,
) -> wgpu::TextureDescriptor<'static> {
    wgpu::TextureDescriptor {
        label: Some(kind.label()),
        size: wgpu::Extent3d {
            width: u32::from(grid.cols()),
            height: u32::from(grid.rows()),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: kind.format(),
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    }
}

/// Texel size and layer count of `atlas` as a texture extent.
#[must_use]
pub fn atlas_extent(atlas: &GlyphAtlas) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: atlas.width(),
        height: atlas.height(),
        depth_or_array_layers: atlas.layer_count() as u32,
    }
}

/// Reject an atlas that does not exactly fill a texture of `expected` extent.
pub fn check_atlas_extent(expected: wgpu::Extent3d, atlas: &GlyphAtlas) -> Result<(), CompositorError> {
    let actual = atlas_extent(atlas);
    if actual != expected {
        return Err(CompositorError::AtlasSize {
            expected: (expected.width, expected.height, expected.depth_or_array_layers),
            actual: (actual.width, actual.height, actual.depth_or_array_layers),
        });
    }
    Ok(())
}

/// Descriptor for the layered atlas texture.
#[must_use]
pub fn atlas_texture_descriptor(atlas: &GlyphAtlas) -> wgpu::TextureDescriptor<'static> {
    wgpu::TextureDescriptor {
        label: Some("glyph_atlas"),
        size: atlas_extent(atlas),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ATLAS_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    }
}

/// Nearest filtering, clamp-to-edge on every axis.
pub fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("glyph_grid_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

/// View over the atlas as a layer array, even when it has a single layer.
pub fn atlas_view(texture: &wgpu::Texture) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("glyph_atlas_view"),
        dimension: Some(wgpu::TextureViewDimension::D2Array),
        ..Default::default()
    })
}

/// Check that raw textures satisfy the binding contract for `grid`.
pub fn validate_textures(
    grid: GridDimensions,
    atlas: &wgpu::Texture,
    maps: [&wgpu::Texture; 4],
) -> Result<(), CompositorError> {
    if atlas.dimension() != wgpu::TextureDimension::D2 {
        return Err(CompositorError::AtlasNotLayered(atlas.dimension()));
    }
    if atlas.format() != ATLAS_FORMAT {
        return Err(CompositorError::AtlasFormat(atlas.format()));
    }
    let expected = (u32::from(grid.cols()), u32::from(grid.rows()));
    for (kind, texture) in AttributeMapKind::ALL.into_iter().zip(maps) {
        let size = texture.size();
        let actual = (size.width, size.height);
        if actual != expected {
            return Err(CompositorError::MapSize {
                map: kind,
                expected,
                actual,
            });
        }
        if texture.format() != kind.format() {
            return Err(CompositorError::MapFormat {
                map: kind,
                expected: kind.format(),
                actual: texture.format(),
            });
        }
    }
    Ok(())
}

/// The atlas, the four attribute maps and the shared sampler on the GPU.
#[derive(Debug)]
pub struct GpuTextures {
    grid: GridDimensions,
    atlas: wgpu::Texture,
    atlas_view: wgpu::TextureView,
    maps: [wgpu::Texture; 4],
    map_views: [wgpu::TextureView; 4],
    sampler: wgpu::Sampler,
}

impl GpuTextures {
    /// Allocate textures for `grid` and upload `atlas`. Attribute maps start
    /// zeroed; call [`upload_maps`](Self::upload_maps) or
    /// [`sync`](Self::sync) before drawing.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        grid: GridDimensions,
        atlas: &GlyphAtlas,
    ) -> Self {
        let atlas_texture = device.create_texture(&atlas_texture_descriptor(atlas));
        let atlas_view = atlas_view(&atlas_texture);
        let maps = AttributeMapKind::ALL
            .map(|kind| device.create_texture(&attribute_texture_descriptor(kind, grid)));
        let map_views = maps
            .each_ref()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));
        let textures = Self {
            grid,
            atlas: atlas_texture,
            atlas_view,
            maps,
            map_views,
            sampler: create_sampler(device),
        };
        textures.upload_atlas(queue, atlas);
        debug!(
            cols = grid.cols(),
            rows = grid.rows(),
            atlas_width = atlas.width(),
            atlas_height = atlas.height(),
            layers = atlas.layer_count(),
            "compositor textures allocated"
        );
        textures
    }

    #[must_use]
    pub fn grid(&self) -> GridDimensions {
        self.grid
    }

    #[must_use]
    pub fn atlas_texture(&self) -> &wgpu::Texture {
        &self.atlas
    }

    #[must_use]
    pub fn map_texture(&self, kind: AttributeMapKind) -> &wgpu::Texture {
        &self.maps[map_slot(kind)]
    }

    pub(crate) fn atlas_view(&self) -> &wgpu::TextureView {
        &self.atlas_view
    }

    pub(crate) fn map_view(&self, kind: AttributeMapKind) -> &wgpu::TextureView {
        &self.map_views[map_slot(kind)]
    }

    pub(crate) fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Upload all four planes.
    pub fn upload_maps(
        &self,
        queue: &wgpu::Queue,
        maps: &AttributeMaps,
    ) -> Result<(), CompositorError> {
        if maps.grid() != self.grid {
            return Err(CompositorError::grid_mismatch(
                AttributeMapKind::Index,
                self.grid,
                maps,
            ));
        }
        let size = wgpu::Extent3d {
            width: u32::from(self.grid.cols()),
            height: u32::from(self.grid.rows()),
            depth_or_array_layers: 1,
        };
        for kind in AttributeMapKind::ALL {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: self.map_texture(kind),
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                kind.plane(maps),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(size.width * kind.bytes_per_texel()),
                    rows_per_image: Some(size.height),
                },
                size,
            );
        }
        Ok(())
    }

    /// Upload the planes only if they changed since the last sync.
    ///
    /// Returns whether an upload happened.
    pub fn sync(
        &self,
        queue: &wgpu::Queue,
        maps: &mut AttributeMaps,
    ) -> Result<bool, CompositorError> {
        if !maps.is_dirty() {
            return Ok(false);
        }
        self.upload_maps(queue, maps)?;
        maps.take_dirty();
        trace!("attribute maps uploaded");
        Ok(true)
    }

    /// Replace the atlas contents.
    ///
    /// The new atlas must have the same texel size and layer count as the one
    /// the textures were created with; nothing is written otherwise.
    pub fn write_atlas(&self, queue: &wgpu::Queue, atlas: &GlyphAtlas) -> Result<(), CompositorError> {
        check_atlas_extent(self.atlas.size(), atlas)?;
        self.upload_atlas(queue, atlas);
        trace!(layers = atlas.layer_count(), "glyph atlas uploaded");
        Ok(())
    }

    fn upload_atlas(&self, queue: &wgpu::Queue, atlas: &GlyphAtlas) {
        let size = atlas_extent(atlas);
        for layer in 0..size.depth_or_array_layers {
            let Some(bytes) = atlas.layer_bytes(layer as usize) else {
                continue;
            };
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &self.atlas,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                bytes,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(size.width * 4),
                    rows_per_image: Some(size.height),
                },
                wgpu::Extent3d {
                    depth_or_array_layers: 1,
                    ..size
                },
            );
        }
    }
}

const fn map_slot(kind: AttributeMapKind) -> usize {
    match kind {
        AttributeMapKind::Index => 0,
        AttributeMapKind::Foreground => 1,
        AttributeMapKind::Background => 2,
        AttributeMapKind::Set => 3,
    }
}
