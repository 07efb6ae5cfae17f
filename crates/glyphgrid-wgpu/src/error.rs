#![forbid(unsafe_code)]

use std::fmt;

use glyphgrid_core::{AttributeMaps, GridDimensions, GridError};

use crate::textures::AttributeMapKind;

/// Host-side binding and configuration errors.
///
/// The compositor itself cannot fail; everything here is caught before a
/// draw is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositorError {
    /// Invalid grid or atlas layout.
    Grid(GridError),
    /// An attribute map's texel size differs from the compositor's grid.
    MapSize {
        map: AttributeMapKind,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// An attribute map has the wrong texture format.
    MapFormat {
        map: AttributeMapKind,
        expected: wgpu::TextureFormat,
        actual: wgpu::TextureFormat,
    },
    /// The atlas is not a 2D texture usable as a layered array.
    AtlasNotLayered(wgpu::TextureDimension),
    /// The atlas is not `Rgba8Unorm`.
    AtlasFormat(wgpu::TextureFormat),
    /// A replacement atlas differs from the atlas texture in size or layer
    /// count, as `(width, height, layers)`.
    AtlasSize {
        expected: (u32, u32, u32),
        actual: (u32, u32, u32),
    },
    /// Render target format cannot take the compositor's colour output.
    UnsupportedTarget(wgpu::TextureFormat),
}

impl CompositorError {
    pub(crate) fn grid_mismatch(map: AttributeMapKind, expected: GridDimensions, maps: &AttributeMaps) -> Self {
        let actual = maps.grid();
        Self::MapSize {
            map,
            expected: (u32::from(expected.cols()), u32::from(expected.rows())),
            actual: (u32::from(actual.cols()), u32::from(actual.rows())),
        }
    }
}

impl fmt::Display for CompositorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(err) => write!(f, "invalid compositor geometry: {err}"),
            Self::MapSize {
                map,
                expected,
                actual,
            } => write!(
                f,
                "{map} map is {}x{}, grid is {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            Self::MapFormat {
                map,
                expected,
                actual,
            } => write!(f, "{map} map has format {actual:?}, expected {expected:?}"),
            Self::AtlasNotLayered(dim) => {
                write!(f, "glyph atlas must be a 2D (array) texture, got {dim:?}")
            }
            Self::AtlasFormat(format) => {
                write!(f, "glyph atlas has format {format:?}, expected Rgba8Unorm")
            }
            Self::AtlasSize { expected, actual } => write!(
                f,
                "glyph atlas is {}x{} with {} layers, texture is {}x{} with {} layers",
                actual.0, actual.1, actual.2, expected.0, expected.1, expected.2
            ),
            Self::UnsupportedTarget(format) => {
                write!(f, "render target format {format:?} is not a colour format")
            }
        }
    }
}

impl std::error::Error for CompositorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Grid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GridError> for CompositorError {
    fn from(err: GridError) -> Self {
        Self::Grid(err)
    }
}
