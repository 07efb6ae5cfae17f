#![forbid(unsafe_code)]

//! Grid and atlas geometry.
//!
//! Two mappings live here:
//!
//! - screen UV → grid cell + position inside the cell ([`GridDimensions::locate`]);
//! - glyph index + position inside the cell → atlas UV ([`AtlasLayout::atlas_uv`]).
//!
//! UVs are normalised with `(0, 0)` at the top-left of the quad.

use std::fmt;

use crate::channel::GlyphIndex;

/// Grid geometry errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    /// Grid with zero columns or rows.
    ZeroGrid { cols: u16, rows: u16 },
    /// Atlas layout with zero glyph columns or rows.
    ZeroAtlasLayout { cols: u16, rows: u16 },
}

impl TryFrom<(u16, u16)> for GridDimensions {
    type Error = GridError;

    fn try_from((cols, rows): (u16, u16)) -> Result<Self, Self::Error> {
        Self::new(cols, rows)
    }
}

impl From<GridDimensions> for (u16, u16) {
    fn from(grid: GridDimensions) -> Self {
        (grid.cols, grid.rows)
    }
}

impl TryFrom<(u16, u16)> for AtlasLayout {
    type Error = GridError;

    fn try_from((cols, rows): (u16, u16)) -> Result<Self, Self::Error> {
        Self::new(cols, rows)
    }
}

impl From<AtlasLayout> for (u16, u16) {
    fn from(layout: AtlasLayout) -> Self {
        (layout.cols, layout.rows)
    }
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroGrid { cols, rows } => {
                write!(f, "grid must have at least one cell (got {cols}x{rows})")
            }
            Self::ZeroAtlasLayout { cols, rows } => {
                write!(f, "atlas layout must have at least one glyph cell (got {cols}x{rows})")
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Integer cell address, `col` counted from the left and `row` from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellCoord {
    pub col: u16,
    pub row: u16,
}

impl CellCoord {
    #[must_use]
    pub const fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }
}

/// Where a UV lands on the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellLocation {
    /// Cell whose attribute texels a nearest, clamp-to-edge sampler returns.
    pub cell: CellCoord,
    /// `pos_grid - floor(pos_grid)`: position inside the cell, in `[0, 1)`.
    pub fraction: [f32; 2],
}

/// Columns × rows of the character grid.
///
/// Must equal the texel size of all four attribute maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "(u16, u16)", into = "(u16, u16)"))]
pub struct GridDimensions {
    cols: u16,
    rows: u16,
}

impl GridDimensions {
    /// Classic 80×24 terminal.
    pub const TERMINAL_80X24: Self = Self { cols: 80, rows: 24 };

    pub fn new(cols: u16, rows: u16) -> Result<Self, GridError> {
        if cols == 0 || rows == 0 {
            return Err(GridError::ZeroGrid { cols, rows });
        }
        Ok(Self { cols, rows })
    }

    #[must_use]
    pub const fn cols(self) -> u16 {
        self.cols
    }

    #[must_use]
    pub const fn rows(self) -> u16 {
        self.rows
    }

    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.cols as usize * self.rows as usize
    }

    #[must_use]
    pub fn as_vec2(self) -> [f32; 2] {
        [f32::from(self.cols), f32::from(self.rows)]
    }

    /// Row-major linear index of an in-grid cell.
    #[must_use]
    pub fn index_of(self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= i32::from(self.cols) || y >= i32::from(self.rows) {
            return None;
        }
        Some(x as usize + y as usize * self.cols as usize)
    }

    /// Resolve a UV to its cell and in-cell position.
    ///
    /// `pos_grid = uv * (cols, rows)`; the fraction is `pos_grid - floor(pos_grid)`
    /// and the cell is `floor(pos_grid)` clamped to the grid, so UV `(1, 1)`
    /// lands on the last cell rather than one past it.
    #[must_use]
    pub fn locate(self, uv: [f32; 2]) -> CellLocation {
        let [w, h] = self.as_vec2();
        let pos = [uv[0] * w, uv[1] * h];
        let floor = [pos[0].floor(), pos[1].floor()];
        CellLocation {
            cell: CellCoord {
                col: clamp_cell(floor[0], self.cols),
                row: clamp_cell(floor[1], self.rows),
            },
            fraction: [pos[0] - floor[0], pos[1] - floor[1]],
        }
    }

    /// UV of the centre of a cell.
    #[must_use]
    pub fn cell_center_uv(self, cell: CellCoord) -> [f32; 2] {
        let [w, h] = self.as_vec2();
        [
            (f32::from(cell.col) + 0.5) / w,
            (f32::from(cell.row) + 0.5) / h,
        ]
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self::TERMINAL_80X24
    }
}

#[inline]
fn clamp_cell(floor: f32, len: u16) -> u16 {
    // NaN casts to 0, negatives saturate to 0.
    (floor as u16).min(len - 1)
}

/// Glyph cells per atlas layer (columns × rows).
///
/// Glyph `i` sits at column `i % cols`, row `i / cols`, and covers a
/// `1/cols × 1/rows` region of the layer's UV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "(u16, u16)", into = "(u16, u16)"))]
pub struct AtlasLayout {
    cols: u16,
    rows: u16,
}

impl AtlasLayout {
    /// The CP437 sheet layout: 16 × 16 glyphs.
    pub const CP437: Self = Self { cols: 16, rows: 16 };

    pub fn new(cols: u16, rows: u16) -> Result<Self, GridError> {
        if cols == 0 || rows == 0 {
            return Err(GridError::ZeroAtlasLayout { cols, rows });
        }
        Ok(Self { cols, rows })
    }

    #[must_use]
    pub const fn cols(self) -> u16 {
        self.cols
    }

    #[must_use]
    pub const fn rows(self) -> u16 {
        self.rows
    }

    /// Glyph cells per layer.
    #[must_use]
    pub const fn capacity(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }

    #[must_use]
    pub fn as_vec2(self) -> [f32; 2] {
        [f32::from(self.cols), f32::from(self.rows)]
    }

    /// Atlas cell (column, row) holding a glyph.
    #[must_use]
    pub fn glyph_cell(self, glyph: GlyphIndex) -> (u16, u16) {
        let i = u16::from(glyph.0);
        (i % self.cols, i / self.cols)
    }

    /// Top-left UV of a glyph's cell: `(col / cols, row / rows)`.
    #[must_use]
    pub fn cell_origin(self, glyph: GlyphIndex) -> [f32; 2] {
        let (col, row) = self.glyph_cell(glyph);
        let [w, h] = self.as_vec2();
        [f32::from(col) / w, f32::from(row) / h]
    }

    /// Atlas UV for a position inside a grid cell.
    ///
    /// `fraction / (cols, rows) + cell_origin(glyph)`. Glyphs past the layer's
    /// capacity produce UVs below the sheet; the sampler clamps them.
    #[must_use]
    pub fn atlas_uv(self, glyph: GlyphIndex, fraction: [f32; 2]) -> [f32; 2] {
        let origin = self.cell_origin(glyph);
        let [w, h] = self.as_vec2();
        [fraction[0] / w + origin[0], fraction[1] / h + origin[1]]
    }

    /// Half-open UV rectangle `[min, max)` covered by a glyph.
    #[must_use]
    pub fn glyph_region(self, glyph: GlyphIndex) -> ([f32; 2], [f32; 2]) {
        let (col, row) = self.glyph_cell(glyph);
        let [w, h] = self.as_vec2();
        (
            [f32::from(col) / w, f32::from(row) / h],
            [f32::from(col + 1) / w, f32::from(row + 1) / h],
        )
    }
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self::CP437
    }
}
