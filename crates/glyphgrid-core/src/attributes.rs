#![forbid(unsafe_code)]

//! CPU-side attribute maps: the producer half of the compositor contract.
//!
//! [`AttributeMaps`] holds the four per-cell planes the compositor samples:
//!
//! | Plane | Bytes/cell | Texture format |
//! |-------|-----------:|----------------|
//! | glyph |          1 | `R8Unorm`, byte = glyph index |
//! | fg    |          4 | `Rgba8Unorm` |
//! | bg    |          4 | `Rgba8Unorm` |
//! | set   |          1 | `R8Unorm`, byte = atlas layer |
//!
//! All planes are row-major with `grid.cols()` cells per row, so a host can
//! upload them directly. Writes outside the grid are ignored; writes that
//! change a byte set the dirty flag.

use std::fmt;

use crate::channel::{GlyphIndex, LayerIndex};
use crate::color::Rgba8;
use crate::cp437;
use crate::geometry::GridDimensions;

#[cfg(feature = "tracing")]
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeError {
    /// Set index addresses a layer the atlas does not have.
    LayerOutOfRange { layer: LayerIndex, layer_count: u16 },
    /// Layer count must be in `1..=256`.
    InvalidLayerCount(usize),
    /// Snapshot region leaves the grid.
    OutOfBounds {
        x: i32,
        y: i32,
        width: u16,
        height: u16,
    },
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayerOutOfRange { layer, layer_count } => write!(
                f,
                "set {} is out of range ({layer_count} atlas layers)",
                layer.0
            ),
            Self::InvalidLayerCount(n) => {
                write!(f, "layer count {n} is outside 1..=256")
            }
            Self::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(f, "region {width}x{height} at ({x}, {y}) leaves the grid"),
        }
    }
}

impl std::error::Error for AttributeError {}

/// Everything the compositor reads for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellAttributes {
    pub glyph: GlyphIndex,
    pub fg: Rgba8,
    pub bg: Rgba8,
    pub set: LayerIndex,
}

/// Partial cell update; `None` fields leave the cell's value untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellStyle {
    pub glyph: Option<GlyphIndex>,
    pub fg: Option<Rgba8>,
    pub bg: Option<Rgba8>,
    pub set: Option<LayerIndex>,
}

impl CellStyle {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            glyph: None,
            fg: None,
            bg: None,
            set: None,
        }
    }

    #[must_use]
    pub const fn glyph(mut self, glyph: GlyphIndex) -> Self {
        self.glyph = Some(glyph);
        self
    }

    /// Glyph by character; characters outside CP437 leave the glyph unset.
    #[must_use]
    pub fn ch(mut self, ch: char) -> Self {
        self.glyph = cp437::glyph_for(ch);
        self
    }

    #[must_use]
    pub const fn fg(mut self, fg: Rgba8) -> Self {
        self.fg = Some(fg);
        self
    }

    #[must_use]
    pub const fn bg(mut self, bg: Rgba8) -> Self {
        self.bg = Some(bg);
        self
    }

    #[must_use]
    pub const fn set(mut self, set: LayerIndex) -> Self {
        self.set = Some(set);
        self
    }
}

/// A rectangular copy of the attribute maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Top-left cell the snapshot was taken from.
    pub origin: (i32, i32),
    pub width: u16,
    pub height: u16,
    /// Row-major, `width * height` cells.
    pub cells: Vec<CellAttributes>,
}

impl Snapshot {
    #[must_use]
    pub fn cell(&self, dx: u16, dy: u16) -> Option<&CellAttributes> {
        if dx >= self.width || dy >= self.height {
            return None;
        }
        self.cells
            .get(usize::from(dy) * usize::from(self.width) + usize::from(dx))
    }
}

/// CPU shadow of the index, fg, bg and set maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMaps {
    grid: GridDimensions,
    layer_count: u16,
    glyphs: Vec<u8>,
    fg: Vec<u8>,
    bg: Vec<u8>,
    sets: Vec<u8>,
    dirty: bool,
}

impl AttributeMaps {
    /// All-zero maps (glyph 0, transparent colours, set 0), initially dirty.
    ///
    /// `layer_count` is the number of atlas layers set indices may address.
    pub fn new(grid: GridDimensions, layer_count: usize) -> Result<Self, AttributeError> {
        if !(1..=256).contains(&layer_count) {
            return Err(AttributeError::InvalidLayerCount(layer_count));
        }
        let cells = grid.cell_count();
        Ok(Self {
            grid,
            layer_count: layer_count as u16,
            glyphs: vec![0; cells],
            fg: vec![0; cells * 4],
            bg: vec![0; cells * 4],
            sets: vec![0; cells],
            dirty: true,
        })
    }

    #[must_use]
    pub fn grid(&self) -> GridDimensions {
        self.grid
    }

    #[must_use]
    pub fn layer_count(&self) -> u16 {
        self.layer_count
    }

    /// Index map bytes (`R8Unorm`).
    #[must_use]
    pub fn glyph_plane(&self) -> &[u8] {
        &self.glyphs
    }

    /// Foreground map bytes (`Rgba8Unorm`).
    #[must_use]
    pub fn fg_plane(&self) -> &[u8] {
        &self.fg
    }

    /// Background map bytes (`Rgba8Unorm`).
    #[must_use]
    pub fn bg_plane(&self) -> &[u8] {
        &self.bg
    }

    /// Set map bytes (`R8Unorm`).
    #[must_use]
    pub fn set_plane(&self) -> &[u8] {
        &self.sets
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return the dirty flag and clear it. Call after uploading the planes.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<CellAttributes> {
        let i = self.grid.index_of(x, y)?;
        Some(CellAttributes {
            glyph: GlyphIndex(self.glyphs[i]),
            fg: rgba_at(&self.fg, i),
            bg: rgba_at(&self.bg, i),
            set: LayerIndex(self.sets[i]),
        })
    }

    pub fn set_glyph_at(&mut self, x: i32, y: i32, glyph: GlyphIndex) {
        if let Some(i) = self.grid.index_of(x, y) {
            self.write(|m| &mut m.glyphs[i..=i], &[glyph.0]);
        }
    }

    /// Set a cell's glyph from a character; non-CP437 characters are ignored.
    pub fn set_char_at(&mut self, x: i32, y: i32, ch: char) {
        if let Some(glyph) = cp437::glyph_for(ch) {
            self.set_glyph_at(x, y, glyph);
        }
    }

    pub fn set_fg_at(&mut self, x: i32, y: i32, fg: Rgba8) {
        if let Some(i) = self.grid.index_of(x, y) {
            self.write(|m| &mut m.fg[i * 4..i * 4 + 4], &fg.to_bytes());
        }
    }

    pub fn set_bg_at(&mut self, x: i32, y: i32, bg: Rgba8) {
        if let Some(i) = self.grid.index_of(x, y) {
            self.write(|m| &mut m.bg[i * 4..i * 4 + 4], &bg.to_bytes());
        }
    }

    /// Select the atlas layer a cell samples.
    ///
    /// The layer is checked even when the cell is outside the grid.
    pub fn set_set_at(&mut self, x: i32, y: i32, set: LayerIndex) -> Result<(), AttributeError> {
        self.check_layer(set)?;
        if let Some(i) = self.grid.index_of(x, y) {
            self.write(|m| &mut m.sets[i..=i], &[set.0]);
        }
        Ok(())
    }

    /// Apply every `Some` field of `style` to one cell.
    pub fn apply_style(&mut self, x: i32, y: i32, style: &CellStyle) -> Result<(), AttributeError> {
        if let Some(set) = style.set {
            self.set_set_at(x, y, set)?;
        }
        if let Some(glyph) = style.glyph {
            self.set_glyph_at(x, y, glyph);
        }
        if let Some(fg) = style.fg {
            self.set_fg_at(x, y, fg);
        }
        if let Some(bg) = style.bg {
            self.set_bg_at(x, y, bg);
        }
        Ok(())
    }

    /// Write text left to right starting at `(x, y)`, one cell per character.
    ///
    /// `None` colours are left untouched. Characters outside CP437 are
    /// skipped (nothing written) but still advance the column.
    pub fn print_at(&mut self, x: i32, y: i32, text: &str, fg: Option<Rgba8>, bg: Option<Rgba8>) {
        for (dx, ch) in (0i32..).zip(text.chars()) {
            let Some(glyph) = cp437::glyph_for(ch) else {
                continue;
            };
            let cx = x.saturating_add(dx);
            self.set_glyph_at(cx, y, glyph);
            if let Some(fg) = fg {
                self.set_fg_at(cx, y, fg);
            }
            if let Some(bg) = bg {
                self.set_bg_at(cx, y, bg);
            }
        }
    }

    /// [`print_at`](Self::print_at) that also selects an atlas layer.
    pub fn print_at_set(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        fg: Option<Rgba8>,
        bg: Option<Rgba8>,
        set: Option<LayerIndex>,
    ) -> Result<(), AttributeError> {
        if let Some(set) = set {
            self.check_layer(set)?;
        }
        self.print_at(x, y, text, fg, bg);
        if let Some(set) = set {
            for (dx, ch) in (0i32..).zip(text.chars()) {
                if cp437::encode(ch).is_some() {
                    self.set_set_at(x.saturating_add(dx), y, set)?;
                }
            }
        }
        Ok(())
    }

    /// Style a rectangle, clipped to the grid: every cell when `filled`, else
    /// the one-cell outline.
    pub fn draw_rect(
        &mut self,
        x: i32,
        y: i32,
        width: u16,
        height: u16,
        filled: bool,
        style: &CellStyle,
    ) -> Result<(), AttributeError> {
        if let Some(set) = style.set {
            self.check_layer(set)?;
        }
        if width == 0 || height == 0 {
            return Ok(());
        }
        let x1 = x.saturating_add(i32::from(width) - 1);
        let y1 = y.saturating_add(i32::from(height) - 1);
        let cols = i32::from(self.grid.cols());
        let rows = i32::from(self.grid.rows());
        let (cx0, cx1) = (x.max(0), x1.min(cols - 1));
        let (cy0, cy1) = (y.max(0), y1.min(rows - 1));
        if cx0 > cx1 || cy0 > cy1 {
            return Ok(());
        }
        if filled {
            for cy in cy0..=cy1 {
                for cx in cx0..=cx1 {
                    self.apply_style(cx, cy, style)?;
                }
            }
            return Ok(());
        }
        for cx in cx0..=cx1 {
            self.apply_style(cx, y, style)?;
            self.apply_style(cx, y1, style)?;
        }
        for cy in cy0..=cy1 {
            self.apply_style(x, cy, style)?;
            self.apply_style(x1, cy, style)?;
        }
        Ok(())
    }

    /// Reset every plane to zero.
    pub fn clear(&mut self) {
        self.glyphs.fill(0);
        self.fg.fill(0);
        self.bg.fill(0);
        self.sets.fill(0);
        self.mark_dirty();
    }

    /// Copy a region that lies entirely inside the grid.
    pub fn snapshot(
        &self,
        x: i32,
        y: i32,
        width: u16,
        height: u16,
    ) -> Result<Snapshot, AttributeError> {
        let inside = x >= 0
            && y >= 0
            && i64::from(x) + i64::from(width) <= i64::from(self.grid.cols())
            && i64::from(y) + i64::from(height) <= i64::from(self.grid.rows());
        if !inside {
            return Err(AttributeError::OutOfBounds {
                x,
                y,
                width,
                height,
            });
        }
        let mut cells = Vec::with_capacity(usize::from(width) * usize::from(height));
        for dy in 0..i32::from(height) {
            for dx in 0..i32::from(width) {
                if let Some(cell) = self.cell(x + dx, y + dy) {
                    cells.push(cell);
                }
            }
        }
        Ok(Snapshot {
            origin: (x, y),
            width,
            height,
            cells,
        })
    }

    /// Paste a snapshot with its top-left at `(x, y)`, clipped to the grid.
    ///
    /// Fails without writing anything if the snapshot uses a set this map's
    /// atlas does not have.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot, x: i32, y: i32) -> Result<(), AttributeError> {
        for cell in &snapshot.cells {
            self.check_layer(cell.set)?;
        }
        for dy in 0..snapshot.height {
            for dx in 0..snapshot.width {
                let Some(cell) = snapshot.cell(dx, dy) else {
                    continue;
                };
                let cx = x.saturating_add(i32::from(dx));
                let cy = y.saturating_add(i32::from(dy));
                self.set_glyph_at(cx, cy, cell.glyph);
                self.set_fg_at(cx, cy, cell.fg);
                self.set_bg_at(cx, cy, cell.bg);
                self.set_set_at(cx, cy, cell.set)?;
            }
        }
        Ok(())
    }

    /// Paste a snapshot back where it was taken from.
    pub fn restore_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), AttributeError> {
        let (x, y) = snapshot.origin;
        self.apply_snapshot(snapshot, x, y)
    }

    fn check_layer(&self, set: LayerIndex) -> Result<(), AttributeError> {
        if u16::from(set.0) >= self.layer_count {
            return Err(AttributeError::LayerOutOfRange {
                layer: set,
                layer_count: self.layer_count,
            });
        }
        Ok(())
    }

    fn write<F>(&mut self, slot: F, bytes: &[u8])
    where
        F: FnOnce(&mut Self) -> &mut [u8],
    {
        let target = slot(self);
        if target != bytes {
            target.copy_from_slice(bytes);
            if !self.dirty {
                #[cfg(feature = "tracing")]
                trace!("attribute maps marked dirty");
                self.dirty = true;
            }
        }
    }
}

#[inline]
fn rgba_at(plane: &[u8], i: usize) -> Rgba8 {
    Rgba8::from_bytes([
        plane[i * 4],
        plane[i * 4 + 1],
        plane[i * 4 + 2],
        plane[i * 4 + 3],
    ])
}
