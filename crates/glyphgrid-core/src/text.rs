#![forbid(unsafe_code)]

//! Styled, wrapping text runs for [`AttributeMaps`].
//!
//! ```
//! use glyphgrid_core::{AttributeMaps, GridDimensions, TextBuilder, palette};
//!
//! let mut maps = AttributeMaps::new(GridDimensions::new(20, 4).unwrap(), 1).unwrap();
//! let cursor = TextBuilder::new()
//!     .fg(palette::YELLOW)
//!     .text("HP ")
//!     .fg(palette::RED)
//!     .text("12/20")
//!     .print(&mut maps, (1, 1), 18, 1)
//!     .unwrap();
//! assert_eq!(cursor, (9, 1));
//! ```

use crate::attributes::{AttributeError, AttributeMaps};
use crate::channel::LayerIndex;
use crate::color::Rgba8;
use crate::palette::{BLACK, TRANSPARENT, WHITE};

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub text: String,
    pub fg: Rgba8,
    pub bg: Rgba8,
    pub set: LayerIndex,
}

/// Builder for multi-colour text. Style calls apply to later `text` calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuilder {
    segments: Vec<TextSegment>,
    fg: Rgba8,
    bg: Rgba8,
    set: LayerIndex,
}

impl Default for TextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuilder {
    /// White on black, set 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            fg: WHITE,
            bg: BLACK,
            set: LayerIndex(0),
        }
    }

    #[must_use]
    pub fn fg(mut self, fg: Rgba8) -> Self {
        self.fg = fg;
        self
    }

    #[must_use]
    pub fn bg(mut self, bg: Rgba8) -> Self {
        self.bg = bg;
        self
    }

    #[must_use]
    pub fn set(mut self, set: LayerIndex) -> Self {
        self.set = set;
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(TextSegment {
            text: text.into(),
            fg: self.fg,
            bg: self.bg,
            set: self.set,
        });
        self
    }

    #[must_use]
    pub fn segments(&self) -> &[TextSegment] {
        &self.segments
    }

    /// Number of characters across all segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.text.chars().count()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Print starting at `origin`, returning the cursor after the last
    /// character.
    ///
    /// After writing a character at column `x > wrap_x` the cursor moves to
    /// `return_x` on the next row. Colours are written opaque.
    pub fn print(
        &self,
        maps: &mut AttributeMaps,
        origin: (i32, i32),
        wrap_x: i32,
        return_x: i32,
    ) -> Result<(i32, i32), AttributeError> {
        self.print_dimmed(maps, origin, wrap_x, return_x, TRANSPARENT)
    }

    /// [`print`](Self::print) with `dim` subtracted from every colour.
    pub fn print_dimmed(
        &self,
        maps: &mut AttributeMaps,
        origin: (i32, i32),
        wrap_x: i32,
        return_x: i32,
        dim: Rgba8,
    ) -> Result<(i32, i32), AttributeError> {
        self.print_inner(maps, origin, wrap_x, return_x, dim, None)
    }

    /// [`print_dimmed`](Self::print_dimmed) that stops once the cursor
    /// reaches `max_row`.
    pub fn print_clipped(
        &self,
        maps: &mut AttributeMaps,
        origin: (i32, i32),
        wrap_x: i32,
        return_x: i32,
        dim: Rgba8,
        max_row: i32,
    ) -> Result<(i32, i32), AttributeError> {
        self.print_inner(maps, origin, wrap_x, return_x, dim, Some(max_row))
    }

    fn print_inner(
        &self,
        maps: &mut AttributeMaps,
        (mut x, mut y): (i32, i32),
        wrap_x: i32,
        return_x: i32,
        dim: Rgba8,
        max_row: Option<i32>,
    ) -> Result<(i32, i32), AttributeError> {
        // Validate up front so a bad set never leaves a half-printed run.
        for seg in &self.segments {
            maps.set_set_at(-1, -1, seg.set)?;
        }
        'segments: for seg in &self.segments {
            let fg = seg.fg.dimmed(dim);
            let bg = seg.bg.dimmed(dim);
            for ch in seg.text.chars() {
                if max_row.is_some_and(|limit| y >= limit) {
                    break 'segments;
                }
                maps.set_bg_at(x, y, bg);
                maps.set_char_at(x, y, ch);
                maps.set_fg_at(x, y, fg);
                maps.set_set_at(x, y, seg.set)?;
                if x > wrap_x {
                    x = return_x;
                    y += 1;
                } else {
                    x += 1;
                }
            }
        }
        Ok((x, y))
    }
}
