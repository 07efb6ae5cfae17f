//! Named colours for the attribute maps.

use crate::color::Rgba8;

pub const BLACK: Rgba8 = Rgba8::rgb(0, 0, 0);
pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
pub const YELLOW: Rgba8 = Rgba8::rgb(255, 255, 0);
pub const RED: Rgba8 = Rgba8::rgb(255, 0, 0);
pub const CYAN: Rgba8 = Rgba8::rgb(0, 255, 255);
pub const GREEN: Rgba8 = Rgba8::rgb(0, 255, 0);
pub const TRANSPARENT: Rgba8 = Rgba8::TRANSPARENT;
