//! Drawing registers: pen, clip, camera, palettes, fill pattern and cursor.

use serde::{Deserialize, Serialize};

use crate::memory::SCREEN_SIZE;

/// Bit 4 of a draw-palette entry marks the colour as transparent.
pub const TRANSPARENT_BIT: u8 = 0x10;

/// Clip rectangle, half-open: `x1 <= x < x2`, `y1 <= y < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRect {
    pub x1: u8,
    pub y1: u8,
    pub x2: u8,
    pub y2: u8,
}

impl ClipRect {
    pub const FULL: ClipRect = ClipRect {
        x1: 0,
        y1: 0,
        x2: SCREEN_SIZE as u8,
        y2: SCREEN_SIZE as u8,
    };

    /// Intersect `[x, x+w) x [y, y+h)` with the screen. An empty
    /// intersection yields a rect with `x1 == x2` or `y1 == y2`.
    pub fn from_rect(x: i32, y: i32, w: i32, h: i32) -> Self {
        let size = SCREEN_SIZE as i32;
        let x1 = x.clamp(0, size);
        let y1 = y.clamp(0, size);
        let x2 = x.saturating_add(w).clamp(x1, size);
        let y2 = y.saturating_add(h).clamp(y1, size);
        ClipRect {
            x1: x1 as u8,
            y1: y1 as u8,
            x2: x2 as u8,
            y2: y2 as u8,
        }
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 as i32 && x < self.x2 as i32 && y >= self.y1 as i32 && y < self.y2 as i32
    }

    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }
}

impl Default for ClipRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// A resolved drawing colour.
///
/// Where the stipple bit for a pixel is clear the primary colour is drawn;
/// where it is set the secondary colour is drawn, or nothing at all when
/// `transparent` is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBits {
    pub stipple: u16,
    pub transparent: bool,
    pub primary: u8,
    pub secondary: u8,
}

impl ColorBits {
    /// A single colour with no fill pattern.
    pub fn solid(color: u8) -> Self {
        Self {
            stipple: 0,
            transparent: false,
            primary: color & 0x0F,
            secondary: 0,
        }
    }

    /// Stipple bit for screen position (x, y), indexed `(x & 3) + 4 * (y & 3)`.
    #[inline]
    pub fn stipple_bit(&self, x: i32, y: i32) -> bool {
        (self.stipple >> ((x & 3) + 4 * (y & 3))) & 1 != 0
    }
}

/// A colour argument as the console passes it: a 16.16 fixed-point value.
///
/// - bits 16..24: pen colour (low nibble primary, high nibble secondary)
/// - bits 0..16: fill pattern
/// - bit 24: pattern transparency
/// - bit 28: the pattern bits are meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorArg(u32);

impl ColorArg {
    const PATTERN_TRANSPARENT: u32 = 0x0100_0000;
    const USE_PATTERN: u32 = 0x1000_0000;

    /// A plain pen colour.
    pub fn pen(color: u8) -> Self {
        Self((color as u32) << 16)
    }

    /// A pen colour carrying its own fill pattern.
    pub fn with_pattern(color: u8, pattern: u16, transparent: bool) -> Self {
        let mut bits = Self::USE_PATTERN | (color as u32) << 16 | pattern as u32;
        if transparent {
            bits |= Self::PATTERN_TRANSPARENT;
        }
        Self(bits)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn color(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn pattern(self) -> u16 {
        self.0 as u16
    }

    pub fn pattern_transparent(self) -> bool {
        self.0 & Self::PATTERN_TRANSPARENT != 0
    }

    pub fn uses_pattern(self) -> bool {
        self.0 & Self::USE_PATTERN != 0
    }
}

impl From<u8> for ColorArg {
    fn from(color: u8) -> Self {
        Self::pen(color)
    }
}

/// Default draw palette: identity, with only colour 0 transparent.
pub fn default_draw_palette() -> [u8; 16] {
    std::array::from_fn(|i| i as u8 | if i == 0 { TRANSPARENT_BIT } else { 0 })
}

pub fn default_screen_palette() -> [u8; 16] {
    std::array::from_fn(|i| i as u8)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawState {
    pub pen: u8,
    pub clip: ClipRect,
    pub camera_x: i16,
    pub camera_y: i16,
    /// Remap applied while drawing; bit 4 marks transparency for sprites.
    pub draw_palette: [u8; 16],
    /// Remap applied when the screen is shown.
    pub screen_palette: [u8; 16],
    pub fill_pattern: u16,
    pub fill_transparent: bool,
    /// Lets colour arguments carry their own fill pattern.
    pub fill_pattern_mode: bool,
    pub cursor_x: u8,
    pub cursor_y: u8,
    pub polyline_x: i16,
    pub polyline_y: i16,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            pen: 6,
            clip: ClipRect::FULL,
            camera_x: 0,
            camera_y: 0,
            draw_palette: default_draw_palette(),
            screen_palette: default_screen_palette(),
            fill_pattern: 0,
            fill_transparent: false,
            fill_pattern_mode: false,
            cursor_x: 0,
            cursor_y: 0,
            polyline_x: 0,
            polyline_y: 0,
        }
    }
}

impl DrawState {
    /// Draw-palette entry for a colour index (low nibble only).
    #[inline]
    pub fn draw_entry(&self, color: u8) -> u8 {
        self.draw_palette[(color & 0x0F) as usize]
    }

    #[inline]
    pub fn is_transparent(&self, color: u8) -> bool {
        self.draw_entry(color) & TRANSPARENT_BIT != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_from_rect_intersects_screen() {
        assert_eq!(
            ClipRect::from_rect(10, 10, 20, 30),
            ClipRect {
                x1: 10,
                y1: 10,
                x2: 30,
                y2: 40
            }
        );
        assert_eq!(ClipRect::from_rect(-20, -20, 500, 500), ClipRect::FULL);
    }

    #[test]
    fn test_clip_from_rect_empty() {
        let clip = ClipRect::from_rect(200, 5, 10, 10);
        assert!(clip.is_empty());
        assert!(!clip.contains(127, 6));

        let clip = ClipRect::from_rect(50, 50, -10, 4);
        assert!(clip.is_empty());
        assert_eq!(clip.x1, clip.x2);
    }

    #[test]
    fn test_stipple_bit_indexing() {
        let bits = ColorBits {
            stipple: 0b0000_0000_0010_0001,
            transparent: false,
            primary: 1,
            secondary: 2,
        };
        assert!(bits.stipple_bit(0, 0));
        assert!(bits.stipple_bit(4, 4));
        assert!(bits.stipple_bit(1, 1));
        assert!(!bits.stipple_bit(1, 0));
    }

    #[test]
    fn test_color_arg_fields() {
        let c = ColorArg::with_pattern(0x8C, 0x5A5A, true);
        assert_eq!(c.color(), 0x8C);
        assert_eq!(c.pattern(), 0x5A5A);
        assert!(c.pattern_transparent());
        assert!(c.uses_pattern());

        let plain = ColorArg::from(7u8);
        assert_eq!(plain.bits(), 0x0007_0000);
        assert!(!plain.uses_pattern());
    }

    #[test]
    fn test_default_palettes() {
        let ds = DrawState::default();
        assert!(ds.is_transparent(0));
        assert!((1..16).all(|c| !ds.is_transparent(c)));
        assert_eq!(ds.draw_entry(0x17), 7);
        assert_eq!(ds.screen_palette[15], 15);
    }
}
