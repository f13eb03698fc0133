//! Text rendering from the BIOS font sheet.
//!
//! The font is a 128x128 sheet with 32 glyphs per row. Codes below 0x80 are
//! 4x6 cells; extended codes are 8x6 cells starting at offset
//! `2 * code - 0x80`. Only the top five rows of a cell are drawn.

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::ppu::{PackedSurface, SurfaceError};

use crate::draw_state::{ColorArg, ColorBits};
use crate::gfx::console_coord;
use crate::memory::{SCREEN_SIZE, SURFACE_BYTES};
use crate::vm::Vm;

pub const LINE_HEIGHT: i32 = 6;
const GLYPH_ROWS: i32 = 5;
/// Cursor-mode prints past this line scroll the screen.
const SCROLL_THRESHOLD: i32 = SCREEN_SIZE as i32 - 2 * LINE_HEIGHT;

/// Read access to glyph pixels.
pub trait FontSource: Send {
    /// Whether the font sheet pixel at (x, y) is set.
    fn glyph_pixel_set(&self, x: i32, y: i32) -> bool;
}

/// Font backed by the packed 128x128 BIOS sheet; a non-zero nibble is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiosFont {
    sheet: PackedSurface,
}

impl BiosFont {
    /// An empty font that draws nothing.
    pub fn blank() -> Self {
        Self {
            sheet: PackedSurface::new(SCREEN_SIZE, SCREEN_SIZE),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SurfaceError> {
        Ok(Self {
            sheet: PackedSurface::from_bytes(SCREEN_SIZE, SCREEN_SIZE, bytes)?,
        })
    }

    pub fn sheet(&self) -> &PackedSurface {
        &self.sheet
    }
}

impl Default for BiosFont {
    fn default() -> Self {
        Self::blank()
    }
}

impl FontSource for BiosFont {
    fn glyph_pixel_set(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.sheet.get(x as usize, y as usize) != 0
    }
}

/// Bytes expected by [`BiosFont::from_bytes`].
pub const FONT_BYTES: usize = SURFACE_BYTES;

impl Vm {
    /// Print `text` at (x, y), or at the cursor when either is missing.
    ///
    /// Only the colour of `c` is used; fill patterns never apply to text.
    /// In cursor mode the screen scrolls up one line once the whole string
    /// has been drawn below the last full line, and the cursor moves to the
    /// next line. With explicit coordinates the cursor ends on the last line
    /// printed.
    pub fn print<T: AsRef<[u8]>>(
        &mut self,
        text: Option<T>,
        x: Option<i32>,
        y: Option<i32>,
        c: Option<ColorArg>,
    ) {
        let Some(text) = text else {
            return;
        };

        let cursor_mode = x.is_none() || y.is_none();
        let (mut x, mut y) = match (x, y) {
            (Some(x), Some(y)) => (console_coord(x), console_coord(y)),
            _ => {
                let ds = &self.ram.draw_state;
                (ds.cursor_x as i32, ds.cursor_y as i32)
            }
        };
        let bits = ColorBits::solid(self.resolve_color(c).primary);
        let line_start = x;

        for &ch in text.as_ref() {
            if ch == b'\n' {
                x = line_start;
                y = y.saturating_add(LINE_HEIGHT);
                continue;
            }
            self.draw_glyph(ch, x, y, bits);
            x = x.saturating_add(glyph_width(ch));
        }

        if cursor_mode && y > SCROLL_THRESHOLD {
            self.ram.screen.scroll_up(LINE_HEIGHT as usize);
            y -= LINE_HEIGHT;
            log(LogCategory::Text, LogLevel::Trace, || {
                "print scrolled the screen".to_string()
            });
        }

        let next_y = if cursor_mode {
            y.saturating_add(LINE_HEIGHT)
        } else {
            y
        };
        let ds = &mut self.ram.draw_state;
        ds.cursor_x = line_start as u8;
        ds.cursor_y = next_y as u8;
    }

    fn draw_glyph(&mut self, ch: u8, x: i32, y: i32, bits: ColorBits) {
        let w = glyph_width(ch);
        let offset = if ch < 0x80 {
            ch as i32
        } else {
            2 * ch as i32 - 0x80
        };
        let font_x = offset % 32 * 4;
        let font_y = offset / 32 * LINE_HEIGHT;
        let (x, y) = self.to_screen(x, y);

        for dy in 0..GLYPH_ROWS {
            for dx in 0..w {
                if self.font.glyph_pixel_set(font_x + dx, font_y + dy) {
                    self.set_pixel(x + dx, y + dy, bits);
                }
            }
        }
    }

    /// Move the cursor, optionally setting the pen. Returns the previous
    /// cursor position.
    pub fn cursor(&mut self, x: u8, y: u8, c: Option<u8>) -> (u8, u8) {
        let ds = &mut self.ram.draw_state;
        let prev = (ds.cursor_x, ds.cursor_y);
        ds.cursor_x = x;
        ds.cursor_y = y;
        if let Some(c) = c {
            ds.pen = c;
        }
        prev
    }
}

#[inline]
fn glyph_width(ch: u8) -> i32 {
    if ch < 0x80 {
        4
    } else {
        8
    }
}
