//! Rasterizer: pixels, lines, circles and rectangles on the packed screen.
//!
//! Every primitive takes console coordinates, subtracts the camera, and then
//! clips against the clip rect. Coordinates and radii saturate to the
//! console's 16-bit range, and loops only visit the part of a shape that can
//! reach the clip rect, so out-of-range arguments draw nothing rather than
//! overflow. Fill patterns are resolved once per call into
//! a [`ColorBits`] and applied per pixel; spans without any stipple bits take
//! a byte-wise fast path.

use emu_core::logging::{log, LogCategory, LogLevel};

use std::ops::Range;

use crate::draw_state::{ClipRect, ColorArg, ColorBits};
use crate::vm::Vm;

/// Saturate a coordinate, size or radius to the console's 16-bit range.
#[inline]
pub(crate) fn console_coord(v: i32) -> i32 {
    v.clamp(i16::MIN as i32, i16::MAX as i32)
}

/// Offsets `i` in `0..len` with `origin + i` inside `lo..hi`.
#[inline]
pub(crate) fn visible_offsets(origin: i32, len: i32, lo: i32, hi: i32) -> Range<i32> {
    let start = lo.saturating_sub(origin).max(0);
    let end = hi.saturating_sub(origin).min(len);
    start..end.max(start)
}

impl Vm {
    /// Resolve an optional colour argument against the draw state.
    ///
    /// A supplied colour becomes the new pen. When fill-pattern mode is on
    /// and the argument carries a pattern, that pattern replaces the current
    /// one.
    pub fn resolve_color(&mut self, c: Option<ColorArg>) -> ColorBits {
        let ds = &mut self.ram.draw_state;

        if let Some(c) = c {
            ds.pen = c.color();
            if c.uses_pattern() && ds.fill_pattern_mode {
                ds.fill_pattern = c.pattern();
                ds.fill_transparent = c.pattern_transparent();
            }
        }

        ColorBits {
            stipple: ds.fill_pattern,
            transparent: ds.fill_transparent,
            primary: ds.draw_entry(ds.pen) & 0x0F,
            secondary: ds.draw_entry(ds.pen >> 4) & 0x0F,
        }
    }

    /// Plot one pixel in screen space. No-op outside the clip rect.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, bits: ColorBits) {
        if !self.ram.draw_state.clip.contains(x, y) {
            return;
        }

        let mut color = bits.primary;
        if bits.stipple_bit(x, y) {
            if bits.transparent {
                return;
            }
            color = bits.secondary;
        }
        self.ram.screen.set(x as usize, y as usize, color);
    }

    /// Screen-space pixel read; 0 outside the clip rect.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> u8 {
        if !self.ram.draw_state.clip.contains(x, y) {
            return 0;
        }
        self.ram.screen.get(x as usize, y as usize)
    }

    /// Horizontal span in screen space, endpoints in either order.
    pub fn hline(&mut self, x1: i32, x2: i32, y: i32, bits: ColorBits) {
        let clip = self.ram.draw_state.clip;
        if y < clip.y1 as i32 || y >= clip.y2 as i32 {
            return;
        }

        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        let x1 = x1.max(clip.x1 as i32);
        let x2 = x2.min(clip.x2 as i32 - 1);
        if x1 > x2 {
            return;
        }

        if bits.stipple != 0 {
            for x in x1..=x2 {
                self.set_pixel(x, y, bits);
            }
        } else {
            self.ram
                .screen
                .fill_span(x1 as usize, x2 as usize, y as usize, bits.primary);
        }
    }

    /// Vertical span in screen space, endpoints in either order.
    pub fn vline(&mut self, x: i32, y1: i32, y2: i32, bits: ColorBits) {
        let clip = self.ram.draw_state.clip;
        if x < clip.x1 as i32 || x >= clip.x2 as i32 {
            return;
        }

        let (y1, y2) = if y1 > y2 { (y2, y1) } else { (y1, y2) };
        let y1 = y1.max(clip.y1 as i32);
        let y2 = y2.min(clip.y2 as i32 - 1);
        if y1 > y2 {
            return;
        }

        if bits.stipple != 0 {
            for y in y1..=y2 {
                self.set_pixel(x, y, bits);
            }
        } else {
            for y in y1..=y2 {
                self.ram.screen.set(x as usize, y as usize, bits.primary);
            }
        }
    }

    /// Console coordinates to screen space.
    #[inline]
    pub(crate) fn to_screen(&self, x: i32, y: i32) -> (i32, i32) {
        let ds = &self.ram.draw_state;
        (
            console_coord(x) - ds.camera_x as i32,
            console_coord(y) - ds.camera_y as i32,
        )
    }

    pub fn pset(&mut self, x: i32, y: i32, c: Option<ColorArg>) {
        let (x, y) = self.to_screen(x, y);
        let bits = self.resolve_color(c);
        self.set_pixel(x, y, bits);
    }

    /// Read a pixel in console coordinates. Honours both camera and clip.
    pub fn pget(&self, x: i32, y: i32) -> u8 {
        let (x, y) = self.to_screen(x, y);
        self.get_pixel(x, y)
    }

    /// Line from (x0, y0) to (x1, y1). The end point becomes the polyline
    /// anchor for [`Vm::line_to`].
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, c: Option<ColorArg>) {
        {
            let ds = &mut self.ram.draw_state;
            ds.polyline_x = console_coord(x1) as i16;
            ds.polyline_y = console_coord(y1) as i16;
        }

        let (x0, y0) = self.to_screen(x0, y0);
        let (x1, y1) = self.to_screen(x1, y1);
        let bits = self.resolve_color(c);
        let clip = self.ram.draw_state.clip;

        if x0 == x1 && y0 == y1 {
            self.set_pixel(x0, y0, bits);
        } else if (x1 - x0).abs() > (y1 - y0).abs() {
            let (lo, hi) = (x0.min(x1), x0.max(x1));
            for x in visible_offsets(lo, hi - lo + 1, clip.x1 as i32, clip.x2 as i32) {
                let x = lo + x;
                let t = (x - x0) as f64 / (x1 - x0) as f64;
                let y = mix(y0 as f64, y1 as f64, t).round() as i32;
                self.set_pixel(x, y, bits);
            }
        } else {
            let (lo, hi) = (y0.min(y1), y0.max(y1));
            for y in visible_offsets(lo, hi - lo + 1, clip.y1 as i32, clip.y2 as i32) {
                let y = lo + y;
                let t = (y - y0) as f64 / (y1 - y0) as f64;
                let x = mix(x0 as f64, x1 as f64, t).round() as i32;
                self.set_pixel(x, y, bits);
            }
        }
    }

    /// Line from the polyline anchor to (x1, y1).
    pub fn line_to(&mut self, x1: i32, y1: i32, c: Option<ColorArg>) {
        let ds = &self.ram.draw_state;
        let (x0, y0) = (ds.polyline_x as i32, ds.polyline_y as i32);
        self.line(x0, y0, x1, y1, c);
    }

    pub fn circ(&mut self, x: i32, y: i32, r: i32, c: Option<ColorArg>) {
        let (x, y) = self.to_screen(x, y);
        let r = console_coord(r);
        let bits = self.resolve_color(c);
        if !self.circle_reaches_clip(x, y, r) {
            return;
        }

        for (dx, dy) in circle_steps(r) {
            self.set_pixel(x + dx, y + dy, bits);
            self.set_pixel(x + dy, y + dx, bits);
            self.set_pixel(x - dy, y + dx, bits);
            self.set_pixel(x - dx, y + dy, bits);
            self.set_pixel(x - dx, y - dy, bits);
            self.set_pixel(x - dy, y - dx, bits);
            self.set_pixel(x + dy, y - dx, bits);
            self.set_pixel(x + dx, y - dy, bits);
        }
    }

    pub fn circfill(&mut self, x: i32, y: i32, r: i32, c: Option<ColorArg>) {
        let (x, y) = self.to_screen(x, y);
        let r = console_coord(r);
        let bits = self.resolve_color(c);
        if !self.circle_reaches_clip(x, y, r) {
            return;
        }

        // Spans overlap a little; overdraw is harmless with opaque colours
        // and identical for stipples since the pattern is position-based.
        for (dx, dy) in circle_steps(r) {
            self.hline(x - dx, x + dx, y - dy, bits);
            self.hline(x - dx, x + dx, y + dy, bits);
            self.vline(x - dy, y - dx, y + dx, bits);
            self.vline(x + dy, y - dx, y + dx, bits);
        }
    }

    pub fn rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, c: Option<ColorArg>) {
        let (x0, y0) = self.to_screen(x0, y0);
        let (x1, y1) = self.to_screen(x1, y1);
        let bits = self.resolve_color(c);

        let (x0, x1) = (x0.min(x1), x0.max(x1));
        let (y0, y1) = (y0.min(y1), y0.max(y1));

        self.hline(x0, x1, y0, bits);
        self.hline(x0, x1, y1, bits);

        if y0 + 1 < y1 {
            self.vline(x0, y0 + 1, y1 - 1, bits);
            self.vline(x1, y0 + 1, y1 - 1, bits);
        }
    }

    pub fn rectfill(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, c: Option<ColorArg>) {
        let (x0, y0) = self.to_screen(x0, y0);
        let (x1, y1) = self.to_screen(x1, y1);
        let bits = self.resolve_color(c);
        let clip = self.ram.draw_state.clip;

        let (lo, hi) = (y0.min(y1), y0.max(y1));
        for y in visible_offsets(lo, hi - lo + 1, clip.y1 as i32, clip.y2 as i32) {
            self.hline(x0, x1, lo + y, bits);
        }
    }

    /// Whether the bounding box of a circle in screen space meets the clip
    /// rect.
    fn circle_reaches_clip(&self, x: i32, y: i32, r: i32) -> bool {
        let clip = self.ram.draw_state.clip;
        x + r >= clip.x1 as i32
            && x - r < clip.x2 as i32
            && y + r >= clip.y1 as i32
            && y - r < clip.y2 as i32
    }

    /// Set the clip rect to `[x, x+w) x [y, y+h)` intersected with the
    /// screen. Without a height the clip resets to the whole screen.
    pub fn clip(&mut self, x: i32, y: i32, w: i32, h: Option<i32>) {
        self.ram.draw_state.clip = match h {
            Some(h) => ClipRect::from_rect(x, y, w, h),
            None => ClipRect::FULL,
        };
    }

    /// Clear the screen to `c`, resetting clip and cursor.
    pub fn cls(&mut self, c: u8) {
        self.ram.screen.fill(c & 0x0F);

        let ds = &mut self.ram.draw_state;
        ds.clip = ClipRect::FULL;
        ds.cursor_x = 0;
        ds.cursor_y = 0;

        log(LogCategory::Gfx, LogLevel::Trace, || format!("cls({})", c & 0x0F));
    }

    /// Set the camera offset, returning the previous one.
    pub fn camera(&mut self, x: i16, y: i16) -> (i16, i16) {
        let ds = &mut self.ram.draw_state;
        let prev = (ds.camera_x, ds.camera_y);
        ds.camera_x = x;
        ds.camera_y = y;
        prev
    }

    /// Set the pen, returning the previous one.
    pub fn color(&mut self, c: u8) -> u8 {
        std::mem::replace(&mut self.ram.draw_state.pen, c)
    }

    /// Set the fill pattern, returning the previous pattern and flag.
    pub fn fillp(&mut self, pattern: u16, transparent: bool) -> (u16, bool) {
        let ds = &mut self.ram.draw_state;
        let prev = (ds.fill_pattern, ds.fill_transparent);
        ds.fill_pattern = pattern;
        ds.fill_transparent = transparent;
        prev
    }

    /// Allow colour arguments to carry their own fill pattern.
    pub fn set_fill_pattern_mode(&mut self, enabled: bool) {
        self.ram.draw_state.fill_pattern_mode = enabled;
    }
}

#[inline]
fn mix(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Offsets visited by the circle loop for radius `r`, one octant.
///
/// The threshold `2 * (err - dx) > r + 1` differs from textbook Bresenham
/// and is what gives circles their exact console shape.
fn circle_steps(r: i32) -> impl Iterator<Item = (i32, i32)> {
    let (mut dx, mut dy, mut err) = (r, 0, 0);
    std::iter::from_fn(move || {
        if dx < dy {
            return None;
        }
        let step = (dx, dy);
        dy += 1;
        err += 1 + 2 * dy;
        if 2 * (err - dx) > r + 1 {
            dx -= 1;
            err += 1 - 2 * dx;
        }
        Some(step)
    })
}
