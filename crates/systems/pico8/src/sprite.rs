//! Sprite sheet, tile map and palette operations.
//!
//! Sprite `n` is the 8x8 cell at `(n % 16 * 8, n / 16 * 8)` of the sheet.
//! Blits look every source pixel up in the draw palette: entries with the
//! transparency bit are skipped, the rest are drawn as a solid colour.

use crate::draw_state::{default_draw_palette, default_screen_palette, ColorBits, TRANSPARENT_BIT};
use crate::gfx::{console_coord, visible_offsets};
use crate::memory::{Ram, FLAG_COUNT, MAP_HEIGHT, MAP_WIDTH, SHEET_SIZE};
use crate::vm::Vm;

impl Vm {
    /// Blit one sheet pixel to screen space through the draw palette.
    #[inline]
    fn blit_pixel(&mut self, sheet_x: i32, sheet_y: i32, x: i32, y: i32) {
        let col = self.sget(sheet_x, sheet_y);
        let entry = self.ram.draw_state.draw_entry(col);
        if entry & TRANSPARENT_BIT == 0 {
            self.set_pixel(x, y, ColorBits::solid(entry));
        }
    }

    /// Draw sprite `n` at (x, y). `w` and `h` are in cells and may be
    /// fractional; the pixel size is truncated from `w * 8`.
    #[allow(clippy::too_many_arguments)]
    pub fn spr(
        &mut self,
        n: i32,
        x: i32,
        y: i32,
        w: Option<f64>,
        h: Option<f64>,
        flip_x: bool,
        flip_y: bool,
    ) {
        let (x, y) = self.to_screen(x, y);
        let w8 = console_coord(w.map_or(8, |w| (w * 8.0) as i32));
        let h8 = console_coord(h.map_or(8, |h| (h * 8.0) as i32));
        let (sheet_x, sheet_y) = (n % 16 * 8, n / 16 * 8);
        let clip = self.ram.draw_state.clip;

        for j in visible_offsets(y, h8, clip.y1 as i32, clip.y2 as i32) {
            for i in visible_offsets(x, w8, clip.x1 as i32, clip.x2 as i32) {
                let di = if flip_x { w8 - 1 - i } else { i };
                let dj = if flip_y { h8 - 1 - j } else { j };
                self.blit_pixel(sheet_x + di, sheet_y + dj, x + i, y + j);
            }
        }
    }

    /// Stretch the sheet rectangle (sx, sy, sw, sh) onto (dx, dy, dw, dh)
    /// with nearest-neighbour sampling. `dw`/`dh` default to `sw`/`sh`.
    #[allow(clippy::too_many_arguments)]
    pub fn sspr(
        &mut self,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        dx: i32,
        dy: i32,
        dw: Option<i32>,
        dh: Option<i32>,
        flip_x: bool,
        flip_y: bool,
    ) {
        let (dx, dy) = self.to_screen(dx, dy);
        let dw = console_coord(dw.unwrap_or(sw));
        let dh = console_coord(dh.unwrap_or(sh));
        let clip = self.ram.draw_state.clip;

        for j in visible_offsets(dy, dh, clip.y1 as i32, clip.y2 as i32) {
            for i in visible_offsets(dx, dw, clip.x1 as i32, clip.x2 as i32) {
                let di = if flip_x { dw - 1 - i } else { i };
                let dj = if flip_y { dh - 1 - j } else { j };
                self.blit_pixel(
                    scale_source(sx, sw, di, dw),
                    scale_source(sy, sh, dj, dh),
                    dx + i,
                    dy + j,
                );
            }
        }
    }

    /// Draw a region of the tile map. The size defaults to 128x32 cells.
    ///
    /// Cells outside the map and cells holding sprite 0 are skipped. A
    /// non-zero `layer` also skips sprites whose flags share no bit with it.
    #[allow(clippy::too_many_arguments)]
    pub fn map(
        &mut self,
        cel_x: i32,
        cel_y: i32,
        sx: i32,
        sy: i32,
        cel_w: Option<i32>,
        cel_h: Option<i32>,
        layer: u8,
    ) {
        let (sx, sy) = self.to_screen(sx, sy);
        let cel_w = cel_w.unwrap_or(128);
        let cel_h = cel_h.unwrap_or(32);

        for cy in visible_offsets(cel_y, cel_h, 0, MAP_HEIGHT as i32) {
            for cx in visible_offsets(cel_x, cel_w, 0, MAP_WIDTH as i32) {
                let Some(index) = Ram::map_index(cel_x + cx, cel_y + cy) else {
                    continue;
                };
                let sprite = self.ram.map[index];
                if sprite == 0 {
                    continue;
                }
                if layer != 0 && self.ram.flags[sprite as usize] & layer == 0 {
                    continue;
                }

                let sheet_x = sprite as i32 % 16 * 8;
                let sheet_y = sprite as i32 / 16 * 8;
                for py in 0..8 {
                    for px in 0..8 {
                        self.blit_pixel(
                            sheet_x + px,
                            sheet_y + py,
                            sx + cx * 8 + px,
                            sy + cy * 8 + py,
                        );
                    }
                }
            }
        }
    }

    pub fn mget(&self, x: i32, y: i32) -> u8 {
        Ram::map_index(x, y).map_or(0, |i| self.ram.map[i])
    }

    pub fn mset(&mut self, x: i32, y: i32, n: u8) {
        if let Some(i) = Ram::map_index(x, y) {
            self.ram.map[i] = n;
        }
    }

    /// Sprite sheet pixel; 0 outside the sheet.
    pub fn sget(&self, x: i32, y: i32) -> u8 {
        if !sheet_contains(x, y) {
            return 0;
        }
        self.ram.gfx.get(x as usize, y as usize)
    }

    /// Write a sheet pixel through the draw palette. `c` defaults to the pen.
    pub fn sset(&mut self, x: i32, y: i32, c: Option<u8>) {
        if !sheet_contains(x, y) {
            return;
        }
        let ds = &self.ram.draw_state;
        let col = ds.draw_entry(c.unwrap_or(ds.pen));
        self.ram.gfx.set(x as usize, y as usize, col);
    }

    pub fn fget(&self, n: i32) -> u8 {
        flag_index(n).map_or(0, |i| self.ram.flags[i])
    }

    /// Single flag bit. Bits outside 0..=7 read as false.
    pub fn fget_bit(&self, n: i32, bit: i32) -> bool {
        match (flag_index(n), flag_bit(bit)) {
            (Some(i), Some(mask)) => self.ram.flags[i] & mask != 0,
            _ => false,
        }
    }

    pub fn fset(&mut self, n: i32, value: u8) {
        if let Some(i) = flag_index(n) {
            self.ram.flags[i] = value;
        }
    }

    /// Set or clear one flag bit. Bits outside 0..=7 are ignored.
    pub fn fset_bit(&mut self, n: i32, bit: i32, on: bool) {
        if let (Some(i), Some(mask)) = (flag_index(n), flag_bit(bit)) {
            if on {
                self.ram.flags[i] |= mask;
            } else {
                self.ram.flags[i] &= !mask;
            }
        }
    }

    /// Remap a palette entry, returning its previous value.
    ///
    /// Page 0 is the draw palette and keeps the entry's transparency bit;
    /// page 1 is the screen palette and takes `c1` as is. With either colour
    /// missing both palettes and the fill pattern are reset.
    pub fn pal(&mut self, c0: Option<u8>, c1: Option<u8>, page: u8) -> Option<u8> {
        let ds = &mut self.ram.draw_state;

        let (Some(c0), Some(c1)) = (c0, c1) else {
            ds.draw_palette = default_draw_palette();
            ds.screen_palette = default_screen_palette();
            ds.fill_pattern = 0;
            ds.fill_transparent = false;
            return None;
        };

        let index = (c0 & 0x0F) as usize;
        if page & 1 == 1 {
            Some(std::mem::replace(&mut ds.screen_palette[index], c1))
        } else {
            let entry = &mut ds.draw_palette[index];
            let prev = *entry;
            *entry = (prev & TRANSPARENT_BIT) | (c1 & 0x0F);
            Some(prev)
        }
    }

    /// Transparency control.
    ///
    /// - `palt(None, _)` resets transparency so only colour 0 is transparent
    /// - `palt(Some(c), None)` reads the flag for `c`
    /// - `palt(Some(c), Some(t))` sets it and returns the previous flag
    pub fn palt(&mut self, c: Option<u8>, t: Option<bool>) -> Option<bool> {
        let ds = &mut self.ram.draw_state;

        let Some(c) = c else {
            for (i, entry) in ds.draw_palette.iter_mut().enumerate() {
                *entry = (*entry & 0x0F) | if i == 0 { TRANSPARENT_BIT } else { 0 };
            }
            return None;
        };

        let entry = &mut ds.draw_palette[(c & 0x0F) as usize];
        let prev = *entry & TRANSPARENT_BIT != 0;
        if let Some(t) = t {
            *entry = (*entry & 0x0F) | if t { TRANSPARENT_BIT } else { 0 };
        }
        Some(prev)
    }
}

/// Source coordinate for step `step` of `steps` across `size` sheet pixels.
/// Results that leave the `i32` range saturate and so read as off-sheet.
#[inline]
fn scale_source(base: i32, size: i32, step: i32, steps: i32) -> i32 {
    let pos = base as i64 + size as i64 * step as i64 / steps as i64;
    pos.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[inline]
fn sheet_contains(x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && x < SHEET_SIZE as i32 && y < SHEET_SIZE as i32
}

#[inline]
fn flag_index(n: i32) -> Option<usize> {
    usize::try_from(n).ok().filter(|&n| n < FLAG_COUNT)
}

#[inline]
fn flag_bit(bit: i32) -> Option<u8> {
    (0..8).contains(&bit).then(|| 1u8 << bit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw_state::ColorArg;

    fn sheet_with_sprite_one(vm: &mut Vm) {
        // Sprite 1: left column colour 8, rest colour 0.
        for y in 0..8 {
            vm.sset(8, y, Some(8));
        }
    }

    #[test]
    fn test_spr_skips_transparent() {
        let mut vm = Vm::new();
        vm.cls(3);
        sheet_with_sprite_one(&mut vm);
        vm.spr(1, 20, 20, None, None, false, false);
        assert_eq!(vm.pget(20, 20), 8);
        assert_eq!(vm.pget(21, 20), 3);
    }

    #[test]
    fn test_spr_flip_x() {
        let mut vm = Vm::new();
        sheet_with_sprite_one(&mut vm);
        vm.spr(1, 0, 0, None, None, true, false);
        assert_eq!(vm.pget(7, 3), 8);
        assert_eq!(vm.pget(0, 3), 0);
    }

    #[test]
    fn test_spr_fractional_size() {
        let mut vm = Vm::new();
        for y in 0..8 {
            for x in 0..8 {
                vm.sset(x, y, Some(5));
            }
        }
        vm.spr(0, 0, 0, Some(0.5), Some(0.25), false, false);
        let count = (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .filter(|&(x, y)| vm.pget(x, y) == 5)
            .count();
        assert_eq!(count, 4 * 2);
    }

    #[test]
    fn test_sspr_scales_up() {
        let mut vm = Vm::new();
        vm.sset(0, 0, Some(9));
        vm.sspr(0, 0, 1, 1, 10, 10, Some(3), Some(3), false, false);
        assert!((10..13).all(|x| (10..13).all(|y| vm.pget(x, y) == 9)));
        assert_eq!(vm.pget(13, 10), 0);
    }

    #[test]
    fn test_map_layers_and_empty_cells() {
        let mut vm = Vm::new();
        sheet_with_sprite_one(&mut vm);
        vm.mset(0, 0, 1);
        vm.mset(1, 0, 0);
        vm.fset(1, 0b0000_0010);

        vm.map(0, 0, 0, 0, Some(2), Some(1), 0b0000_0001);
        assert_eq!(vm.pget(0, 0), 0);

        vm.map(0, 0, 0, 0, Some(2), Some(1), 0b0000_0010);
        assert_eq!(vm.pget(0, 0), 8);
        assert_eq!(vm.pget(8, 0), 0);
    }

    #[test]
    fn test_mget_mset_bounds() {
        let mut vm = Vm::new();
        vm.mset(127, 63, 42);
        vm.mset(128, 0, 1);
        vm.mset(0, 64, 1);
        assert_eq!(vm.mget(127, 63), 42);
        assert_eq!(vm.mget(128, 0), 0);
        assert_eq!(vm.mget(-1, 0), 0);
        assert!(vm.ram.map.iter().filter(|&&c| c != 0).count() == 1);
    }

    #[test]
    fn test_sset_applies_draw_palette() {
        let mut vm = Vm::new();
        vm.pal(Some(4), Some(12), 0);
        vm.sset(3, 3, Some(4));
        assert_eq!(vm.sget(3, 3), 12);
        vm.color(4);
        vm.sset(2, 2, None);
        assert_eq!(vm.sget(2, 2), 12);
        assert_eq!(vm.sget(128, 0), 0);
    }

    #[test]
    fn test_flag_bits() {
        let mut vm = Vm::new();
        vm.fset_bit(10, 3, true);
        assert_eq!(vm.fget(10), 0b1000);
        assert!(vm.fget_bit(10, 3));
        vm.fset_bit(10, 3, false);
        assert_eq!(vm.fget(10), 0);

        vm.fset_bit(10, 8, true);
        vm.fset_bit(10, -1, true);
        assert_eq!(vm.fget(10), 0);
        assert!(!vm.fget_bit(10, 9));
        vm.fset(256, 1);
        assert_eq!(vm.fget(256), 0);
    }

    #[test]
    fn test_pal_pages() {
        let mut vm = Vm::new();
        assert_eq!(vm.pal(Some(0), Some(5), 0), Some(TRANSPARENT_BIT));
        assert_eq!(vm.ram.draw_state.draw_palette[0], TRANSPARENT_BIT | 5);

        assert_eq!(vm.pal(Some(1), Some(0x81), 1), Some(1));
        assert_eq!(vm.ram.draw_state.screen_palette[1], 0x81);
    }

    #[test]
    fn test_pal_reset_clears_fill_pattern() {
        let mut vm = Vm::new();
        vm.pal(Some(2), Some(3), 0);
        vm.fillp(0xFFFF, true);
        assert_eq!(vm.pal(None, None, 0), None);
        assert_eq!(vm.ram.draw_state.draw_palette, default_draw_palette());
        assert_eq!(vm.ram.draw_state.fill_pattern, 0);
        assert!(!vm.ram.draw_state.fill_transparent);
    }

    #[test]
    fn test_palt_read_set_reset() {
        let mut vm = Vm::new();
        assert_eq!(vm.palt(Some(0), None), Some(true));
        assert_eq!(vm.palt(Some(5), Some(true)), Some(false));
        assert_eq!(vm.palt(Some(5), None), Some(true));
        assert_eq!(vm.palt(Some(0), Some(false)), Some(true));

        assert_eq!(vm.palt(None, None), None);
        assert_eq!(vm.palt(Some(0), None), Some(true));
        assert_eq!(vm.palt(Some(5), None), Some(false));
    }

    #[test]
    fn test_pset_with_pattern_colour() {
        let mut vm = Vm::new();
        vm.set_fill_pattern_mode(true);
        vm.rectfill(0, 0, 3, 0, Some(ColorArg::with_pattern(0x27, 0b0101, false)));
        assert_eq!(vm.pget(0, 0), 2);
        assert_eq!(vm.pget(1, 0), 7);
        assert_eq!(vm.pget(2, 0), 2);
    }
}
