//! Packed 4bpp indexed surfaces.
//!
//! Two pixels share one byte: the pixel at an even x lives in the low nibble
//! and the pixel at the following odd x in the high nibble. Rows are stored
//! top to bottom with no padding, so the raw bytes can be handed to a display
//! or memory-mapped collaborator unchanged.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("expected {expected} bytes of packed pixel data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// A `width` x `height` grid of 4-bit colour indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedSurface {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PackedSurface {
    /// A zero-filled surface. `width` must be even.
    pub fn new(width: usize, height: usize) -> Self {
        debug_assert!(width % 2 == 0, "packed surfaces need an even width");
        Self {
            width,
            height,
            data: vec![0; width / 2 * height],
        }
    }

    /// Wrap existing packed bytes.
    pub fn from_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self, SurfaceError> {
        let expected = width / 2 * height;
        if bytes.len() != expected {
            return Err(SurfaceError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data: bytes.to_vec(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row.
    pub fn pitch(&self) -> usize {
        self.width / 2
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Replace the contents with `bytes`; a length mismatch leaves the
    /// surface untouched.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), SurfaceError> {
        if bytes.len() != self.data.len() {
            return Err(SurfaceError::SizeMismatch {
                expected: self.data.len(),
                actual: bytes.len(),
            });
        }
        self.data.copy_from_slice(bytes);
        Ok(())
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Colour index at (x, y); 0 outside the surface.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if !self.in_bounds(x, y) {
            return 0;
        }
        let byte = self.data[y * self.pitch() + x / 2];
        if x & 1 == 0 {
            byte & 0x0F
        } else {
            byte >> 4
        }
    }

    /// Store the low nibble of `color` at (x, y); ignored outside the surface.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: u8) {
        if !self.in_bounds(x, y) {
            return;
        }
        let index = y * self.pitch() + x / 2;
        let byte = &mut self.data[index];
        let color = color & 0x0F;
        *byte = if x & 1 == 0 {
            (*byte & 0xF0) | color
        } else {
            (*byte & 0x0F) | (color << 4)
        };
    }

    /// Fill every pixel with `color`.
    pub fn fill(&mut self, color: u8) {
        self.data.fill((color & 0x0F) * 0x11);
    }

    /// Fill the inclusive span `x1..=x2` of row `y`.
    ///
    /// Edge pixels that share a byte with their neighbour are merged nibble by
    /// nibble; the interior is written a whole byte at a time.
    pub fn fill_span(&mut self, x1: usize, x2: usize, y: usize, color: u8) {
        if x1 > x2 || x2 >= self.width || y >= self.height {
            return;
        }
        let color = color & 0x0F;
        let pitch = self.pitch();
        let row = &mut self.data[y * pitch..(y + 1) * pitch];

        let mut lo = x1;
        let mut hi = x2 + 1; // exclusive
        if lo & 1 == 1 {
            row[lo / 2] = (row[lo / 2] & 0x0F) | (color << 4);
            lo += 1;
        }
        if hi & 1 == 1 && hi > lo {
            let last = hi - 1;
            row[last / 2] = (row[last / 2] & 0xF0) | color;
            hi -= 1;
        }
        if hi > lo {
            row[lo / 2..hi / 2].fill(color * 0x11);
        }
    }

    /// Shift the image up by `rows`, clearing the rows uncovered at the bottom.
    pub fn scroll_up(&mut self, rows: usize) {
        let shift = (rows * self.pitch()).min(self.data.len());
        let len = self.data.len();
        self.data.copy_within(shift.., 0);
        self.data[len - shift..].fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nibble_layout() {
        let mut s = PackedSurface::new(4, 2);
        s.set(0, 0, 0x3);
        s.set(1, 0, 0xA);
        s.set(3, 1, 0x7);
        assert_eq!(s.bytes(), &[0xA3, 0x00, 0x00, 0x70]);
        assert_eq!(s.get(1, 0), 0xA);
        assert_eq!(s.get(2, 1), 0);
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut s = PackedSurface::new(4, 4);
        s.set(4, 0, 5);
        s.set(0, 4, 5);
        assert!(s.bytes().iter().all(|&b| b == 0));
        assert_eq!(s.get(100, 100), 0);
    }

    #[test]
    fn test_set_masks_high_bits() {
        let mut s = PackedSurface::new(2, 1);
        s.set(0, 0, 0x1F);
        assert_eq!(s.get(0, 0), 0xF);
        assert_eq!(s.get(1, 0), 0);
    }

    #[test]
    fn test_fill_span_matches_per_pixel_writes() {
        for x1 in 0..8 {
            for x2 in x1..8 {
                let mut fast = PackedSurface::new(8, 1);
                let mut slow = PackedSurface::new(8, 1);
                fast.fill(0x5);
                slow.fill(0x5);
                fast.fill_span(x1, x2, 0, 0xC);
                for x in x1..=x2 {
                    slow.set(x, 0, 0xC);
                }
                assert_eq!(fast, slow, "span {}..={}", x1, x2);
            }
        }
    }

    #[test]
    fn test_scroll_up_clears_bottom() {
        let mut s = PackedSurface::new(2, 3);
        s.set(0, 0, 1);
        s.set(0, 1, 2);
        s.set(0, 2, 3);
        s.scroll_up(1);
        assert_eq!(s.get(0, 0), 2);
        assert_eq!(s.get(0, 1), 3);
        assert_eq!(s.get(0, 2), 0);
    }

    #[test]
    fn test_from_bytes_checks_size() {
        assert!(PackedSurface::from_bytes(4, 4, &[0; 8]).is_ok());
        assert_eq!(
            PackedSurface::from_bytes(4, 4, &[0; 7]),
            Err(SurfaceError::SizeMismatch {
                expected: 8,
                actual: 7
            })
        );
    }
}
