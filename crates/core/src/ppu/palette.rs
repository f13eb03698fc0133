//! Indexed palettes for converting colour indices to display colours.
//!
//! Indexed video hardware stores small colour indices in its framebuffer and
//! resolves them to RGB only when the picture leaves the machine. This module
//! provides the trait systems use for that last step plus a fixed-size table.

/// Maps colour indices to 32-bit ARGB colours (0xAARRGGBB).
pub trait IndexedPalette {
    /// Get the ARGB colour for a palette index.
    fn get_color(&self, index: usize) -> u32;

    /// Set the ARGB colour for a palette index.
    fn set_color(&mut self, index: usize, color: u32);

    /// Get the number of colours in this palette.
    fn len(&self) -> usize;

    /// Check if the palette is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Opaque black, returned for indices outside the table.
pub const OPAQUE_BLACK: u32 = 0xFF000000;

/// A palette with a compile-time number of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPalette<const N: usize> {
    colors: [u32; N],
}

impl<const N: usize> FixedPalette<N> {
    pub const fn new(colors: [u32; N]) -> Self {
        Self { colors }
    }

    /// Build from RGB values, forcing the alpha channel to opaque.
    pub fn from_rgb(rgb: [u32; N]) -> Self {
        Self {
            colors: rgb.map(|c| OPAQUE_BLACK | (c & 0x00FF_FFFF)),
        }
    }

    pub fn colors(&self) -> &[u32; N] {
        &self.colors
    }
}

impl<const N: usize> Default for FixedPalette<N> {
    fn default() -> Self {
        Self::new([OPAQUE_BLACK; N])
    }
}

impl<const N: usize> IndexedPalette for FixedPalette<N> {
    fn get_color(&self, index: usize) -> u32 {
        self.colors.get(index).copied().unwrap_or(OPAQUE_BLACK)
    }

    fn set_color(&mut self, index: usize, color: u32) {
        if let Some(slot) = self.colors.get_mut(index) {
            *slot = color;
        }
    }

    fn len(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_is_black() {
        let palette = FixedPalette::<16>::default();
        assert_eq!(palette.len(), 16);
        assert!(!palette.is_empty());
        assert!((0..16).all(|i| palette.get_color(i) == OPAQUE_BLACK));
    }

    #[test]
    fn test_from_rgb_forces_alpha() {
        let palette = FixedPalette::from_rgb([0x1D2B53, 0x00FF004D]);
        assert_eq!(palette.get_color(0), 0xFF1D2B53);
        assert_eq!(palette.get_color(1), 0xFFFF004D);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut palette = FixedPalette::new([0xFFFFFFFF; 4]);
        assert_eq!(palette.get_color(10), OPAQUE_BLACK);
        palette.set_color(10, 0xFFFF0000);
        palette.set_color(3, 0xFF00FF00);
        assert_eq!(palette.get_color(3), 0xFF00FF00);
    }
}
