//! Display output: packed screen -> screen palette -> ARGB frame.
//!
//! Each screen palette entry selects one of 32 display colours: bit 7 picks
//! the extended bank, the low nibble the colour within it.
//!
//! ```text
//! screen nibble v -> screen_palette[v] = e -> colors[(e & 0x80 ? 16 : 0) + (e & 15)]
//! ```

use emu_core::ppu::{FixedPalette, IndexedPalette, PackedSurface};
use emu_core::renderer::Renderer;
use emu_core::types::Frame;

use crate::memory::SCREEN_SIZE;

pub type DisplayPalette = FixedPalette<32>;

/// Display colour index for a screen palette entry.
#[inline]
pub fn display_index(entry: u8) -> usize {
    let bank = if entry & 0x80 != 0 { 16 } else { 0 };
    bank + (entry & 0x0F) as usize
}

/// Software renderer producing the 128x128 ARGB frame.
pub struct DisplayRenderer {
    frame: Frame,
}

impl DisplayRenderer {
    pub fn new() -> Self {
        let mut renderer = Self {
            frame: Frame::new(SCREEN_SIZE as u32, SCREEN_SIZE as u32),
        };
        renderer.reset();
        renderer
    }

    /// Convert `screen` into the frame.
    pub fn render(
        &mut self,
        screen: &PackedSurface,
        screen_palette: &[u8; 16],
        colors: &DisplayPalette,
    ) {
        let lut: [u32; 16] =
            std::array::from_fn(|v| colors.get_color(display_index(screen_palette[v])));
        let width = self.frame.width as usize;

        for (y, row) in self.frame.pixels.chunks_exact_mut(width).enumerate() {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = lut[screen.get(x, y) as usize];
            }
        }
    }
}

impl Default for DisplayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for DisplayRenderer {
    fn get_frame(&self) -> &Frame {
        &self.frame
    }

    fn clear(&mut self, color: u32) {
        self.frame.pixels.fill(color);
    }

    fn reset(&mut self) {
        self.clear(0xFF000000);
    }

    fn name(&self) -> &str {
        "PICO-8 Software Renderer"
    }
}
