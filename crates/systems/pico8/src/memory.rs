//! Console RAM: screen, sprite sheet, tile map, sprite flags and draw state.

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::ppu::{PackedSurface, SurfaceError};

use crate::draw_state::DrawState;

pub const SCREEN_SIZE: usize = 128;
pub const SHEET_SIZE: usize = 128;
pub const MAP_WIDTH: usize = 128;
pub const MAP_HEIGHT: usize = 64;
pub const FLAG_COUNT: usize = 256;

/// Bytes in a packed 128x128 surface.
pub const SURFACE_BYTES: usize = SCREEN_SIZE * SCREEN_SIZE / 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ram {
    pub screen: PackedSurface,
    pub gfx: PackedSurface,
    pub map: Vec<u8>,
    pub flags: Vec<u8>,
    pub draw_state: DrawState,
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl Ram {
    pub fn new() -> Self {
        Self {
            screen: PackedSurface::new(SCREEN_SIZE, SCREEN_SIZE),
            gfx: PackedSurface::new(SHEET_SIZE, SHEET_SIZE),
            map: vec![0; MAP_WIDTH * MAP_HEIGHT],
            flags: vec![0; FLAG_COUNT],
            draw_state: DrawState::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Map cell index, or `None` outside `[0,128) x [0,64)`.
    #[inline]
    pub fn map_index(x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= MAP_WIDTH as i32 || y >= MAP_HEIGHT as i32 {
            return None;
        }
        Some(y as usize * MAP_WIDTH + x as usize)
    }

    pub fn load_sprite_sheet(&mut self, bytes: &[u8]) -> Result<(), SurfaceError> {
        let result = self.gfx.load_bytes(bytes);
        if let Err(e) = &result {
            log(LogCategory::Memory, LogLevel::Warn, || {
                format!("sprite sheet rejected: {}", e)
            });
        }
        result
    }

    /// Copy up to `MAP_WIDTH * MAP_HEIGHT` bytes into the map.
    pub fn load_map(&mut self, bytes: &[u8]) {
        copy_region("map", &mut self.map, bytes);
    }

    /// Copy up to `FLAG_COUNT` bytes into the sprite flags.
    pub fn load_flags(&mut self, bytes: &[u8]) {
        copy_region("flags", &mut self.flags, bytes);
    }
}

/// Copy the prefix of `bytes` that fits into `dest`, reporting truncation.
fn copy_region(name: &str, dest: &mut [u8], bytes: &[u8]) {
    let len = bytes.len().min(dest.len());
    dest[..len].copy_from_slice(&bytes[..len]);

    if bytes.len() > dest.len() {
        log(LogCategory::Memory, LogLevel::Warn, || {
            format!(
                "{}: {} bytes given, {} dropped",
                name,
                bytes.len(),
                bytes.len() - dest.len()
            )
        });
    } else {
        log(LogCategory::Memory, LogLevel::Trace, || {
            format!("{}: loaded {} bytes", name, len)
        });
    }
}
