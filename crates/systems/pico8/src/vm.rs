//! The console context: RAM, font, audio and cart data.
//!
//! Drawing entry points live next to their subsystem (`gfx`, `sprite`,
//! `text`) as `impl Vm` blocks; this module holds the state and the
//! collaborator-facing accessors.

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::ppu::{PackedSurface, SurfaceError};

use crate::audio::{AudioEngine, ChannelStream};
use crate::cartdata::CartData;
use crate::draw_state::DrawState;
use crate::memory::Ram;
use crate::text::{BiosFont, FontSource};

pub struct Vm {
    pub(crate) ram: Ram,
    pub(crate) font: Box<dyn FontSource>,
    audio: AudioEngine,
    cartdata: CartData,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// A powered-on console with a blank font.
    pub fn new() -> Self {
        Self::with_font(Box::new(BiosFont::blank()))
    }

    pub fn with_font(font: Box<dyn FontSource>) -> Self {
        Self {
            ram: Ram::new(),
            font,
            audio: AudioEngine::new(),
            cartdata: CartData::default(),
        }
    }

    pub fn set_font(&mut self, font: Box<dyn FontSource>) {
        self.font = font;
    }

    /// Clear RAM and silence audio. The font stays mounted.
    pub fn reset(&mut self) {
        self.ram.reset();
        self.audio.reset();
        self.cartdata = CartData::default();
        log(LogCategory::System, LogLevel::Debug, || {
            "console reset".to_string()
        });
    }

    /// The packed framebuffer, 8192 bytes, even x in the low nibble.
    pub fn screen_bytes(&self) -> &[u8] {
        self.ram.screen.bytes()
    }

    pub fn screen(&self) -> &PackedSurface {
        &self.ram.screen
    }

    pub fn draw_state(&self) -> &DrawState {
        &self.ram.draw_state
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn sfx(&mut self, id: i32, channel: Option<i32>, offset: i32) {
        self.audio.sfx(id, channel, offset);
    }

    pub fn music(&mut self, pattern: i32, fade_ms: i32, mask: i32) {
        self.audio.music(pattern, fade_ms, mask);
    }

    pub fn set_distortion(&mut self, ch: usize, on: bool) {
        self.audio.set_distortion(ch, on);
    }

    pub fn render_channel(&self, ch: usize, out: &mut [i16]) {
        self.audio.render_channel(ch, out);
    }

    pub fn audio_stream(&self, ch: usize) -> ChannelStream {
        self.audio.stream(ch)
    }

    /// See [`CartData::cartdata`].
    pub fn cartdata(&mut self, id: Option<&str>) -> Option<bool> {
        self.cartdata.cartdata(id)
    }

    pub fn load_sprite_sheet(&mut self, bytes: &[u8]) -> Result<(), SurfaceError> {
        self.ram.load_sprite_sheet(bytes)
    }

    pub fn load_map(&mut self, bytes: &[u8]) {
        self.ram.load_map(bytes);
    }

    pub fn load_flags(&mut self, bytes: &[u8]) {
        self.ram.load_flags(bytes);
    }
}
