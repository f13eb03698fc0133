//! Sound effect and music pattern data, in the console's RAM format.
//!
//! A note is two bytes:
//!
//! ```text
//! b0: IIKK_KKKK   key (0..63), instrument bits 0-1
//! b1: xEEE_VVVI   instrument bit 2, volume (0..7), effect (0..7)
//! ```
//!
//! An sfx is 32 notes followed by four bytes: editor mode, speed,
//! loop start and loop end.

use serde::{Deserialize, Serialize};

use super::effect::NoteEffect;
use super::waveform::Instrument;

pub const SFX_COUNT: usize = 64;
pub const NOTES_PER_SFX: usize = 32;
pub const SFX_BYTES: usize = NOTES_PER_SFX * 2 + 4;
pub const MUSIC_PATTERN_COUNT: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note([u8; 2]);

impl Note {
    pub fn new(key: u8, instrument: u8, volume: u8, effect: u8) -> Self {
        let b0 = (key & 0x3F) | ((instrument & 0x3) << 6);
        let b1 = ((instrument >> 2) & 0x1) | ((volume & 0x7) << 1) | ((effect & 0x7) << 4);
        Self([b0, b1])
    }

    pub fn from_bytes(b0: u8, b1: u8) -> Self {
        Self([b0, b1])
    }

    pub fn bytes(&self) -> [u8; 2] {
        self.0
    }

    pub fn key(&self) -> u8 {
        self.0[0] & 0x3F
    }

    pub fn instrument(&self) -> Instrument {
        Instrument::from_index(((self.0[1] << 2) & 0x4) | (self.0[0] >> 6))
    }

    /// Raw volume level, 0..=7.
    pub fn volume_level(&self) -> u8 {
        (self.0[1] >> 1) & 0x7
    }

    /// Volume normalised to 0.0..=1.0.
    pub fn volume(&self) -> f32 {
        self.volume_level() as f32 / 7.0
    }

    pub fn effect(&self) -> NoteEffect {
        NoteEffect::from_index((self.0[1] >> 4) & 0x7)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sfx {
    pub notes: [Note; NOTES_PER_SFX],
    /// Kept for round-tripping; playback ignores it.
    pub editor_mode: u8,
    pub speed: u8,
    pub loop_start: u8,
    pub loop_end: u8,
}

impl Default for Sfx {
    fn default() -> Self {
        Self {
            notes: [Note::default(); NOTES_PER_SFX],
            editor_mode: 0,
            speed: 0,
            loop_start: 0,
            loop_end: 0,
        }
    }
}

impl Sfx {
    pub fn from_bytes(bytes: &[u8; SFX_BYTES]) -> Self {
        let notes = std::array::from_fn(|i| Note::from_bytes(bytes[2 * i], bytes[2 * i + 1]));
        Self {
            notes,
            editor_mode: bytes[64],
            speed: bytes[65],
            loop_start: bytes[66],
            loop_end: bytes[67],
        }
    }

    pub fn to_bytes(&self) -> [u8; SFX_BYTES] {
        let mut bytes = [0; SFX_BYTES];
        for (i, note) in self.notes.iter().enumerate() {
            bytes[2 * i..2 * i + 2].copy_from_slice(&note.bytes());
        }
        bytes[64] = self.editor_mode;
        bytes[65] = self.speed;
        bytes[66] = self.loop_start;
        bytes[67] = self.loop_end;
        bytes
    }

    /// Playback speed; values below 1 act as 1.
    pub fn effective_speed(&self) -> u32 {
        (self.speed as u32).max(1)
    }

    /// Looping is off when `loop_start >= loop_end`.
    pub fn loops(&self) -> bool {
        self.loop_end > self.loop_start
    }
}

/// One music pattern: four channel slots, flags in the top bit of each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicPattern([u8; 4]);

impl MusicPattern {
    pub const LOOP_START: u8 = 0x1;
    pub const LOOP_END: u8 = 0x2;
    pub const STOP: u8 = 0x4;

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }

    /// Flag bits gathered from bit 7 of each slot, slot 0 first.
    pub fn flags(&self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .fold(0, |acc, (i, b)| acc | ((b >> 7) << i))
    }

    /// Sfx index for a channel slot, `None` for slots outside 0..4.
    pub fn sfx(&self, channel: usize) -> Option<u8> {
        self.0.get(channel).map(|b| b & 0x7F)
    }
}
