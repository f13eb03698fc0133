//! Per-note effects applied to frequency and volume each sample.

use serde::{Deserialize, Serialize};

use super::sfx::{Note, NOTES_PER_SFX};

/// Frequency ratio of one semitone.
#[allow(clippy::excessive_precision)]
const SEMITONE: f32 = 1.059_463_094_359;
/// Vibrato and arpeggio rate, in cycles per note.
const NOTE_RATE: f32 = 7.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NoteEffect {
    None = 0,
    Slide = 1,
    Vibrato = 2,
    Drop = 3,
    FadeIn = 4,
    FadeOut = 5,
    ArpeggioFast = 6,
    ArpeggioSlow = 7,
}

/// What an effect may look at besides the note itself.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext {
    /// Playback position in notes.
    pub offset: f32,
    /// Notes played per second at the sfx's speed.
    pub offset_per_second: f32,
    pub speed: u32,
    pub note_index: usize,
    pub prev_key: u8,
    pub prev_volume: f32,
}

impl NoteEffect {
    pub fn from_index(index: u8) -> Self {
        match index & 0x7 {
            0 => NoteEffect::None,
            1 => NoteEffect::Slide,
            2 => NoteEffect::Vibrato,
            3 => NoteEffect::Drop,
            4 => NoteEffect::FadeIn,
            5 => NoteEffect::FadeOut,
            6 => NoteEffect::ArpeggioFast,
            _ => NoteEffect::ArpeggioSlow,
        }
    }

    /// Transform `(freq, volume)` for the current sample.
    pub fn apply(
        self,
        ctx: &EffectContext,
        notes: &[Note; NOTES_PER_SFX],
        freq: f32,
        volume: f32,
    ) -> (f32, f32) {
        let t = ctx.offset.fract();

        match self {
            NoteEffect::None => (freq, volume),
            NoteEffect::Slide => {
                // Slides run from the previous note towards this one.
                let freq = mix(key_to_freq(ctx.prev_key as f32), freq, t);
                let volume = if ctx.prev_volume > 0.0 {
                    mix(ctx.prev_volume, volume, t)
                } else {
                    volume
                };
                (freq, volume)
            }
            NoteEffect::Vibrato => {
                let k = ((NOTE_RATE * ctx.offset / ctx.offset_per_second).fract() - 0.5).abs() - 0.25;
                (mix(freq, freq * SEMITONE, k), volume)
            }
            NoteEffect::Drop => (freq * (1.0 - t), volume),
            NoteEffect::FadeIn => (freq, volume * t),
            NoteEffect::FadeOut => (freq, volume * (1.0 - t)),
            NoteEffect::ArpeggioFast | NoteEffect::ArpeggioSlow => {
                let base = if ctx.speed <= 8 { 32 } else { 16 };
                let group = if self == NoteEffect::ArpeggioFast { 4 } else { 8 };
                let m = base / group;
                let n = (m as f32 * NOTE_RATE * ctx.offset / ctx.offset_per_second) as usize;
                let arp_note = (ctx.note_index & !3) | (n & 3);
                (key_to_freq(notes[arp_note].key() as f32), volume)
            }
        }
    }
}

/// Frequency in Hz of a key; key 33 is A4 = 440 Hz.
pub fn key_to_freq(key: f32) -> f32 {
    440.0 * ((key - 33.0) / 12.0).exp2()
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
