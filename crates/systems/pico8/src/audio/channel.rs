//! One audio channel: plays a single sfx sample by sample.

use serde::{Deserialize, Serialize};

use super::effect::{key_to_freq, EffectContext};
use super::sfx::{Sfx, NOTES_PER_SFX};

pub const SAMPLE_RATE: u32 = 22050;
/// Samples per note at speed 1.
const SAMPLES_PER_SPEED_UNIT: f32 = 183.0;
/// Key assumed before the first note, for slides.
const DEFAULT_PREV_KEY: u8 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioChannel {
    /// Sfx being played, `None` while idle.
    pub sfx: Option<u8>,
    /// Position in notes, `0.0..32.0` while playing.
    pub offset: f32,
    /// Oscillator phase; carried across notes.
    pub phase: f32,
    pub can_loop: bool,
    pub prev_key: u8,
    pub prev_volume: f32,
}

impl Default for AudioChannel {
    fn default() -> Self {
        Self {
            sfx: None,
            offset: 0.0,
            phase: 0.0,
            can_loop: true,
            prev_key: DEFAULT_PREV_KEY,
            prev_volume: 0.0,
        }
    }
}

impl AudioChannel {
    pub fn is_playing(&self) -> bool {
        self.sfx.is_some()
    }

    /// Start `sfx` at note `offset`.
    pub fn start(&mut self, sfx: u8, offset: f32) {
        *self = Self {
            sfx: Some(sfx),
            offset: offset.max(0.0),
            ..Self::default()
        };
    }

    pub fn stop(&mut self) {
        self.sfx = None;
    }

    /// Produce the next sample and advance playback.
    ///
    /// `table` holds the sfx definitions; `distort` applies the bitcrush
    /// hardware effect.
    pub fn next_sample(&mut self, table: &[Sfx], distort: bool) -> i16 {
        let Some(sfx) = self.sfx.and_then(|id| table.get(id as usize)) else {
            self.sfx = None;
            return 0;
        };

        let speed = sfx.effective_speed();
        let offset_per_second = SAMPLE_RATE as f32 / (SAMPLES_PER_SPEED_UNIT * speed as f32);
        let offset_per_sample = offset_per_second / SAMPLE_RATE as f32;

        let offset = self.offset;
        let mut next_offset = offset + offset_per_sample;
        let loop_start = sfx.loop_start as f32;
        let loop_end = sfx.loop_end as f32;
        if self.can_loop && sfx.loops() && next_offset >= loop_end {
            next_offset = (next_offset - loop_start) % (loop_end - loop_start) + loop_start;
        }

        let note_index = offset as usize;
        if note_index >= NOTES_PER_SFX {
            self.sfx = None;
            return 0;
        }
        let note = sfx.notes[note_index];
        let volume = note.volume();

        let mut sample = 0;
        if volume != 0.0 {
            let ctx = EffectContext {
                offset,
                offset_per_second,
                speed,
                note_index,
                prev_key: self.prev_key,
                prev_volume: self.prev_volume,
            };
            let base_freq = key_to_freq(note.key() as f32);
            let (freq, volume) = note.effect().apply(&ctx, &sfx.notes, base_freq, volume);

            let wave = note.instrument().sample(self.phase);
            // Float to int casts saturate.
            sample = (32767.99 * volume * wave) as i16;
            if distort {
                sample = bitcrush(sample);
            }

            self.phase += freq / SAMPLE_RATE as f32;
        }

        self.offset = next_offset;
        if next_offset >= NOTES_PER_SFX as f32 {
            self.sfx = None;
        } else if next_offset as usize != note_index {
            self.prev_key = note.key();
            self.prev_volume = note.volume();
        }

        sample
    }
}

/// Requantise to 16 levels.
#[inline]
fn bitcrush(sample: i16) -> i16 {
    let crushed = sample as i32 / 0x1000 * 0x1249;
    crushed.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sfx::Note;

    fn one_note_sfx(volume: u8) -> Vec<Sfx> {
        let mut sfx = Sfx::default();
        sfx.speed = 1;
        for note in sfx.notes.iter_mut() {
            *note = Note::new(33, 3, volume, 0);
        }
        vec![sfx]
    }

    #[test]
    fn test_idle_channel_is_silent() {
        let mut ch = AudioChannel::default();
        assert_eq!(ch.next_sample(&one_note_sfx(7), false), 0);
        assert!(!ch.is_playing());
    }

    #[test]
    fn test_square_first_sample() {
        let table = one_note_sfx(7);
        let mut ch = AudioChannel::default();
        ch.start(0, 0.0);
        // Square wave at phase 0 is +0.25.
        assert_eq!(ch.next_sample(&table, false), (32767.99f32 * 0.25) as i16);
        assert!(ch.phase > 0.0);
    }

    #[test]
    fn test_zero_volume_keeps_phase() {
        let table = one_note_sfx(0);
        let mut ch = AudioChannel::default();
        ch.start(0, 0.0);
        for _ in 0..100 {
            assert_eq!(ch.next_sample(&table, false), 0);
        }
        assert_eq!(ch.phase, 0.0);
        assert!(ch.offset > 0.0);
    }

    #[test]
    fn test_channel_goes_idle_at_end() {
        let table = one_note_sfx(7);
        let mut ch = AudioChannel::default();
        ch.start(0, 31.0);
        let mut samples = 0;
        while ch.is_playing() {
            assert!(ch.offset >= 0.0 && ch.offset < 32.0);
            ch.next_sample(&table, false);
            samples += 1;
        }
        assert!((182..=184).contains(&samples), "{} samples", samples);
        assert!(ch.offset >= 32.0);
    }

    #[test]
    fn test_loop_wraps_offset() {
        let mut table = one_note_sfx(7);
        table[0].loop_start = 2;
        table[0].loop_end = 4;
        let mut ch = AudioChannel::default();
        ch.start(0, 3.99);
        for _ in 0..10 {
            ch.next_sample(&table, false);
        }
        assert!(ch.offset >= 2.0 && ch.offset < 2.1, "offset {}", ch.offset);

        ch.can_loop = false;
        ch.offset = 3.999;
        ch.next_sample(&table, false);
        assert!(ch.offset >= 4.0);
    }

    #[test]
    fn test_prev_note_snapshot_on_note_change() {
        let mut table = one_note_sfx(7);
        table[0].notes[0] = Note::new(40, 0, 3, 0);
        let mut ch = AudioChannel::default();
        ch.start(0, 0.999);
        ch.next_sample(&table, false);
        ch.next_sample(&table, false);
        assert_eq!(ch.prev_key, 40);
        assert!((ch.prev_volume - 3.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_bitcrush_quantises() {
        assert_eq!(bitcrush(0x0FFF), 0);
        assert_eq!(bitcrush(0x2000), 2 * 0x1249);
        assert_eq!(bitcrush(i16::MAX), 7 * 0x1249);
        assert_eq!(bitcrush(i16::MIN), i16::MIN);
        assert_eq!(bitcrush(-0x1000), -0x1249);
    }

    #[test]
    fn test_unknown_sfx_goes_idle() {
        let mut ch = AudioChannel::default();
        ch.start(9, 0.0);
        assert_eq!(ch.next_sample(&one_note_sfx(7), false), 0);
        assert!(!ch.is_playing());
    }
}
