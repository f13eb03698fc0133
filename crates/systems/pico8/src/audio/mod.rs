//! Four-channel synthesizer.
//!
//! The emulation thread triggers sounds while the host audio callback pulls
//! samples. Both go through one [`parking_lot::Mutex`] around
//! [`AudioState`]: a trigger holds it for a single state change, a render
//! holds it for one buffer.
//!
//! ```text
//! Vm::sfx / Vm::music ─┐
//!                      ├─> Arc<Mutex<AudioState>> ─> ChannelStream (AudioChip)
//! Vm::set_distortion ──┘
//! ```

pub mod allocator;
pub mod channel;
pub mod effect;
pub mod sfx;
pub mod waveform;

use std::sync::Arc;

use emu_core::apu::AudioChip;
use emu_core::types::AudioSample;
use parking_lot::Mutex;

pub use allocator::{AudioState, MusicState, CHANNEL_COUNT};
pub use channel::{AudioChannel, SAMPLE_RATE};
pub use effect::NoteEffect;
pub use sfx::{MusicPattern, Note, Sfx, NOTES_PER_SFX, SFX_BYTES, SFX_COUNT};
pub use waveform::Instrument;

/// Cloneable handle to the shared audio state.
#[derive(Debug, Clone, Default)]
pub struct AudioEngine {
    state: Arc<Mutex<AudioState>>,
}

impl AudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`AudioState::sfx`].
    pub fn sfx(&self, id: i32, channel: Option<i32>, offset: i32) {
        self.state.lock().sfx(id, channel, offset);
    }

    /// See [`AudioState::music`].
    pub fn music(&self, pattern: i32, fade_ms: i32, mask: i32) {
        self.state.lock().music(pattern, fade_ms, mask);
    }

    /// Render the next `out.len()` samples of channel `ch`.
    pub fn render_channel(&self, ch: usize, out: &mut [i16]) {
        self.state.lock().render(ch, out);
    }

    /// A pull handle for channel `ch`, suitable for an audio thread.
    pub fn stream(&self, ch: usize) -> ChannelStream {
        ChannelStream {
            state: Arc::clone(&self.state),
            channel: ch,
        }
    }

    pub fn set_distortion(&self, ch: usize, on: bool) {
        self.state.lock().set_distortion(ch, on);
    }

    /// Replace sfx `id` from its 68-byte RAM image. Returns false when `id`
    /// is out of range.
    pub fn load_sfx(&self, id: usize, bytes: &[u8; SFX_BYTES]) -> bool {
        self.set_sfx(id, Sfx::from_bytes(bytes))
    }

    pub fn set_sfx(&self, id: usize, sfx: Sfx) -> bool {
        match self.state.lock().sfx.get_mut(id) {
            Some(slot) => {
                *slot = sfx;
                true
            }
            None => false,
        }
    }

    /// Edit sfx `id` in place under the lock.
    pub fn with_sfx_mut<R>(&self, id: usize, f: impl FnOnce(&mut Sfx) -> R) -> Option<R> {
        self.state.lock().sfx.get_mut(id).map(f)
    }

    pub fn sfx_def(&self, id: usize) -> Option<Sfx> {
        self.state.lock().sfx.get(id).copied()
    }

    /// Store pattern `index` of the music table. Returns false when out of
    /// range. The table is data for a sequencer; [`AudioEngine::music`]
    /// does not read it.
    pub fn set_music_pattern(&self, index: usize, pattern: MusicPattern) -> bool {
        match self.state.lock().patterns.get_mut(index) {
            Some(slot) => {
                *slot = pattern;
                true
            }
            None => false,
        }
    }

    pub fn music_pattern(&self, index: usize) -> Option<MusicPattern> {
        self.state.lock().patterns.get(index).copied()
    }

    /// Copy of channel `ch`'s playback state.
    pub fn channel(&self, ch: usize) -> Option<AudioChannel> {
        self.state.lock().channels.get(ch).copied()
    }

    pub fn music_state(&self) -> MusicState {
        self.state.lock().music
    }

    pub fn snapshot(&self) -> AudioState {
        self.state.lock().clone()
    }

    pub fn restore(&self, state: AudioState) {
        *self.state.lock() = state;
    }

    /// Stop everything and clear the sfx table.
    pub fn reset(&self) {
        *self.state.lock() = AudioState::default();
    }
}

/// One channel's output, pulled by the host audio callback.
#[derive(Debug, Clone)]
pub struct ChannelStream {
    state: Arc<Mutex<AudioState>>,
    channel: usize,
}

impl ChannelStream {
    pub fn channel(&self) -> usize {
        self.channel
    }
}

impl AudioChip for ChannelStream {
    fn generate(&mut self, out: &mut [AudioSample]) {
        self.state.lock().render(self.channel, out);
    }

    /// Silence this channel.
    fn reset(&mut self) {
        if let Some(channel) = self.state.lock().channels.get_mut(self.channel) {
            channel.stop();
        }
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone() -> Sfx {
        let mut sfx = Sfx::default();
        sfx.speed = 4;
        for note in sfx.notes.iter_mut() {
            *note = Note::new(33, 0, 5, 0);
        }
        sfx
    }

    #[test]
    fn test_stream_shares_state() {
        let engine = AudioEngine::new();
        assert!(engine.set_sfx(3, tone()));
        engine.sfx(3, None, 0);

        let mut stream = engine.stream(0);
        let samples = stream.generate_samples(256);
        assert!(samples.iter().any(|&s| s != 0));
        assert!(engine.channel(0).is_some_and(|c| c.offset > 0.0));

        stream.reset();
        assert!(!engine.channel(0).is_some_and(|c| c.is_playing()));
        assert_eq!(stream.sample_rate(), 22050);
    }

    #[test]
    fn test_stream_across_threads() {
        let engine = AudioEngine::new();
        engine.set_sfx(0, tone());
        engine.sfx(0, Some(2), 0);

        let mut stream = engine.stream(2);
        let handle = std::thread::spawn(move || stream.generate_samples(512));
        let samples = handle.join().expect("audio thread");
        assert_eq!(samples.len(), 512);
        assert!(samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn test_load_sfx_bounds() {
        let engine = AudioEngine::new();
        let bytes = tone().to_bytes();
        assert!(engine.load_sfx(63, &bytes));
        assert!(!engine.load_sfx(64, &bytes));
        assert_eq!(engine.sfx_def(63), Some(tone()));
        assert_eq!(engine.with_sfx_mut(63, |s| s.speed), Some(4));
        assert_eq!(engine.with_sfx_mut(64, |s| s.speed), None);
    }

    #[test]
    fn test_distortion_quantises_output() {
        let engine = AudioEngine::new();
        engine.set_sfx(0, tone());
        engine.sfx(0, Some(1), 0);
        engine.set_distortion(1, true);

        let mut out = [0i16; 64];
        engine.render_channel(1, &mut out);
        assert!(out.iter().all(|s| s % 0x1249 == 0));
        assert!(out.iter().any(|&s| s != 0));
    }

    #[test]
    fn test_snapshot_restore() {
        let engine = AudioEngine::new();
        engine.set_sfx(1, tone());
        engine.sfx(1, None, 2);
        engine.music(5, 0, 3);
        let snap = engine.snapshot();

        engine.reset();
        assert_eq!(engine.music_state(), MusicState::default());
        engine.restore(snap.clone());
        assert_eq!(engine.snapshot(), snap);
        assert_eq!(engine.music_state().pattern, 5);
    }

    #[test]
    fn test_music_pattern_table() {
        let engine = AudioEngine::new();
        let pattern = MusicPattern::from_bytes([1, 2, 3, 0x84]);
        assert!(engine.set_music_pattern(10, pattern));
        assert!(!engine.set_music_pattern(64, pattern));
        assert_eq!(engine.music_pattern(10), Some(pattern));
    }
}
