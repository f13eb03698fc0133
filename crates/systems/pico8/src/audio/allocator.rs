//! Shared audio state and the sfx/music channel allocation policy.

use emu_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};

use super::channel::AudioChannel;
use super::sfx::{MusicPattern, Sfx, MUSIC_PATTERN_COUNT, SFX_COUNT};

pub const CHANNEL_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicState {
    /// Current pattern, -1 when stopped.
    pub pattern: i16,
    /// Channels reserved for music.
    pub mask: u8,
}

impl Default for MusicState {
    fn default() -> Self {
        Self {
            pattern: -1,
            mask: 0,
        }
    }
}

impl MusicState {
    pub fn is_playing(&self) -> bool {
        self.pattern >= 0
    }
}

/// Everything the trigger path and the render path share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioState {
    pub channels: [AudioChannel; CHANNEL_COUNT],
    pub music: MusicState,
    pub sfx: Vec<Sfx>,
    /// Music pattern table. Playback does not sequence it; it is kept so
    /// the cart loader can fill it, a sequencer can read it back through
    /// [`AudioEngine::music_pattern`](super::AudioEngine::music_pattern),
    /// and save states carry it.
    pub patterns: Vec<MusicPattern>,
    /// Per-channel bitcrush enable, bit n for channel n.
    pub distortion: u8,
}

impl Default for AudioState {
    fn default() -> Self {
        Self {
            channels: [AudioChannel::default(); CHANNEL_COUNT],
            music: MusicState::default(),
            sfx: vec![Sfx::default(); SFX_COUNT],
            patterns: vec![MusicPattern::default(); MUSIC_PATTERN_COUNT],
            distortion: 0,
        }
    }
}

impl AudioState {
    /// Trigger, stop or un-loop a sound effect.
    ///
    /// - `id` -1 stops `channel`, -2 turns off looping on `channel`; both
    ///   need an explicit channel
    /// - `id` 0..=63 plays on `channel`, or on an automatically chosen one
    ///   when `channel` is `None` or -1
    ///
    /// Out-of-range arguments are ignored. Negative offsets start at 0.
    pub fn sfx(&mut self, id: i32, channel: Option<i32>, offset: i32) {
        let chan = channel.unwrap_or(-1);
        if !(-2..SFX_COUNT as i32).contains(&id)
            || !(-1..CHANNEL_COUNT as i32).contains(&chan)
            || offset > 31
        {
            log(LogCategory::Audio, LogLevel::Debug, || {
                format!("sfx({}, {}, {}) ignored", id, chan, offset)
            });
            return;
        }
        let explicit = usize::try_from(chan).ok();

        match id {
            -1 => {
                if let Some(ch) = explicit {
                    self.channels[ch].stop();
                }
            }
            -2 => {
                if let Some(ch) = explicit {
                    self.channels[ch].can_loop = false;
                }
            }
            _ => {
                let id = id as u8;
                let ch = explicit.unwrap_or_else(|| self.pick_channel(id));

                // One voice per sfx.
                for other in self.channels.iter_mut() {
                    if other.sfx == Some(id) {
                        other.stop();
                    }
                }
                self.channels[ch].start(id, offset.max(0) as f32);

                log(LogCategory::Audio, LogLevel::Debug, || {
                    format!("sfx {} on channel {} at note {}", id, ch, offset.max(0))
                });
            }
        }
    }

    /// First channel that is idle or already playing `id`; otherwise the
    /// channel playing the lowest sfx id is stolen.
    fn pick_channel(&self, id: u8) -> usize {
        if let Some(ch) = self
            .channels
            .iter()
            .position(|c| c.sfx.is_none() || c.sfx == Some(id))
        {
            return ch;
        }

        let mut stolen = 0;
        for (i, c) in self.channels.iter().enumerate() {
            if c.sfx < self.channels[stolen].sfx {
                stolen = i;
            }
        }
        log(LogCategory::Audio, LogLevel::Debug, || {
            format!(
                "all channels busy, stealing channel {} from sfx {:?}",
                stolen, self.channels[stolen].sfx
            )
        });
        stolen
    }

    /// Start or stop music.
    ///
    /// Pattern -1 stops the channels reserved by the current music. With no
    /// music playing it is recorded like any other pattern, so the new mask
    /// is kept. Pattern sequencing is not emulated: a started pattern is only
    /// recorded.
    pub fn music(&mut self, pattern: i32, fade_ms: i32, mask: i32) {
        if !(-1..MUSIC_PATTERN_COUNT as i32).contains(&pattern) {
            return;
        }

        if pattern == -1 && self.music.is_playing() {
            for (i, channel) in self.channels.iter_mut().enumerate() {
                if self.music.mask & (1 << i) != 0 {
                    channel.stop();
                }
            }
            self.music.pattern = -1;
            return;
        }

        self.music.pattern = pattern as i16;
        self.music.mask = (mask & 0xF) as u8;

        log(LogCategory::Stubs, LogLevel::Info, || {
            format!("music({}, {}, {})", pattern, fade_ms, mask)
        });
    }

    /// Fill `out` with the next samples of channel `ch`.
    pub fn render(&mut self, ch: usize, out: &mut [i16]) {
        let Some(channel) = self.channels.get_mut(ch) else {
            out.fill(0);
            return;
        };
        let distort = self.distortion & (1 << ch) != 0;
        for sample in out.iter_mut() {
            *sample = channel.next_sample(&self.sfx, distort);
        }
    }

    pub fn set_distortion(&mut self, ch: usize, on: bool) {
        if ch >= CHANNEL_COUNT {
            return;
        }
        if on {
            self.distortion |= 1 << ch;
        } else {
            self.distortion &= !(1 << ch);
        }
    }
}
