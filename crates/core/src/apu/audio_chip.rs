//! Pull-based audio source trait.
//!
//! The host audio callback owns a buffer and asks the chip to fill it. Chips
//! that are shared with the emulation thread must therefore be `Send`.

use crate::types::AudioSample;

/// A source of signed 16-bit mono samples at a fixed rate.
pub trait AudioChip: Send {
    /// Fill `out` with the next `out.len()` samples.
    fn generate(&mut self, out: &mut [AudioSample]);

    /// Generate `count` samples into a new buffer.
    fn generate_samples(&mut self, count: usize) -> Vec<AudioSample> {
        let mut samples = vec![0; count];
        self.generate(&mut samples);
        samples
    }

    /// Reset the chip to power-on state.
    fn reset(&mut self);

    /// Native sample rate of this chip (in Hz).
    fn sample_rate(&self) -> u32;
}
