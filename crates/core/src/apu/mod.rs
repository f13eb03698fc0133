//! Core APU (Audio Processing Unit) interfaces.
//!
//! Systems expose their audio hardware through [`AudioChip`], a pull-based
//! source of signed 16-bit mono samples at a fixed sample rate.

pub mod audio_chip;

pub use audio_chip::AudioChip;
