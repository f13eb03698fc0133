//! The eight instrument waveforms.
//!
//! Scale factors were measured from hardware recordings and are reproduced
//! exactly. All shapes except noise and phaser depend only on the fractional
//! phase; those two also read the absolute phase.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Instrument {
    Triangle = 0,
    TiltedSaw = 1,
    Saw = 2,
    Square = 3,
    Pulse = 4,
    Organ = 5,
    Noise = 6,
    Phaser = 7,
}

impl Instrument {
    pub const ALL: [Instrument; 8] = [
        Instrument::Triangle,
        Instrument::TiltedSaw,
        Instrument::Saw,
        Instrument::Square,
        Instrument::Pulse,
        Instrument::Organ,
        Instrument::Noise,
        Instrument::Phaser,
    ];

    /// Instrument for the low three bits of `index`.
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index & 0x7) as usize]
    }

    /// Amplitude at phase `advance`.
    pub fn sample(self, advance: f32) -> f32 {
        waveform(self, advance)
    }
}

/// Amplitude of `instrument` at phase `advance`.
#[allow(clippy::excessive_precision)]
pub fn waveform(instrument: Instrument, advance: f32) -> f32 {
    let t = advance.rem_euclid(1.0);

    match instrument {
        Instrument::Triangle => 0.354 * ((4.0 * t - 2.0).abs() - 1.0),
        Instrument::TiltedSaw => {
            const A: f32 = 0.9;
            let ret = if t < A {
                2.0 * t / A - 1.0
            } else {
                2.0 * (1.0 - t) / (1.0 - A) - 1.0
            };
            ret * 0.406
        }
        Instrument::Saw => 0.653 * if t < 0.5 { t } else { t - 1.0 },
        Instrument::Square => {
            if t < 0.5 {
                0.25
            } else {
                -0.25
            }
        }
        Instrument::Pulse => {
            if t < 0.333_333_33 {
                0.25
            } else {
                -0.25
            }
        }
        Instrument::Organ => {
            let ret = if t < 0.5 {
                3.0 - (24.0 * t - 6.0).abs()
            } else {
                1.0 - (16.0 * t - 12.0).abs()
            };
            ret * 0.111_111_111
        }
        Instrument::Noise => {
            let mut ret = 0.0;
            let mut m = 1.75;
            let mut d = 1.0;
            while m <= 128.0 {
                ret += d * gradient_noise(m * advance);
                m *= 2.25;
                d *= 0.75;
            }
            ret * 0.4
        }
        Instrument::Phaser => {
            // Two triangles cross-modulated by a sub-oscillator at 1/128 of
            // the note frequency.
            let k = (2.0 * (advance / 128.0).rem_euclid(1.0) - 1.0).abs();
            let u = (t + 0.5 * k).rem_euclid(1.0);
            let ret = (4.0 * u - 2.0).abs() - (8.0 * t - 4.0).abs();
            ret * 0.166_666_666
        }
    }
}

/// Pseudo-random gradient in [-1, 1] for lattice point `i`.
fn lattice_gradient(i: i32) -> f32 {
    let mut h = (i as u32).wrapping_mul(0x9E37_79B1);
    h ^= h >> 15;
    h = h.wrapping_mul(0x85EB_CA77);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE3D);
    h ^= h >> 16;
    (h & 0xFFFF) as f32 / 32767.5 - 1.0
}

/// Coherent 1-D gradient noise, zero at every integer, roughly in [-1, 1].
fn gradient_noise(x: f32) -> f32 {
    let cell = x.floor();
    let f = x - cell;
    let i = cell as i32;

    let d0 = lattice_gradient(i) * f;
    let d1 = lattice_gradient(i.wrapping_add(1)) * (f - 1.0);
    let fade = f * f * f * (f * (f * 6.0 - 15.0) + 10.0);
    2.0 * (d0 + (d1 - d0) * fade)
}
