//! Reusable video building blocks for indexed-colour systems.
//!
//! - [`PackedSurface`]: 4bpp pixel storage with two pixels per byte
//! - [`IndexedPalette`]: maps colour indices to ARGB values for display

pub mod palette;
pub mod surface;

pub use palette::{FixedPalette, IndexedPalette};
pub use surface::{PackedSurface, SurfaceError};
