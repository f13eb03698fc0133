//! Display-side renderer trait.
//!
//! Emulated video hardware keeps its picture in whatever form the machine
//! uses internally (packed indices, tiles, planar memory). A [`Renderer`]
//! owns the ARGB [`Frame`] that the host shows and is responsible for turning
//! the machine's picture into it:
//!
//! ```text
//! System (video memory) -> Renderer -> Frame -> host display
//! ```

use crate::types::Frame;

/// Converts a system's video memory into a host-visible frame.
pub trait Renderer: Send {
    /// The most recently produced frame.
    fn get_frame(&self) -> &Frame;

    /// Clear the frame with a solid ARGB8888 colour (0xAARRGGBB).
    fn clear(&mut self, color: u32);

    /// Return to the power-on state, clearing the frame to opaque black.
    fn reset(&mut self);

    /// Human-readable name, used in log messages.
    fn name(&self) -> &str;

    /// Frame dimensions in pixels.
    fn dimensions(&self) -> (u32, u32) {
        let frame = self.get_frame();
        (frame.width, frame.height)
    }
}
