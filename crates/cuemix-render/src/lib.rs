//! Deterministic offline mixing of EDL windows into PCM.
//!
//! [`WindowRenderer`] walks a compiled EDL in fixed-size blocks, sums
//! every intersecting clip with its gains and fades applied, and either
//! returns the mixed [`FrameBuffer`] or serializes it to a WAV file.

mod buffer;
mod error;
mod renderer;
#[cfg(test)]
mod tests;
pub mod wav;

pub use buffer::FrameBuffer;
pub use error::RenderError;
pub use renderer::{BLOCK_FRAMES, CancelFlag, WindowRenderer};
pub use wav::BitDepth;
