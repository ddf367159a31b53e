//! Decode access to on-disk audio media.
//!
//! [`MediaCache`] opens one [`MediaReader`] per path and keeps it for the
//! process lifetime; readers expose the stream spec and frame-accurate
//! interleaved `f32` reads.

mod cache;
mod error;
mod reader;
#[cfg(test)]
mod test_fixtures;

pub use cache::MediaCache;
pub use error::MediaError;
pub use reader::{MediaInfo, MediaReader};
