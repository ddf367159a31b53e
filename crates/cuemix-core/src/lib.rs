//! Shared data model for the cuemix engine.
//!
//! This crate holds the types every other crate agrees on: the EDL
//! timeline model, the engine event union, and the wire-level request and
//! response messages, together with their strict JSON forms.

mod edl;
mod events;
pub mod json;
mod wire;

pub use edl::{AudioRef, Clip, Edl, Fade, FadeShape, TimeRange, Track};
pub use events::EngineEvent;
pub use wire::{FileInfo, Request, Response};
