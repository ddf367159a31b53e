//! EDL validation, storage and compilation.
//!
//! [`EdlStore`] is the single source of truth for the active timeline: it
//! validates every incoming EDL against the schema and the referenced
//! media, assigns a content revision, and swaps the snapshot atomically.
//! [`compile`] lowers a snapshot into the render-ready [`CompiledEdl`].

mod compile;
mod error;
mod store;

pub use compile::{
    CompiledClip, CompiledEdl, CompiledMedia, CompiledTrack, FadeCurve, FadeSpec, compile,
    db_to_linear,
};
pub use error::{CompileError, StoreError};
pub use store::{EdlStore, Snapshot};
