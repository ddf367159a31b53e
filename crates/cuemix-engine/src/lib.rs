//! Engine front-end: dispatches operations over the EDL store, compiler
//! and window renderer, and fans engine events out to subscribers.
//!
//! The [`Engine`] surface is synchronous and thread-safe; transports run
//! each operation on their own worker and pump streamed events through
//! the callback sinks.

mod config;
mod engine;
mod error;
mod event_hub;
mod hash;

pub use config::EngineConfig;
pub use engine::{
    EdlSummary, Engine, FileRenderOutcome, FileRenderProgress, FileRenderRequest, RenderOutcome,
    RenderWindowRequest, Subscription,
};
pub use error::{EngineError, ErrorKind};
pub use event_hub::EventHub;

pub use cuemix_render::CancelFlag;
