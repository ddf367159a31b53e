use std::io;

use cuemix_media::MediaError;
use thiserror::Error;

/// Errors produced by the window renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Maps to `INVALID_ARGUMENT`.
    #[error("invalid render range: duration must be positive")]
    EmptyRange,

    /// Render aborted by the caller's cancel flag; no output remains.
    #[error("render cancelled")]
    Cancelled,

    /// Maps to `INVALID_ARGUMENT`.
    #[error("cannot create output directory `{path}`: {source}")]
    CreateOutputDir {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Maps to `IO`; the partial output file has been removed.
    #[error("cannot write output file `{path}`: {source}")]
    WriteOutput {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Maps to `INTERNAL`: the store validated this media, so a failed
    /// open mid-render is an invariant violation.
    #[error("media open failed for clip {clip_id} at `{path}`: {source}")]
    MediaOpen {
        clip_id: String,
        path: String,
        #[source]
        source: MediaError,
    },

    /// Maps to `INTERNAL`.
    #[error("media read failed for clip {clip_id} at `{path}`: {source}")]
    MediaRead {
        clip_id: String,
        path: String,
        #[source]
        source: MediaError,
    },
}

impl RenderError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
