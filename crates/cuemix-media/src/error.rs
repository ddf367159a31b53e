use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

/// Errors produced while opening or reading media files.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media file not found: {path}")]
    NotFound { path: String },

    #[error("unsupported or unreadable audio file `{path}`: {source}")]
    UnsupportedFormat {
        path: String,
        #[source]
        source: SymphoniaError,
    },

    #[error("missing default audio track in `{path}`")]
    MissingTrack { path: String },

    #[error("missing stream spec for `{path}`: sample_rate={sample_rate} channels={channels}")]
    MissingStreamSpec {
        path: String,
        sample_rate: u32,
        channels: u16,
    },

    #[error("unknown media length for `{path}`")]
    UnknownLength { path: String },

    #[error("read at frame {frame} is beyond end of `{path}` ({length} frames)")]
    ReadBeyondEnd {
        path: String,
        frame: u64,
        length: u64,
    },

    #[error("decoder init failed for `{path}`: {source}")]
    DecoderInit {
        path: String,
        #[source]
        source: SymphoniaError,
    },

    #[error("seek to frame {frame} failed in `{path}`: {source}")]
    Seek {
        path: String,
        frame: u64,
        #[source]
        source: SymphoniaError,
    },

    #[error("decode failed in `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: SymphoniaError,
    },

    #[error("io error on `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
