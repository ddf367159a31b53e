use cuemix_media::MediaError;
use thiserror::Error;

/// Validation and storage failures; every variant names the entity that
/// violated the constraint. Maps to `INVALID_ARGUMENT` on the wire.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("EDL ID cannot be empty")]
    EmptyEdlId,

    #[error("sample rate must be 44100, 48000, or 96000 Hz, got {rate}")]
    UnsupportedSampleRate { rate: i32 },

    #[error("EDL must contain at least one media reference")]
    NoMedia,

    #[error("media ID cannot be empty")]
    EmptyMediaId,

    #[error("duplicate media ID: {media_id}")]
    DuplicateMediaId { media_id: String },

    #[error("media path cannot be empty for media ID: {media_id}")]
    EmptyMediaPath { media_id: String },

    #[error("media `{media_id}` failed to open: {source}")]
    MediaOpen {
        media_id: String,
        #[source]
        source: MediaError,
    },

    #[error(
        "media sample rate mismatch for {media_id}: specified {declared} but file is {actual}"
    )]
    DeclaredRateMismatch {
        media_id: String,
        declared: i32,
        actual: u32,
    },

    #[error(
        "media sample rate mismatch for {media_id}: file is {actual} but EDL requires {required}"
    )]
    EdlRateMismatch {
        media_id: String,
        actual: u32,
        required: i32,
    },

    #[error("EDL must contain at least one track")]
    NoTracks,

    #[error("track ID cannot be empty")]
    EmptyTrackId,

    #[error("clip ID cannot be empty in track {track_id}")]
    EmptyClipId { track_id: String },

    #[error("clip media_id cannot be empty for clip: {clip_id}")]
    EmptyClipMediaId { clip_id: String },

    #[error("media not found for clip {clip_id}: {media_id}")]
    ClipMediaMissing { clip_id: String, media_id: String },

    #[error("clip start_in_media must be non-negative for clip: {clip_id}")]
    NegativeStartInMedia { clip_id: String },

    #[error("clip duration must be positive for clip: {clip_id}")]
    NonPositiveDuration { clip_id: String },

    #[error("clip start_in_timeline must be non-negative for clip: {clip_id}")]
    NegativeStartInTimeline { clip_id: String },

    #[error(
        "clip extends beyond media end for clip {clip_id}: start={start} duration={duration} but media length={length}"
    )]
    ClipBeyondMedia {
        clip_id: String,
        start: i64,
        duration: i64,
        length: u64,
    },

    #[error("{fade} duration must be non-negative for clip: {clip_id}")]
    NegativeFadeDuration {
        clip_id: String,
        fade: &'static str,
    },

    #[error("failed to encode canonical EDL JSON: {source}")]
    Canonical {
        #[source]
        source: cuemix_core::json::JsonError,
    },
}

/// Compiler failures. The store has already validated media references,
/// so any variant here indicates an internal invariant violation; maps
/// to `INTERNAL` on the wire.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("media not found for clip {clip_id}: {media_id}")]
    MediaMissing { clip_id: String, media_id: String },
}
