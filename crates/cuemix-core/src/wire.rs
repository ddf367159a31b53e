use serde::{Deserialize, Serialize};

use crate::edl::{Edl, TimeRange};
use crate::events::EngineEvent;

/// Probe result for a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub sample_rate: u32,
    pub num_channels: u16,
    pub duration_seconds: f64,
    pub file_size_bytes: u64,
}

/// One request line on a client connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Ping,
    LoadFile {
        file_path: String,
    },
    /// One-shot render of a single media file window, no EDL involved.
    Render {
        input_file: String,
        output_file: String,
        /// Window start in seconds; defaults to the start of the file.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_time: Option<f64>,
        /// Window length in seconds; defaults to the rest of the file.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
    },
    UpdateEdl {
        edl: Edl,
        /// Reserved for a future merge semantics; currently advisory.
        #[serde(default)]
        replace: bool,
    },
    RenderEdlWindow {
        edl_id: String,
        range: TimeRange,
        out_path: String,
        /// 16, 24 or 32; anything else renders as 32-bit float.
        #[serde(default = "default_bit_depth")]
        bit_depth: u32,
    },
    Subscribe {
        #[serde(default)]
        session: String,
    },
}

fn default_bit_depth() -> u32 {
    32
}

/// One response line on a client connection.
///
/// Unary operations answer with a single line; streaming operations emit
/// a sequence of lines ending with a terminal variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    LoadFile {
        success: bool,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_info: Option<FileInfo>,
    },
    RenderProgress {
        percentage: f64,
        status_message: String,
        elapsed_seconds: f64,
        estimated_remaining_seconds: f64,
    },
    RenderComplete {
        output_file_path: String,
        sha256_hash: String,
        total_duration_seconds: f64,
        output_file_size_bytes: u64,
    },
    RenderError {
        error_code: String,
        error_message: String,
    },
    UpdateEdl {
        edl_id: String,
        revision: String,
        track_count: u32,
        clip_count: u32,
    },
    Event {
        event: EngineEvent,
    },
    Error {
        code: String,
        message: String,
    },
}
