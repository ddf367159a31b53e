//! Strict JSON forms of the EDL and engine events.
//!
//! The EDL wire form rejects unknown fields and parses enum values
//! case-insensitively. The canonical form defined here is the input to
//! the store's revision hash.

use thiserror::Error;

use crate::edl::Edl;
use crate::events::EngineEvent;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("EDL JSON parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("EDL JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Parse an EDL from its strict JSON form.
pub fn parse_edl(json: &str) -> Result<Edl, JsonError> {
    serde_json::from_str(json).map_err(JsonError::Parse)
}

/// Serialize an EDL to its wire JSON form.
pub fn edl_to_json(edl: &Edl) -> Result<String, JsonError> {
    serde_json::to_string_pretty(edl).map_err(JsonError::Encode)
}

/// Canonical single-line JSON of an EDL with the revision cleared.
///
/// This is the exact byte sequence the revision hash is computed over;
/// two EDLs that differ only in their client-supplied `revision` produce
/// identical canonical forms.
pub fn canonical_edl_json(edl: &Edl) -> Result<String, JsonError> {
    let mut cleared = edl.clone();
    cleared.revision = String::new();
    serde_json::to_string(&cleared).map_err(JsonError::Encode)
}

/// Compact single-line JSON of an engine event, for NDJSON streams.
pub fn event_to_ndjson(event: &EngineEvent) -> String {
    // The event type derives Serialize over plain fields; failure here
    // would be a serde_json bug, so fall back to an empty object.
    serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
}
