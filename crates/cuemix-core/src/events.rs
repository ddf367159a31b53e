use serde::{Deserialize, Serialize};

/// Event payload fanned out by the engine broadcaster and carried by
/// streaming operations.
///
/// Events serialize as single-line JSON objects tagged by `kind`, the
/// form both the wire and log surfaces use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Emitted once to every new subscriber.
    BackendStatus {
        /// Engine availability, currently always `"ready"`.
        status: String,
    },
    /// A new EDL snapshot was committed.
    EdlApplied {
        edl_id: String,
        /// Server-assigned content revision (12 lowercase hex chars).
        revision: String,
        track_count: u32,
        clip_count: u32,
    },
    /// An EDL operation failed validation, compilation or rendering.
    EdlError {
        /// Offending EDL id; empty when no EDL was loaded at all.
        #[serde(default)]
        edl_id: String,
        reason: String,
    },
    /// Render progress after each block.
    Progress {
        /// Fraction of the window rendered, in `[0, 1]`.
        fraction: f64,
        /// Estimated seconds until completion; zero until measurable.
        eta: f64,
    },
    /// Terminal event of a successful render stream.
    Complete {
        out_path: String,
        /// Rendered window length in seconds.
        duration_sec: f64,
        /// Full lowercase hex SHA-256 of the produced WAV file bytes.
        sha256: String,
    },
    /// Periodic liveness signal on subscriber streams.
    Heartbeat {
        /// Milliseconds since engine start, from a monotonic clock.
        monotonic_ms: u64,
    },
    /// Terminal event on a stream whose consumer fell behind the
    /// broadcast ring; the stream closes after this.
    SlowConsumer {
        /// Number of events dropped before the consumer caught up.
        dropped: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_by_kind() {
        let json = serde_json::to_string(&EngineEvent::BackendStatus {
            status: "ready".to_string(),
        })
        .expect("serialize event");
        assert_eq!(json, r#"{"kind":"backend_status","status":"ready"}"#);
    }

    #[test]
    fn heartbeat_round_trips() {
        let event = EngineEvent::Heartbeat { monotonic_ms: 4200 };
        let json = serde_json::to_string(&event).expect("serialize");
        let back: EngineEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }

    #[test]
    fn edl_error_defaults_missing_edl_id() {
        let event: EngineEvent =
            serde_json::from_str(r#"{"kind":"edl_error","reason":"No EDL currently loaded"}"#)
                .expect("deserialize");
        assert_eq!(
            event,
            EngineEvent::EdlError {
                edl_id: String::new(),
                reason: "No EDL currently loaded".to_string(),
            }
        );
    }
}
