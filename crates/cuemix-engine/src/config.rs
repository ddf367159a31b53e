use std::time::Duration;

/// Runtime configuration for the engine front-end.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Idle interval between heartbeats on subscriber streams.
    pub heartbeat_interval: Duration,
    /// Broadcast ring capacity per subscriber; a subscriber that falls
    /// further behind than this loses oldest events first.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(2),
            event_capacity: 256,
        }
    }
}
