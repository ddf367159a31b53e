use tokio::sync::broadcast;

use cuemix_core::EngineEvent;

/// Broadcaster for engine events.
///
/// Each subscriber owns a bounded ring; a consumer that falls behind
/// drops its oldest events and observes the gap as a `Lagged` receive,
/// which the transport turns into a terminal
/// [`EngineEvent::SlowConsumer`]. The broadcaster itself never blocks on
/// a slow subscriber.
pub struct EventHub {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
