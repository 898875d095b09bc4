use mentor_core::SessionEvent;
use tokio::sync::mpsc;

/// Optional progress channel. Sends never fail the caller; a dropped receiver
/// only means nobody is listening.
#[derive(Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<SessionEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<SessionEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub async fn send(&self, event: SessionEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }
}
