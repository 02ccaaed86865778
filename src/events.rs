//! Events Module
//!
//! Mutation notifications published on a broadcast channel. The service
//! publishes and never waits on subscribers; a send with nobody listening is
//! not an error.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::record::Record;

/// A completed mutation, carrying the affected record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    RecordAdded(Record),
    RecordUpdated(Record),
    RecordDeleted(Record),
}

impl VaultEvent {
    /// Event name as seen by subscribers (`recordAdded`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::RecordAdded(_) => "recordAdded",
            VaultEvent::RecordUpdated(_) => "recordUpdated",
            VaultEvent::RecordDeleted(_) => "recordDeleted",
        }
    }

    /// The affected record
    pub fn record(&self) -> &Record {
        match self {
            VaultEvent::RecordAdded(record)
            | VaultEvent::RecordUpdated(record)
            | VaultEvent::RecordDeleted(record) => record,
        }
    }
}

/// Publish/subscribe channel for vault events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<VaultEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; returns how many subscribers received it
    pub fn publish(&self, event: VaultEvent) -> usize {
        tracing::trace!("Publishing {} for record {}", event.name(), event.record().id);
        self.sender.send(event).unwrap_or(0)
    }

    /// Current number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Spawn the logging sink
///
/// Logs every event until the bus is dropped. A lagging receiver logs how
/// many events it missed and keeps going.
pub fn spawn_event_logger(mut receiver: broadcast::Receiver<VaultEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let record = event.record();
                    tracing::info!(
                        event = event.name(),
                        id = record.id,
                        name = %record.name,
                        "Vault event"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("Event logger lagged, {} events dropped", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
