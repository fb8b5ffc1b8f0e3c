//! In-process invoice event bus
//!
//! `BroadcastEventBus` fans events out over a `tokio::sync::broadcast`
//! channel. Every subscriber sees every event posted after it subscribed.
//! Posting with no subscribers is not an error.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use core_kernel::{DomainPort, PortError};

use crate::events::InvoiceEvent;
use crate::ports::InvoiceEventBus;

/// Default number of events buffered per subscriber
const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast-channel implementation of `InvoiceEventBus`
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<InvoiceEvent>,
}

impl BroadcastEventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber
    ///
    /// A lagging subscriber loses the oldest events first.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events posted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<InvoiceEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DomainPort for BroadcastEventBus {}

#[async_trait]
impl InvoiceEventBus for BroadcastEventBus {
    async fn post(&self, event: InvoiceEvent) -> Result<(), PortError> {
        let event_type = event.event_type();
        let invoice_id = event.invoice_id();

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(%invoice_id, event_type, receivers, "Posted invoice event");
            }
            Err(_) => {
                debug!(%invoice_id, event_type, "Posted invoice event with no subscribers");
            }
        }
        Ok(())
    }
}
