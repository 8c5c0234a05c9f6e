//! Viewer registry and fan-out

use super::message::{ControlCommand, EventMessage, EventType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info};
use uuid::Uuid;

type Registry = HashMap<Uuid, mpsc::Sender<Arc<str>>>;

struct HubInner {
    channels: Mutex<Registry>,
    capacity: usize,
    closed: AtomicBool,
}

/// Registry of connected viewers. Cloning shares the same registry.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

/// Per-publish delivery counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Viewers the message was queued for
    pub delivered: usize,
    /// Viewers skipped because their queue was full
    pub dropped: usize,
}

impl BroadcastHub {
    /// Create a hub whose viewers each buffer up to `capacity` messages
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                channels: Mutex::new(HashMap::new()),
                capacity: capacity.max(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Register a new viewer channel.
    ///
    /// The channel stays registered until the returned subscription is
    /// dropped or [`unregister`](Self::unregister) is called with its id.
    pub fn register(&self) -> Subscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(self.inner.capacity);

        // Checked under the lock so a concurrent close_all cannot miss it
        let mut channels = self.lock();
        if self.inner.closed.load(Ordering::Acquire) {
            // Sender dropped here; the subscription ends immediately.
            debug!("Hub closed, refusing viewer {}", id);
        } else {
            channels.insert(id, sender);
            info!("Viewer {} connected ({} connected)", id, channels.len());
        }
        drop(channels);

        Subscription {
            id,
            receiver,
            hub: self.clone(),
        }
    }

    /// Remove a viewer channel. Removing an absent id is a no-op.
    pub fn unregister(&self, id: Uuid) {
        let mut channels = self.lock();
        if channels.remove(&id).is_some() {
            info!("Viewer {} disconnected ({} connected)", id, channels.len());
        }
    }

    /// Queue a message for every registered viewer without blocking.
    ///
    /// Viewers whose queue is full miss this message; nobody else is
    /// affected.
    pub fn publish(&self, event_type: EventType, command: ControlCommand) -> PublishReport {
        let message = EventMessage::new(event_type, command);
        let payload: Arc<str> = match serde_json::to_string(&message) {
            Ok(json) => json.into(),
            Err(e) => {
                error!("Failed to serialize event: {}", e);
                return PublishReport::default();
            }
        };

        let mut report = PublishReport::default();
        let mut channels = self.lock();

        channels.retain(|id, sender| match sender.try_send(payload.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!("Viewer {} queue full, dropping {} event", id, command);
                report.dropped += 1;
                true
            }
            // Receiver already gone; its subscription is being torn down
            Err(TrySendError::Closed(_)) => false,
        });

        debug!(
            "Published {} to {} viewers ({} dropped)",
            command, report.delivered, report.dropped
        );
        report
    }

    /// Number of registered viewers
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.lock().contains_key(&id)
    }

    /// Drop every viewer channel so all open streams end.
    ///
    /// Later registrations receive an already-closed channel.
    pub fn close_all(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let mut channels = self.lock();
        let count = channels.len();
        channels.clear();
        info!("Closed {} viewer channels", count);
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(16)
    }
}

/// One viewer's end of the hub. Unregisters itself when dropped.
pub struct Subscription {
    id: Uuid,
    receiver: mpsc::Receiver<Arc<str>>,
    hub: BroadcastHub,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next queued message; `None` once the hub drops the channel
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.receiver.recv().await
    }

    /// Take a queued message without waiting
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}
