//! Change notification.
//!
//! Listeners learn about collections replaced by the background refresher in
//! two ways: registered callbacks, invoked synchronously in registration
//! order, and a tokio broadcast channel for async consumers.

use campus_core::CollectionKey;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// A collection was replaced with materially different content.
#[derive(Debug, Clone)]
pub struct CollectionChanged<T> {
    pub key: CollectionKey,
    pub collection: Arc<Vec<T>>,
    pub version: u64,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&CollectionChanged<T>) + Send + Sync>;

/// Fan-out point for change events.
pub struct ChangeNotifier<T> {
    tx: broadcast::Sender<CollectionChanged<T>>,
    listeners: RwLock<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> ChangeNotifier<T> {
    /// Create a notifier whose broadcast channel buffers `capacity` events.
    ///
    /// `capacity` must be non-zero; `CacheConfig::validate` enforces this.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback for every future change.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CollectionChanged<T>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Receive changes as a stream of broadcast messages.
    pub fn receiver(&self) -> broadcast::Receiver<CollectionChanged<T>> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .map(|l| l.len())
            .unwrap_or_else(|e| e.into_inner().len())
    }

    /// Deliver a change to every callback and broadcast receiver.
    ///
    /// Callbacks run outside the registry lock, so a callback may itself
    /// subscribe or unsubscribe.
    pub fn notify(&self, event: CollectionChanged<T>) {
        let snapshot: Vec<Listener<T>> = {
            let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
            listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        for listener in &snapshot {
            listener(&event);
        }

        let institution = event.key.institution().clone();
        let version = event.version;
        match self.tx.send(event) {
            Ok(receivers) => debug!(
                institution = %institution,
                version,
                callbacks = snapshot.len(),
                receivers,
                "Change notification delivered"
            ),
            Err(_) => trace!(
                institution = %institution,
                version,
                callbacks = snapshot.len(),
                "No broadcast receivers for change notification"
            ),
        }
    }
}
