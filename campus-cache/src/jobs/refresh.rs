//! Background Refresh Task
//!
//! One recurring task per collection key. The scheduler knows nothing about
//! caching: each tick runs a caller-supplied future and the task keeps going
//! until it is stopped, its handles are all dropped, or the tick reports
//! [`TickOutcome::Stop`].
//!
//! # Usage
//!
//! ```ignore
//! let refresher = BackgroundRefresher::new();
//! let handle = refresher.start(&key, Duration::from_secs(120), || async {
//!     // poll the remote collection
//!     TickOutcome::Continue
//! });
//!
//! // Starting again for the same key is a no-op returning the same task.
//! let again = refresher.start(&key, Duration::from_secs(120), || async { TickOutcome::Continue });
//! assert!(handle.same_task(&again));
//!
//! refresher.stop(&key);
//! ```

use campus_core::CollectionKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// What the task should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// Owned handle to a running refresh task.
///
/// Cloning the handle does not create a new task. The task ends when
/// `stop` is called or when every handle (including the one held by the
/// [`BackgroundRefresher`]) has been dropped.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    key: CollectionKey,
    shutdown: Arc<watch::Sender<bool>>,
}

impl RefreshHandle {
    pub fn key(&self) -> &CollectionKey {
        &self.key
    }

    /// Signal the task to stop. Idempotent.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// True until the task is stopped or has exited.
    pub fn is_running(&self) -> bool {
        !*self.shutdown.borrow() && !self.shutdown.is_closed()
    }

    /// True if both handles control the same task.
    pub fn same_task(&self, other: &RefreshHandle) -> bool {
        Arc::ptr_eq(&self.shutdown, &other.shutdown)
    }
}

/// Registry of refresh tasks, at most one per key.
#[derive(Debug, Default)]
pub struct BackgroundRefresher {
    tasks: DashMap<CollectionKey, RefreshHandle>,
}

impl BackgroundRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a recurring task for `key`, or return the one already running.
    ///
    /// The first tick fires one full `period` after start. An existing task
    /// keeps its schedule; `period` and `tick` are ignored in that case.
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&self, key: &CollectionKey, period: Duration, tick: F) -> RefreshHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        match self.tasks.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_running() {
                    return occupied.get().clone();
                }
                let handle = spawn_refresh_task(key.clone(), period, tick);
                occupied.insert(handle.clone());
                handle
            }
            Entry::Vacant(vacant) => {
                let handle = spawn_refresh_task(key.clone(), period, tick);
                vacant.insert(handle.clone());
                handle
            }
        }
    }

    /// Stop the task for `key`. Returns false if none was running.
    pub fn stop(&self, key: &CollectionKey) -> bool {
        match self.tasks.remove(key) {
            Some((_, handle)) => {
                let was_running = handle.is_running();
                handle.stop();
                was_running
            }
            None => false,
        }
    }

    /// Stop every task. Returns how many were running.
    pub fn stop_all(&self) -> usize {
        let keys: Vec<CollectionKey> = self.tasks.iter().map(|e| e.key().clone()).collect();
        keys.iter().filter(|key| self.stop(key)).count()
    }

    pub fn is_running(&self, key: &CollectionKey) -> bool {
        self.tasks
            .get(key)
            .map(|handle| handle.is_running())
            .unwrap_or(false)
    }

    /// Number of tasks currently running.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|e| e.value().is_running()).count()
    }
}

impl Drop for BackgroundRefresher {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().stop();
        }
    }
}

fn spawn_refresh_task<F, Fut>(key: CollectionKey, period: Duration, mut tick: F) -> RefreshHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = TickOutcome> + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let handle = RefreshHandle {
        key: key.clone(),
        shutdown: Arc::new(shutdown_tx),
    };

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            institution = %key,
            interval_ms = period.as_millis() as u64,
            "Background refresh started"
        );

        let mut ticks = 0u64;
        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // Err means every handle was dropped.
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }

                _ = ticker.tick() => {
                    ticks += 1;
                    if tick().await == TickOutcome::Stop {
                        tracing::debug!(institution = %key, "Refresh target gone, stopping");
                        break;
                    }
                }
            }
        }

        tracing::info!(institution = %key, ticks, "Background refresh stopped");
    });

    handle
}
