//! EventEngine
//!
//! Responsibilities:
//!   • Keep a handler list per event type (no duplicates, empty types pruned)
//!   • Accept events without blocking the producer (bounded queue)
//!   • Run one dispatch task that delivers events strictly in queue order
//!   • Isolate handler failures: an `Err` or a panic in one handler never
//!     stops delivery to the others
//!   • On `stop`, deliver everything already queued before returning
//!
//! Backpressure policy is reject: when the queue is at capacity `put` fails
//! with [`EngineError::QueueFull`] and the event is dropped.
//!
//! Handlers run on the dispatch task. Long-running work should be spawned
//! from inside the handler rather than done inline.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::error::EngineError;
use crate::event::Event;

/// A thread-safe callback for one event type.
///
/// Handlers are called synchronously on the dispatch task, which runs on a
/// Tokio worker thread. They must not block: a handler that does IO or other
/// slow work should `tokio::spawn` it (the runtime context is available) and
/// return straight away, otherwise every later event waits and the worker
/// thread is stalled.
///
/// Identity (for duplicate detection and `unregister`) is the `Arc` pointer,
/// so keep a clone of the handler you intend to remove later.
pub type EventHandler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static>;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Maximum number of events waiting for dispatch.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Counters since the engine was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Events taken off the queue (with or without handlers).
    pub dispatched: u64,
    /// Handler invocations that returned `Err` or panicked.
    pub handler_failures: u64,
    /// Events refused by `put` because the queue was full.
    pub rejected: u64,
}

/// State shared with the dispatch task.
#[derive(Default)]
struct Shared {
    handlers: RwLock<HashMap<String, Vec<EventHandler>>>,
    /// Queue receiver while no dispatch task owns it.
    idle_rx: Mutex<Option<Receiver<Event>>>,
    dispatched: AtomicU64,
    handler_failures: AtomicU64,
    rejected: AtomicU64,
}

impl Shared {
    /// Deliver one event to every handler of its type, in registration order.
    fn dispatch(&self, event: &Event) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);

        // Snapshot so handlers may (un)register without deadlocking.
        let handlers = match self.handlers.read().get(&event.event_type) {
            Some(list) => list.clone(),
            None => {
                trace!(event_type = %event.event_type, "no handlers for event");
                return;
            }
        };

        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.handler_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(event_type = %event.event_type, error = %e, "event handler failed");
                }
                Err(_) => {
                    self.handler_failures.fetch_add(1, Ordering::Relaxed);
                    error!(event_type = %event.event_type, "event handler panicked");
                }
            }
        }
    }
}

/// A running dispatch task and the means to stop it.
struct Worker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the queue receiver inside the dispatch task and returns it to
/// [`Shared::idle_rx`] when the task ends, however it ends.
struct ReceiverGuard {
    rx: Option<Receiver<Event>>,
    shared: Arc<Shared>,
}

impl Drop for ReceiverGuard {
    fn drop(&mut self) {
        if let Some(rx) = self.rx.take() {
            *self.shared.idle_rx.lock() = Some(rx);
        }
    }
}

pub struct EventEngine {
    tx: Sender<Event>,
    worker: Mutex<Option<Worker>>,
    shared: Arc<Shared>,
}

impl Default for EventEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EventEngine {
    pub fn new(config: EngineConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

        let shared = Shared {
            idle_rx: Mutex::new(Some(rx)),
            ..Shared::default()
        };

        Self {
            tx,
            worker: Mutex::new(None),
            shared: Arc::new(shared),
        }
    }

    /// Add `handler` to the dispatch list of `event_type`.
    ///
    /// Returns `false` if this exact handler is already registered for it.
    pub fn register(&self, event_type: &str, handler: EventHandler) -> bool {
        let mut handlers = self.shared.handlers.write();
        let list = handlers.entry(event_type.to_string()).or_default();

        if list.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            debug!(event_type, "handler already registered");
            return false;
        }

        list.push(handler);
        debug!(event_type, handlers = list.len(), "handler registered");
        true
    }

    /// Remove `handler` from `event_type`, dropping the type once it has no
    /// handlers left. Returns whether anything was removed.
    pub fn unregister(&self, event_type: &str, handler: &EventHandler) -> bool {
        let mut handlers = self.shared.handlers.write();

        let Some(list) = handlers.get_mut(event_type) else {
            return false;
        };

        let before = list.len();
        list.retain(|h| !Arc::ptr_eq(h, handler));
        let removed = list.len() != before;

        if list.is_empty() {
            handlers.remove(event_type);
        }

        removed
    }

    /// Enqueue an event for asynchronous delivery. Never blocks.
    pub fn put(&self, event: Event) -> Result<(), EngineError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                self.shared.rejected.fetch_add(1, Ordering::Relaxed);
                let capacity = self.tx.max_capacity();
                warn!(event_type = %event.event_type, capacity, "event queue full; event rejected");
                Err(EngineError::QueueFull { capacity })
            }
            Err(TrySendError::Closed(_)) => Err(EngineError::Closed),
        }
    }

    /// Spawn the dispatch task on the current Tokio runtime.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(EngineError::AlreadyRunning);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

        // Missing while a previous task is still draining after a cancelled stop.
        let rx = self
            .shared
            .idle_rx
            .lock()
            .take()
            .ok_or(EngineError::Stopping)?;

        let guard = ReceiverGuard {
            rx: Some(rx),
            shared: Arc::clone(&self.shared),
        };
        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = runtime.spawn(dispatch_loop(guard, shutdown_rx, Arc::clone(&self.shared)));

        *worker = Some(Worker { shutdown, handle });
        info!(component = "event_engine", event = "startup", "Event engine started");
        Ok(())
    }

    /// Stop the dispatch task after it has delivered every queued event.
    ///
    /// Events put while the drain is in progress may be left for the next
    /// `start`. The engine can be restarted afterwards.
    ///
    /// Dropping the returned future early does not lose the queue: the task
    /// still drains and hands the receiver back, after which `start` works
    /// again. Until then `start` returns [`EngineError::Stopping`].
    pub async fn stop(&self) -> Result<(), EngineError> {
        let worker = self.worker.lock().take().ok_or(EngineError::NotRunning)?;

        // The task may already be gone; join reports that below.
        let _ = worker.shutdown.send(());

        match worker.handle.await {
            Ok(()) => {
                info!(component = "event_engine", event = "shutdown", "Event engine stopped");
                Ok(())
            }
            Err(e) => {
                error!(component = "event_engine", error = ?e, "dispatch task failed");
                Err(EngineError::WorkerPanicked)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Events waiting for dispatch.
    pub fn queue_size(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.shared
            .handlers
            .read()
            .get(event_type)
            .map_or(0, Vec::len)
    }

    pub fn event_types(&self) -> Vec<String> {
        self.shared.handlers.read().keys().cloned().collect()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            dispatched: self.shared.dispatched.load(Ordering::Relaxed),
            handler_failures: self.shared.handler_failures.load(Ordering::Relaxed),
            rejected: self.shared.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Dispatch loop. The guard hands the receiver back on exit so the engine
/// can restart.
async fn dispatch_loop(
    mut guard: ReceiverGuard,
    mut shutdown: oneshot::Receiver<()>,
    shared: Arc<Shared>,
) {
    let Some(rx) = guard.rx.as_mut() else {
        return;
    };

    loop {
        tokio::select! {
            biased;

            // Fires on stop() and when the engine is dropped.
            _ = &mut shutdown => break,

            next = rx.recv() => match next {
                Some(event) => shared.dispatch(&event),
                None => break,
            },
        }
    }

    let mut drained = 0usize;
    while let Ok(event) = rx.try_recv() {
        shared.dispatch(&event);
        drained += 1;
    }

    debug!(drained, "dispatch loop drained");
}
