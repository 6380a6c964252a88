//! Subscription registry for alarm notifications.
//!
//! - Dispatch order is registration order.
//! - `publish` iterates a snapshot taken before the first handler runs, so a
//!   handler may subscribe or unsubscribe (itself or others) mid-dispatch.
//!   Changes take effect from the next event.
//! - A handler that is currently running is never re-entered. A nested
//!   publish reaching it is skipped and logged.
//!
//! The registry lock is never held while a handler runs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::{debug, warn};

use crate::AlarmEvent;

type Handler = Box<dyn FnMut(&AlarmEvent) + Send>;
type SharedHandler = Arc<Mutex<Handler>>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(SubscriptionId, SharedHandler)>,
}

/// Cloneable handle to one subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&AlarmEvent) + Send + 'static,
    {
        let mut reg = self.registry();
        reg.next_id += 1;
        let id = SubscriptionId(reg.next_id);
        reg.entries
            .push((id, Arc::new(Mutex::new(Box::new(handler) as Handler))));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut reg = self.registry();
        let before = reg.entries.len();
        reg.entries.retain(|(eid, _)| *eid != id);
        reg.entries.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().entries.len()
    }

    /// Deliver `event` to every subscriber in the snapshot.
    ///
    /// Returns how many handlers actually ran.
    pub fn publish(&self, event: &AlarmEvent) -> usize {
        let snapshot: Vec<(SubscriptionId, SharedHandler)> = self
            .registry()
            .entries
            .iter()
            .map(|(id, h)| (*id, Arc::clone(h)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in snapshot {
            match handler.try_lock() {
                Ok(mut h) => {
                    (*h)(event);
                    delivered += 1;
                }
                Err(TryLockError::WouldBlock) => {
                    debug!(
                        subscription = id.0,
                        event = event.kind(),
                        "bus/skip reentrant delivery"
                    );
                }
                Err(TryLockError::Poisoned(p)) => {
                    warn!(subscription = id.0, "bus/handler previously panicked");
                    let mut h = p.into_inner();
                    (*h)(event);
                    delivered += 1;
                }
            }
        }
        delivered
    }
}

/// Subscriber that records every notification it sees.
///
/// Drivers drain it after each step; tests inspect it.
#[derive(Clone, Debug)]
pub struct EventRecorder {
    id: SubscriptionId,
    events: Arc<Mutex<Vec<AlarmEvent>>>,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let id = bus.subscribe(move |ev| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(ev.clone());
        });
        Self { id, events }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AlarmEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<AlarmEvent> {
        self.lock().clone()
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<AlarmEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of recorded events with the given kind (see [`AlarmEvent::kind`]).
    pub fn count(&self, kind: &str) -> usize {
        self.lock().iter().filter(|e| e.kind() == kind).count()
    }

    /// Most recent ETA broadcast as `(remaining_secs, total_secs)`.
    pub fn last_eta(&self) -> Option<(f64, f64)> {
        self.lock().iter().rev().find_map(|e| match e {
            AlarmEvent::PoliceEtaChanged {
                remaining_secs,
                total_secs,
            } => Some((*remaining_secs, *total_secs)),
            _ => None,
        })
    }
}
