//! Event relay from the core's callback thread to Rust subscribers.
//!
//! The core accepts one callback table per session. The relay installs a
//! single static table the first time anything subscribes to a session, and
//! fans each notification out to every [`Subscription`] registered for that
//! session.
//!
//! # Architecture
//!
//! ```text
//!   core callback thread
//!            │  onPropertyChanged / onStagePositionChanged
//!   ┌────────▼─────────┐
//!   │   EventRelay     │  handle -> SessionListeners
//!   └────────┬─────────┘
//!            │  snapshot senders, release lock
//!     ┌──────┼───────────────┐
//!     ▼      ▼               ▼
//!  Blocking  DropNewest   DropOldest
//!  (waits)   (try_send)   (ring, receiver sees the skip)
//! ```
//!
//! The callback returns to the core only once every subscriber has taken the
//! event or dropped it according to its [`DeliveryPolicy`]. Successive events
//! from one session reach each subscriber in firing order; there is no order
//! between subscribers.
//!
//! Callbacks for a handle with no registry entry (never subscribed, or
//! already closed) are ignored.
//!
//! # Example
//!
//! ```no_run
//! use mmcore::{DeliveryPolicy, Session};
//!
//! # fn example() -> mmcore::Result<()> {
//! let session = Session::open()?;
//! let mut events = session.subscribe_property_changed(DeliveryPolicy::default());
//!
//! session.set_property("Camera", "Exposure", 20.0)?;
//! while let Some(event) = events.try_recv() {
//!     println!("{}.{} = {}", event.label, event.property, event.value);
//! }
//! # Ok(())
//! # }
//! ```

mod native;
mod registry;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use mmcore_sys as sys;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace};

use self::registry::{ListenerList, SessionListeners, Sink, Subscriber};

/// A device property changed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChangedEvent {
    /// Device label (or `Core` for core settings).
    pub label: String,
    /// Property name.
    pub property: String,
    /// New value as reported by the device.
    pub value: String,
}

/// A focus stage reported a new position.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePositionChangedEvent {
    /// Stage label.
    pub label: String,
    /// Position in micrometres.
    pub position: f64,
}

mod sealed {
    pub trait Sealed: Sized {
        fn list(listeners: &super::SessionListeners) -> &super::ListenerList<Self>;
    }
}

/// Event kinds that can be subscribed to.
pub trait Event: sealed::Sealed + Clone + fmt::Debug + Send + Sync + 'static {}

impl sealed::Sealed for PropertyChangedEvent {
    fn list(listeners: &SessionListeners) -> &ListenerList<Self> {
        &listeners.property_changed
    }
}
impl Event for PropertyChangedEvent {}

impl sealed::Sealed for StagePositionChangedEvent {
    fn list(listeners: &SessionListeners) -> &ListenerList<Self> {
        &listeners.stage_position_changed
    }
}
impl Event for StagePositionChangedEvent {}

/// Largest queue a subscription allocates. Larger capacities are clamped.
pub const MAX_CAPACITY: usize = 1 << 16;

/// What the relay does when a subscriber's queue is full.
///
/// `capacity` is clamped to `1..=MAX_CAPACITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// The core's callback waits until the subscriber makes room.
    Blocking {
        /// Queue length.
        capacity: usize,
    },
    /// The oldest undelivered event is discarded. The capacity is rounded up
    /// to a power of two.
    DropOldest {
        /// Ring length.
        capacity: usize,
    },
    /// The new event is discarded and counted.
    DropNewest {
        /// Queue length.
        capacity: usize,
    },
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        DeliveryPolicy::Blocking { capacity: 16 }
    }
}

impl DeliveryPolicy {
    /// Capacity as written, before clamping.
    pub fn requested_capacity(self) -> usize {
        match self {
            Self::Blocking { capacity }
            | Self::DropOldest { capacity }
            | Self::DropNewest { capacity } => capacity,
        }
    }

    fn capacity(self) -> usize {
        self.requested_capacity().clamp(1, MAX_CAPACITY)
    }
}

/// A native session handle used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(usize);

impl SessionHandle {
    /// Key for a raw handle. The handle is never dereferenced.
    pub fn from_raw(raw: sys::MM_Session) -> Self {
        Self(raw as usize)
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Process-wide map from session handle to its listeners.
pub struct EventRelay {
    sessions: RwLock<HashMap<SessionHandle, Arc<SessionListeners>>>,
}

static RELAY: Lazy<EventRelay> = Lazy::new(|| EventRelay {
    sessions: RwLock::new(HashMap::new()),
});

/// The process-wide relay.
pub fn relay() -> &'static EventRelay {
    &RELAY
}

impl EventRelay {
    /// Listeners for `handle`, created on first use.
    fn listeners(&self, handle: SessionHandle) -> Arc<SessionListeners> {
        if let Some(existing) = self.sessions.read().get(&handle) {
            return Arc::clone(existing);
        }
        let mut sessions = self.sessions.write();
        Arc::clone(
            sessions
                .entry(handle)
                .or_insert_with(|| Arc::new(SessionListeners::new(handle))),
        )
    }

    fn lookup(&self, handle: SessionHandle) -> Option<Arc<SessionListeners>> {
        self.sessions.read().get(&handle).cloned()
    }

    /// Drop the registry entry for a session. Subscribers see their stream
    /// end once in-flight deliveries finish.
    pub(crate) fn remove(&self, handle: SessionHandle) -> bool {
        let removed = self.sessions.write().remove(&handle).is_some();
        if removed {
            debug!(session = %handle, "Removed event listeners");
        }
        removed
    }

    /// True if anything ever subscribed to `handle` and it is still open.
    pub fn is_registered(&self, handle: SessionHandle) -> bool {
        self.sessions.read().contains_key(&handle)
    }

    /// Number of sessions with listeners.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Deliver an event as if the core had raised it for `handle`.
    ///
    /// Returns the number of subscribers that were handed the event. Unknown
    /// handles are ignored and return 0.
    pub fn publish<E: Event>(&self, handle: SessionHandle, event: E) -> usize {
        match self.lookup(handle) {
            Some(listeners) => E::list(&listeners).dispatch(handle, event),
            None => {
                trace!(session = %handle, ?event, "No listeners for session, event ignored");
                0
            }
        }
    }

    /// Register a subscriber for `E` on the session behind `raw`.
    ///
    /// Installs the native callback table on the first subscription of the
    /// session.
    pub(crate) fn subscribe<E: Event>(&self, raw: sys::MM_Session, policy: DeliveryPolicy) -> Subscription<E> {
        let handle = SessionHandle::from_raw(raw);
        let listeners = self.listeners(handle);
        listeners.register_native(raw);

        let id = listeners.next_id();
        let capacity = policy.capacity();
        let dropped = Arc::new(AtomicU64::new(0));

        let (sink, receiver) = match policy {
            DeliveryPolicy::Blocking { .. } => {
                let (tx, rx) = mpsc::channel(capacity);
                (Sink::Blocking(tx), Receiver::Queue(rx))
            }
            DeliveryPolicy::DropNewest { .. } => {
                let (tx, rx) = mpsc::channel(capacity);
                (Sink::DropNewest(tx), Receiver::Queue(rx))
            }
            DeliveryPolicy::DropOldest { .. } => {
                let (tx, rx) = broadcast::channel(capacity);
                (Sink::DropOldest(tx), Receiver::Ring(rx))
            }
        };

        E::list(&listeners).add(Subscriber::new(id, sink, Arc::clone(&dropped)));
        debug!(session = %handle, id, ?policy, "Added event subscriber");

        Subscription {
            id,
            receiver,
            dropped,
            listeners: Arc::downgrade(&listeners),
        }
    }
}

enum Receiver<E> {
    Queue(mpsc::Receiver<E>),
    Ring(broadcast::Receiver<E>),
}

/// Receiving end of a subscription.
///
/// Dropping it unregisters the subscriber. The stream ends (`recv` returns
/// `None`) when the session is closed.
pub struct Subscription<E: Event> {
    id: u64,
    receiver: Receiver<E>,
    dropped: Arc<AtomicU64>,
    listeners: Weak<SessionListeners>,
}

impl<E: Event> Subscription<E> {
    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<E> {
        match &mut self.receiver {
            Receiver::Queue(rx) => rx.recv().await,
            Receiver::Ring(rx) => loop {
                match rx.recv().await {
                    Ok(event) => return Some(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        self.dropped.fetch_add(n, Ordering::Relaxed);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
        }
    }

    /// Wait for the next event from synchronous code.
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<E> {
        match &mut self.receiver {
            Receiver::Queue(rx) => rx.blocking_recv(),
            Receiver::Ring(rx) => loop {
                match rx.blocking_recv() {
                    Ok(event) => return Some(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        self.dropped.fetch_add(n, Ordering::Relaxed);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
        }
    }

    /// Take the next queued event, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        match &mut self.receiver {
            Receiver::Queue(rx) => rx.try_recv().ok(),
            Receiver::Ring(rx) => loop {
                match rx.try_recv() {
                    Ok(event) => return Some(event),
                    Err(broadcast::error::TryRecvError::Lagged(n)) => {
                        self.dropped.fetch_add(n, Ordering::Relaxed);
                    }
                    Err(_) => return None,
                }
            },
        }
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<E> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Events discarded for this subscriber so far.
    ///
    /// For [`DeliveryPolicy::DropOldest`] skipped events are counted as the
    /// receiver passes over them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<E: Event> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("dropped", &self.dropped())
            .finish()
    }
}

impl<E: Event> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            E::list(&listeners).remove(self.id);
            trace!(id = self.id, "Removed event subscriber");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_handle(n: usize) -> sys::MM_Session {
        // Only used as a registry key; never dereferenced.
        n as sys::MM_Session
    }

    fn property(value: &str) -> PropertyChangedEvent {
        PropertyChangedEvent {
            label: "Camera".into(),
            property: "Exposure".into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_unknown_handle_is_ignored() {
        let handle = SessionHandle::from_raw(fake_handle(0xdead_0001));
        assert_eq!(relay().publish(handle, property("1")), 0);
        assert!(!relay().is_registered(handle));
    }

    #[test]
    fn test_drop_newest_keeps_first_events() {
        let raw = fake_handle(0xdead_0002);
        let handle = SessionHandle::from_raw(raw);
        let listeners = relay().listeners(handle);
        listeners.mark_registered();

        let mut sub: Subscription<PropertyChangedEvent> =
            relay().subscribe(raw, DeliveryPolicy::DropNewest { capacity: 2 });
        for i in 0..5 {
            relay().publish(handle, property(&i.to_string()));
        }
        let values: Vec<String> = sub.drain().into_iter().map(|e| e.value).collect();
        assert_eq!(values, vec!["0", "1"]);
        assert_eq!(sub.dropped(), 3);

        relay().remove(handle);
    }

    #[test]
    fn test_drop_oldest_keeps_last_events() {
        let raw = fake_handle(0xdead_0003);
        let handle = SessionHandle::from_raw(raw);
        relay().listeners(handle).mark_registered();

        let mut sub: Subscription<PropertyChangedEvent> =
            relay().subscribe(raw, DeliveryPolicy::DropOldest { capacity: 4 });
        for i in 0..10 {
            relay().publish(handle, property(&i.to_string()));
        }
        let values: Vec<String> = sub.drain().into_iter().map(|e| e.value).collect();
        assert_eq!(values, vec!["6", "7", "8", "9"]);
        assert_eq!(sub.dropped(), 6);

        relay().remove(handle);
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let raw = fake_handle(0xdead_0004);
        let handle = SessionHandle::from_raw(raw);
        relay().listeners(handle).mark_registered();

        let sub: Subscription<StagePositionChangedEvent> =
            relay().subscribe(raw, DeliveryPolicy::default());
        let event = StagePositionChangedEvent {
            label: "Z".into(),
            position: 1.0,
        };
        assert_eq!(relay().publish(handle, event.clone()), 1);
        drop(sub);
        assert_eq!(relay().publish(handle, event), 0);

        relay().remove(handle);
    }

    #[test]
    fn test_remove_ends_stream() {
        let raw = fake_handle(0xdead_0005);
        let handle = SessionHandle::from_raw(raw);
        relay().listeners(handle).mark_registered();

        let mut sub: Subscription<PropertyChangedEvent> =
            relay().subscribe(raw, DeliveryPolicy::default());
        relay().publish(handle, property("a"));
        assert!(relay().remove(handle));

        assert_eq!(sub.blocking_recv().map(|e| e.value), Some("a".to_string()));
        assert_eq!(sub.blocking_recv(), None);
    }

    #[test]
    fn test_single_blocking_subscriber_outside_runtime() {
        let raw = fake_handle(0xdead_0008);
        let handle = SessionHandle::from_raw(raw);
        relay().listeners(handle).mark_registered();

        let mut sub: Subscription<PropertyChangedEvent> =
            relay().subscribe(raw, DeliveryPolicy::Blocking { capacity: 1 });
        std::thread::scope(|scope| {
            let producer = scope.spawn(|| {
                relay().publish(handle, property("a"));
                relay().publish(handle, property("b"));
            });
            assert_eq!(sub.blocking_recv().map(|e| e.value), Some("a".to_string()));
            producer.join().unwrap();
        });
        assert_eq!(sub.try_recv().map(|e| e.value), Some("b".to_string()));

        relay().remove(handle);
    }

    #[tokio::test]
    async fn test_single_blocking_subscriber_inside_runtime() {
        let raw = fake_handle(0xdead_0009);
        let handle = SessionHandle::from_raw(raw);
        relay().listeners(handle).mark_registered();

        let mut sub: Subscription<PropertyChangedEvent> =
            relay().subscribe(raw, DeliveryPolicy::Blocking { capacity: 4 });
        // Called from a runtime thread; must not panic in `blocking_send`.
        assert_eq!(relay().publish(handle, property("a")), 1);
        assert_eq!(sub.recv().await.map(|e| e.value), Some("a".to_string()));

        relay().remove(handle);
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_first_drop_is_logged() {
        let raw = fake_handle(0xdead_0006);
        let handle = SessionHandle::from_raw(raw);
        relay().listeners(handle).mark_registered();

        let _sub: Subscription<PropertyChangedEvent> =
            relay().subscribe(raw, DeliveryPolicy::DropNewest { capacity: 1 });
        relay().publish(handle, property("kept"));
        relay().publish(handle, property("dropped"));
        assert!(logs_contain("Subscriber queue full"));

        relay().remove(handle);
    }

    #[test]
    fn test_policy_serde() {
        let policy: DeliveryPolicy = toml::from_str("kind = \"drop_oldest\"\ncapacity = 8").unwrap();
        assert_eq!(policy, DeliveryPolicy::DropOldest { capacity: 8 });
        assert_eq!(DeliveryPolicy::Blocking { capacity: 0 }.capacity(), 1);
    }

    #[test]
    fn test_oversized_capacity_is_clamped() {
        assert_eq!(DeliveryPolicy::Blocking { capacity: usize::MAX }.capacity(), MAX_CAPACITY);
        assert_eq!(DeliveryPolicy::DropNewest { capacity: MAX_CAPACITY }.capacity(), MAX_CAPACITY);

        let raw = fake_handle(0xdead_0007);
        let handle = SessionHandle::from_raw(raw);
        relay().listeners(handle).mark_registered();

        let mut ring: Subscription<PropertyChangedEvent> =
            relay().subscribe(raw, DeliveryPolicy::DropOldest { capacity: i64::MAX as usize });
        let mut queue: Subscription<PropertyChangedEvent> =
            relay().subscribe(raw, DeliveryPolicy::Blocking { capacity: usize::MAX });
        assert_eq!(relay().publish(handle, property("1")), 2);
        assert_eq!(ring.try_recv().map(|e| e.value), Some("1".to_string()));
        assert_eq!(queue.try_recv().map(|e| e.value), Some("1".to_string()));

        relay().remove(handle);
    }
}
