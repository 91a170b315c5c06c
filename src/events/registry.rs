//! Per-session subscriber lists and the dispatch loop.

#![allow(unsafe_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mmcore_sys as sys;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace, warn};

use super::{native, Event, PropertyChangedEvent, SessionHandle, StagePositionChangedEvent};

/// Sending half of one subscription.
pub enum Sink<E> {
    Blocking(mpsc::Sender<E>),
    DropNewest(mpsc::Sender<E>),
    DropOldest(broadcast::Sender<E>),
}

impl<E> Clone for Sink<E> {
    fn clone(&self) -> Self {
        match self {
            Sink::Blocking(tx) => Sink::Blocking(tx.clone()),
            Sink::DropNewest(tx) => Sink::DropNewest(tx.clone()),
            Sink::DropOldest(tx) => Sink::DropOldest(tx.clone()),
        }
    }
}

pub struct Subscriber<E> {
    id: u64,
    sink: Sink<E>,
    dropped: Arc<AtomicU64>,
}

impl<E> Subscriber<E> {
    pub fn new(id: u64, sink: Sink<E>, dropped: Arc<AtomicU64>) -> Self {
        Self { id, sink, dropped }
    }
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sink: self.sink.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

/// Subscribers for one event kind of one session.
pub struct ListenerList<E> {
    subscribers: Mutex<Vec<Subscriber<E>>>,
}

impl<E: Event> ListenerList<E> {
    fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, subscriber: Subscriber<E>) {
        self.subscribers.lock().push(subscriber);
    }

    pub fn remove(&self, id: u64) {
        self.subscribers.lock().retain(|s| s.id != id);
    }

    /// Hand `event` to every subscriber and return how many there were.
    ///
    /// The subscriber list is copied under the lock and delivery happens with
    /// the lock released, so subscribing or unsubscribing never waits on a
    /// stalled receiver.
    pub fn dispatch(&self, session: SessionHandle, event: E) -> usize {
        let snapshot: Vec<Subscriber<E>> = self.subscribers.lock().clone();
        if snapshot.is_empty() {
            trace!(%session, ?event, "No subscribers for event");
            return 0;
        }

        let mut closed = Vec::new();
        let mut blocking = Vec::new();

        for subscriber in &snapshot {
            match &subscriber.sink {
                Sink::DropNewest(tx) => match tx.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        let before = subscriber.dropped.fetch_add(1, Ordering::Relaxed);
                        if before == 0 {
                            warn!(%session, id = subscriber.id, "Subscriber queue full, dropping new events");
                        } else {
                            trace!(%session, id = subscriber.id, "Dropped event (queue full)");
                        }
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(subscriber.id),
                },
                Sink::DropOldest(tx) => {
                    // Only fails when the receiver is gone.
                    if tx.send(event.clone()).is_err() {
                        closed.push(subscriber.id);
                    }
                }
                Sink::Blocking(tx) => blocking.push((subscriber.id, tx)),
            }
        }

        // A lone blocking subscriber is served on the calling thread unless
        // that thread drives an async runtime, where `blocking_send` panics.
        // Several are served concurrently so one slow receiver does not delay
        // the others.
        match blocking.as_slice() {
            [] => {}
            [(id, tx)] if Handle::try_current().is_err() => {
                if tx.blocking_send(event.clone()).is_err() {
                    closed.push(*id);
                }
            }
            _ => {
                let failed: Vec<u64> = std::thread::scope(|scope| {
                    let handles: Vec<_> = blocking
                        .iter()
                        .map(|(id, tx)| {
                            let event = event.clone();
                            scope.spawn(move || tx.blocking_send(event).err().map(|_| *id))
                        })
                        .collect();
                    handles
                        .into_iter()
                        .filter_map(|handle| handle.join().ok().flatten())
                        .collect()
                });
                closed.extend(failed);
            }
        }

        if !closed.is_empty() {
            debug!(%session, count = closed.len(), "Pruning closed subscribers");
            self.subscribers.lock().retain(|s| !closed.contains(&s.id));
        }

        trace!(%session, subscribers = snapshot.len(), "Delivered event");
        snapshot.len()
    }
}

/// Everything the relay keeps for one session.
pub struct SessionListeners {
    handle: SessionHandle,
    pub(super) property_changed: ListenerList<PropertyChangedEvent>,
    pub(super) stage_position_changed: ListenerList<StagePositionChangedEvent>,
    next_id: AtomicU64,
    registered: OnceCell<()>,
}

impl SessionListeners {
    pub fn new(handle: SessionHandle) -> Self {
        Self {
            handle,
            property_changed: ListenerList::new(),
            stage_position_changed: ListenerList::new(),
            next_id: AtomicU64::new(1),
            registered: OnceCell::new(),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Install the static callback table with the core, once per session.
    pub fn register_native(&self, raw: sys::MM_Session) {
        self.registered.get_or_init(|| {
            // SAFETY: `raw` is the live handle of the session subscribing, and
            // the table is a static that outlives every session.
            unsafe { sys::MM_RegisterCallback(raw, native::callback_table()) };
            debug!(session = %self.handle, "Registered native event callbacks");
        });
    }

    /// Skip native registration, for handles that are not real sessions.
    #[cfg(test)]
    pub fn mark_registered(&self) {
        let _ = self.registered.set(());
    }
}
