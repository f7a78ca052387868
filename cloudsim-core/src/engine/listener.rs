//! Pluggable observers for event-processed / clock-tick / paused
//! notifications (`spec.md` §4.2 "Listener notifications").
//!
//! Registries are sets keyed by identity (duplicates suppressed, removal by
//! identity reports whether anything was removed) and are iterated over a
//! snapshot so a listener may itself add/remove listeners without the engine
//! observing a torn iteration (`spec.md` §5, "Shared resources").

use std::sync::Arc;

use crate::event::Event;

/// Opaque handle returned on registration, usable for later removal.
pub type ListenerId = u64;

type EventListenerFn = dyn Fn(&Event) + Send + Sync;
type ClockListenerFn = dyn Fn(f64) + Send + Sync;
type PausedListenerFn = dyn Fn() + Send + Sync;

struct Slot<F: ?Sized> {
    id: ListenerId,
    callback: Arc<F>,
}

/// A registry of callbacks, identified by an opaque [`ListenerId`].
pub(crate) struct ListenerRegistry<F: ?Sized> {
    slots: Vec<Slot<F>>,
    next_id: ListenerId,
}

impl<F: ?Sized> Default for ListenerRegistry<F> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }
}

impl<F: ?Sized> ListenerRegistry<F> {
    pub fn add(&mut self, callback: Arc<F>) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.push(Slot { id, callback });
        id
    }

    /// Returns whether a listener with this id was present and removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|s| s.id != id);
        self.slots.len() != before
    }

    /// Snapshots the current callbacks for iteration.
    fn snapshot(&self) -> Vec<Arc<F>> {
        self.slots.iter().map(|s| s.callback.clone()).collect()
    }
}

impl ListenerRegistry<EventListenerFn> {
    pub fn notify(&self, event: &Event) {
        for cb in self.snapshot() {
            cb(event);
        }
    }
}

impl ListenerRegistry<ClockListenerFn> {
    pub fn notify(&self, time: f64) {
        for cb in self.snapshot() {
            cb(time);
        }
    }
}

impl ListenerRegistry<PausedListenerFn> {
    pub fn notify(&self) {
        for cb in self.snapshot() {
            cb();
        }
    }
}

/// Debounces clock-tick notifications so a distinct clock value fires the
/// listener exactly once, even across a same-time event burst.
///
/// Mirrors the source system's 2-slot circular buffer
/// (`spec.md` §9, "Open questions") with a single `Option<f64>` standing in
/// for "the last clock value already notified" — equivalent behavior, one
/// slot fewer since only the immediately preceding value is ever relevant
/// here (the engine drains same-time bursts before checking again).
#[derive(Default)]
pub(crate) struct ClockTickDebouncer {
    last_notified: Option<f64>,
}

impl ClockTickDebouncer {
    pub fn should_notify(&mut self, time: f64) -> bool {
        if self.last_notified == Some(time) {
            false
        } else {
            self.last_notified = Some(time);
            true
        }
    }
}

pub(crate) type EventListeners = ListenerRegistry<EventListenerFn>;
pub(crate) type ClockListeners = ListenerRegistry<ClockListenerFn>;
pub(crate) type PausedListeners = ListenerRegistry<PausedListenerFn>;
