//! Immutable scheduled-interaction records.
//!
//! An [`Event`] is created once, inserted into the [`crate::queue::FutureQueue`]
//! or [`crate::queue::DeferredQueue`], and never mutated afterwards — the
//! engine only ever moves events between queues or hands out `&Event`
//! references to listeners and entities.

use std::any::Any;
use std::sync::Arc;

use crate::entity::EntityId;

/// Tag value that bypasses an entity's wait predicate ("urgent wake").
///
/// Replicated literally from the source system: no documented rationale is
/// given for this specific value, only that `SEND` events carrying it must
/// be delivered regardless of what predicate the destination is waiting on.
pub const URGENT_TAG: i64 = 9999;

/// The discriminant of an [`Event`], mirroring the sum type described in
/// `spec.md` §9 ("Tagged event variants").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Deliver a message from `source` to `destination`.
    Send,
    /// `destination`'s payload is a new entity to register and start.
    Create,
    /// `source` was holding and its hold delay has elapsed.
    HoldDone,
    /// Sentinel "no kind" value; processing one is always an error.
    Null,
}

/// Opaque payload carried by an [`Event`].
///
/// Entities downcast this via [`Payload::downcast_ref`] to recover the
/// concrete message type they expect for a given `tag`.
#[derive(Clone)]
pub struct Payload(Option<Arc<dyn Any + Send + Sync>>);

impl Payload {
    pub fn none() -> Self {
        Payload(None)
    }

    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Payload(Some(Arc::new(value)))
    }

    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload")
            .field("present", &self.0.is_some())
            .finish()
    }
}

/// A scheduled interaction between two entities at a simulated instant.
///
/// Ordering is defined on `(time, serial)` ascending — see
/// [`crate::queue::FutureQueue`] for the total order this participates in.
#[derive(Debug, Clone)]
pub struct Event {
    pub time: f64,
    pub serial: i64,
    pub source: EntityId,
    pub destination: EntityId,
    pub tag: i64,
    pub payload: Payload,
    pub kind: EventKind,
}

impl Event {
    pub fn new(
        time: f64,
        serial: i64,
        source: EntityId,
        destination: EntityId,
        tag: i64,
        payload: Payload,
        kind: EventKind,
    ) -> Self {
        Self {
            time,
            serial,
            source,
            destination,
            tag,
            payload,
            kind,
        }
    }

    pub fn is_urgent(&self) -> bool {
        self.tag == URGENT_TAG
    }
}
