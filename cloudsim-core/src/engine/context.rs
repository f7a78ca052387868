//! The handle entity callbacks use to talk back to the engine.
//!
//! `spec.md` §9 ("Cyclic references") calls for entity callbacks to receive
//! a mutable engine reference as a parameter rather than holding one in a
//! field. [`EngineContext`] is exactly that parameter: a short-lived borrow
//! of the subset of [`super::Simulation`] state an entity is allowed to
//! touch during its own `run`/`start`/`shutdown` call.

use crate::entity::{EntityId, EntityState, Predicate, BROADCAST};
use crate::error::{EngineError, InvalidArgumentKind};
use crate::event::{Event, EventKind, Payload};
use crate::queue::{DeferredQueue, FutureQueue};

/// Mutable access to engine state, scoped to the lifetime of one entity
/// callback invocation.
pub struct EngineContext<'a> {
    pub(super) self_id: EntityId,
    pub(super) clock: f64,
    pub(super) future_queue: &'a mut FutureQueue,
    pub(super) deferred_queue: &'a mut DeferredQueue,
    pub(super) entity_states: &'a mut [EntityState],
    pub(super) entity_predicates: &'a mut [Option<Predicate>],
    pub(super) event_buffers: &'a mut [Option<Event>],
    pub(super) pending_creations: &'a mut std::collections::HashMap<u64, (String, Box<dyn crate::entity::Entity>)>,
    pub(super) next_creation_key: &'a mut u64,
}

impl<'a> EngineContext<'a> {
    /// The entity this context was handed to.
    pub fn self_id(&self) -> EntityId {
        self.self_id
    }

    /// Current simulation clock.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// `spec.md` §7 lists a null/unknown destination as a scheduling-time
    /// argument error alongside negative delay. `BROADCAST` (-1) is the
    /// one destination value that is always valid, per `spec.md` §3.
    fn validate_destination(&self, destination: EntityId) -> Result<(), EngineError> {
        if destination == BROADCAST {
            return Ok(());
        }
        if destination < 0 || destination as usize >= self.entity_states.len() {
            return Err(EngineError::InvalidArgument(
                InvalidArgumentKind::UnknownDestination,
            ));
        }
        Ok(())
    }

    /// Schedules a `SEND` event at `clock + delay`.
    ///
    /// Fails with `InvalidArgument` if `delay < 0` or `destination` is not a
    /// registered entity (and not `BROADCAST`).
    pub fn schedule(
        &mut self,
        destination: EntityId,
        delay: f64,
        tag: i64,
        payload: Payload,
    ) -> Result<(), EngineError> {
        if delay < 0.0 {
            return Err(EngineError::InvalidArgument(
                InvalidArgumentKind::NegativeDelay,
            ));
        }
        self.validate_destination(destination)?;
        let event = Event::new(
            self.clock + delay,
            0,
            self.self_id,
            destination,
            tag,
            payload,
            EventKind::Send,
        );
        self.future_queue.add_event(event);
        Ok(())
    }

    /// Like [`schedule`](Self::schedule), but the event jumps to the head of
    /// its same-time group.
    pub fn schedule_first(
        &mut self,
        destination: EntityId,
        delay: f64,
        tag: i64,
        payload: Payload,
    ) -> Result<(), EngineError> {
        if delay < 0.0 {
            return Err(EngineError::InvalidArgument(
                InvalidArgumentKind::NegativeDelay,
            ));
        }
        self.validate_destination(destination)?;
        let event = Event::new(
            self.clock + delay,
            0,
            self.self_id,
            destination,
            tag,
            payload,
            EventKind::Send,
        );
        self.future_queue.add_event_first(event);
        Ok(())
    }

    /// Schedules creation of a new entity after `delay`. The entity is
    /// registered and started when the `CREATE` event is processed.
    pub fn schedule_create(
        &mut self,
        delay: f64,
        name: impl Into<String>,
        entity: Box<dyn crate::entity::Entity>,
    ) -> Result<(), EngineError> {
        if delay < 0.0 {
            return Err(EngineError::InvalidArgument(
                InvalidArgumentKind::NegativeDelay,
            ));
        }
        let key = *self.next_creation_key;
        *self.next_creation_key += 1;
        self.pending_creations.insert(key, (name.into(), entity));
        let event = Event::new(
            self.clock + delay,
            0,
            self.self_id,
            self.self_id,
            0,
            Payload::new(key),
            EventKind::Create,
        );
        self.future_queue.add_event(event);
        Ok(())
    }

    /// Marks the calling entity `Waiting` on `predicate` (`None` = SIM_ANY).
    pub fn wait(&mut self, predicate: Option<Predicate>) {
        self.entity_states[self.self_id as usize] = EntityState::Waiting;
        self.entity_predicates[self.self_id as usize] = predicate;
    }

    /// Takes the most recently delivered event out of the calling entity's
    /// single-slot inbox, if any.
    pub fn take_event(&mut self) -> Option<Event> {
        self.event_buffers[self.self_id as usize].take()
    }

    /// Scans the deferred queue for the first event addressed to `dest`
    /// matching `pred`, removing and returning it.
    pub fn select(
        &mut self,
        dest: EntityId,
        pred: impl Fn(&Event) -> bool,
    ) -> Option<Event> {
        self.deferred_queue.find_first(dest, pred)
    }

    /// Counts deferred events addressed to `dest` matching `pred`.
    pub fn waiting(&self, dest: EntityId, pred: impl Fn(&Event) -> bool) -> usize {
        self.deferred_queue.count_matching(dest, pred)
    }

    /// Removes the first future event scheduled by the calling entity that
    /// matches `pred`.
    pub fn cancel(&mut self, pred: impl Fn(&Event) -> bool) -> Option<Event> {
        let self_id = self.self_id;
        self.future_queue
            .remove_first_matching(|e| e.source == self_id && pred(e))
    }

    /// Removes all future events scheduled by the calling entity matching
    /// `pred`, returning how many were removed.
    pub fn cancel_all(&mut self, pred: impl Fn(&Event) -> bool) -> usize {
        let self_id = self.self_id;
        self.future_queue
            .remove_all_matching(|e| e.source == self_id && pred(e))
    }

    /// Marks the calling entity `Holding` and schedules its `HOLD_DONE` at
    /// `clock + delay`.
    pub fn hold(&mut self, delay: f64) -> Result<(), EngineError> {
        if delay < 0.0 {
            return Err(EngineError::InvalidArgument(
                InvalidArgumentKind::NegativeDelay,
            ));
        }
        self.entity_states[self.self_id as usize] = EntityState::Holding;
        let event = Event::new(
            self.clock + delay,
            0,
            self.self_id,
            self.self_id,
            0,
            Payload::none(),
            EventKind::HoldDone,
        );
        self.future_queue.add_event(event);
        Ok(())
    }

    /// Alias for [`hold`](Self::hold), matching the source API's naming
    /// (`pauseEntity`/`holdEntity` are documented synonyms, `spec.md` §4.2).
    pub fn pause_entity(&mut self, delay: f64) -> Result<(), EngineError> {
        self.hold(delay)
    }
}
