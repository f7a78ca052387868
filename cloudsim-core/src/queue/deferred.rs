//! The deferred queue: events delivered to an entity that was not waiting,
//! or whose predicate did not match, held in arrival order.

use crate::entity::EntityId;
use crate::event::Event;

/// Insertion-ordered store of events an entity has not yet consumed.
#[derive(Default)]
pub struct DeferredQueue {
    events: Vec<Event>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Removes and returns the first event addressed to `dest` matching
    /// `pred`, scanning in arrival order. Used by `select`.
    pub fn find_first(
        &mut self,
        dest: EntityId,
        pred: impl Fn(&Event) -> bool,
    ) -> Option<Event> {
        let pos = self
            .events
            .iter()
            .position(|e| e.destination == dest && pred(e));
        pos.map(|i| self.events.remove(i))
    }

    /// Counts events addressed to `dest` matching `pred` without removing
    /// them. Used by `waiting`.
    pub fn count_matching(&self, dest: EntityId, pred: impl Fn(&Event) -> bool) -> usize {
        self.events
            .iter()
            .filter(|e| e.destination == dest && pred(e))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
