use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

use crate::entity::{Entity, EntityState};
use crate::error::{EngineError, InvalidArgumentKind};
use crate::queue::{DeferredQueue, FutureQueue};

use super::listener::{ClockListeners, ClockTickDebouncer, EventListeners, PausedListeners};
use super::{SharedControl, Simulation};

/// Default minimum time between distinct events, matching the legacy
/// constructor default named in `spec.md` §6.
pub const DEFAULT_MIN_TIME_BETWEEN_EVENTS: f64 = 0.1;

/// Builder for a [`Simulation`].
///
/// Mirrors the teacher's `SimInit`: assemble participants with
/// [`add_entity`](Self::add_entity), then call [`build`](Self::build) to
/// obtain the runnable [`Simulation`]. Unlike the teacher, `build` does not
/// itself start the simulation — `spec.md` §4.2 draws a hard line between
/// `Initial` and `Running`, and `Simulation::start` is where that
/// transition (and its "already started" failure mode) lives.
pub struct SimInit {
    entities: Vec<(String, Box<dyn Entity>)>,
    start_calendar: f64,
    min_time_between_events: f64,
}

impl SimInit {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            start_calendar: 0.0,
            min_time_between_events: DEFAULT_MIN_TIME_BETWEEN_EVENTS,
        }
    }

    /// Sets the simulation's starting clock value (default `0.0`).
    pub fn with_start_calendar(mut self, start_calendar: f64) -> Self {
        self.start_calendar = start_calendar;
        self
    }

    /// Sets the minimum time between events (default
    /// [`DEFAULT_MIN_TIME_BETWEEN_EVENTS`]). Must be positive.
    pub fn with_min_time_between_events(mut self, min_time_between_events: f64) -> Self {
        self.min_time_between_events = min_time_between_events;
        self
    }

    /// Registers an entity under `name`. Entities are assigned ids in
    /// registration order, starting at `0`.
    pub fn add_entity(mut self, name: impl Into<String>, entity: impl Entity + 'static) -> Self {
        self.entities.push((name.into(), Box::new(entity)));
        self
    }

    /// Builds the [`Simulation`]. Fails if `min_time_between_events` is not
    /// positive.
    pub fn build(self) -> Result<Simulation, EngineError> {
        if self.min_time_between_events <= 0.0 {
            return Err(EngineError::InvalidArgument(
                InvalidArgumentKind::NonPositiveMinTimeBetweenEvents,
            ));
        }

        let mut simulation = Simulation {
            entities: Vec::new(),
            names: Vec::new(),
            name_to_id: HashMap::new(),
            states: Vec::new(),
            predicates: Vec::new(),
            event_buffers: Vec::new(),
            future_queue: FutureQueue::new(),
            deferred_queue: DeferredQueue::new(),
            pending_creations: HashMap::new(),
            next_creation_key: 0,
            clock: self.start_calendar,
            min_time_between_events: self.min_time_between_events,
            already_run_once: false,
            shared: Arc::new(Mutex::new(SharedControl::new())),
            clock_mirror: Arc::new(AtomicU64::new(self.start_calendar.to_bits())),
            event_listeners: EventListeners::default(),
            clock_listeners: ClockListeners::default(),
            paused_listeners: PausedListeners::default(),
            clock_debouncer: ClockTickDebouncer::default(),
        };

        for (name, entity) in self.entities {
            simulation.entities.push(Some(entity));
            simulation.names.push(name.clone());
            simulation.name_to_id.insert(name, simulation.entities.len() as i64 - 1);
            simulation.states.push(EntityState::Runnable);
            simulation.predicates.push(None);
            simulation.event_buffers.push(None);
        }

        Ok(simulation)
    }
}

impl Default for SimInit {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimInit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimInit")
            .field("entities", &self.entities.len())
            .finish_non_exhaustive()
    }
}
