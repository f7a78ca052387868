//! Discrete-event simulation engine.
//!
//! This module contains the [`Simulation`] run loop, the [`SimInit`]
//! builder, the per-callback [`EngineContext`] handle, and the
//! [`SimController`] used to drive pause/resume/terminate/abort from outside
//! the run loop — mirroring the teacher's `simulation.rs` /
//! `simulation/sim_init.rs` split: a builder that assembles participants,
//! handed off to a runtime object that owns the clock and a scheduler queue.
//!
//! # Simulation lifecycle
//!
//! 1. Instantiate entities.
//! 2. Register them with a [`SimInit`] builder.
//! 3. Call [`SimInit::build`] to obtain a [`Simulation`] (state `Initial`).
//! 4. Call [`Simulation::start`] to run entities' `start()` hooks and drive
//!    the main loop to completion (or until `pause`/`terminate`/`abort`).
//!
//! # Practical considerations
//!
//! ## Pause is the one cross-thread seam
//!
//! Everything else about this engine is single-threaded and cooperative
//! (`spec.md` §5): entities only ever suspend themselves via `wait`/`hold`,
//! never block on I/O, and the engine never runs two entities concurrently.
//! The sole exception is `pause`: once the run loop enters `Paused` it spins
//! on a shared, lock-protected flag sleeping ~100ms between checks, waiting
//! for a [`SimController::resume`] call issued from another thread. Calling
//! `pause`/`resume`/`terminate` from the same thread that is *inside*
//! `start()` is impossible by construction (that thread is blocked in the
//! loop) — use a [`SimController`] obtained before calling `start()`.
//!
//! ## Same-time event batches are not a snapshot
//!
//! Per `spec.md` §4.2, new events scheduled while processing a same-time
//! batch join that batch only if their own time still equals the batch's
//! time. This engine does not pre-capture the batch: it re-peeks the future
//! queue's earliest time after every single event it processes, which is
//! equivalent and cheaper than materializing a candidate list up front.

mod context;
mod listener;
mod sim_init;

pub use context::EngineContext;
pub use listener::ListenerId;
pub use sim_init::SimInit;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::entity::{Entity, EntityId, EntityState, Predicate};
use crate::error::{EngineError, IllegalStateKind, InvalidArgumentKind};
use crate::event::{Event, EventKind};
use crate::queue::{DeferredQueue, FutureQueue};

use listener::{ClockListeners, ClockTickDebouncer, EventListeners, PausedListeners};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

/// Duration the run loop sleeps between checks while `Paused`.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimState {
    Initial,
    Running,
    Paused,
    Finished,
}

struct SharedControl {
    state: SimState,
    pause_at: Option<f64>,
    terminate_requested: bool,
    terminate_at: Option<f64>,
    abort_requested: bool,
}

impl SharedControl {
    fn new() -> Self {
        Self {
            state: SimState::Initial,
            pause_at: None,
            terminate_requested: false,
            terminate_at: None,
            abort_requested: false,
        }
    }
}

/// A cloneable, `Send + Sync` handle for driving a [`Simulation`] from
/// outside the thread currently blocked in [`Simulation::start`].
///
/// This is the sanctioned multi-threaded use of the engine (`spec.md` §5):
/// obtain a controller before calling `start`, hand it to another thread,
/// and use it to `pause`/`resume`/`terminate`/`abort` the run.
#[derive(Clone)]
pub struct SimController {
    shared: Arc<Mutex<SharedControl>>,
    clock_mirror: Arc<AtomicU64>,
}

impl SimController {
    fn clock(&self) -> f64 {
        f64::from_bits(self.clock_mirror.load(Ordering::Acquire))
    }

    /// Schedules a pause at simulated time `t` (current clock if `None`).
    /// Returns `false` if `t` is before the current clock.
    pub fn pause(&self, t: Option<f64>) -> bool {
        let mut shared = self.shared.lock().unwrap();
        let target = t.unwrap_or_else(|| self.clock());
        if target < self.clock() {
            return false;
        }
        shared.pause_at = Some(target);
        true
    }

    /// Clears the pause latch. Returns whether the simulation was paused.
    pub fn resume(&self) -> bool {
        let mut shared = self.shared.lock().unwrap();
        if shared.state != SimState::Paused {
            return false;
        }
        shared.state = SimState::Running;
        if let Some(pause_at) = shared.pause_at {
            if self.clock() >= pause_at {
                shared.pause_at = None;
            }
        }
        true
    }

    /// Requests termination at the next loop iteration. Returns whether the
    /// simulation was running.
    pub fn terminate(&self) -> bool {
        let mut shared = self.shared.lock().unwrap();
        if shared.state != SimState::Running && shared.state != SimState::Paused {
            return false;
        }
        shared.terminate_requested = true;
        true
    }

    /// Schedules termination at the first clock value `>= t`. Returns
    /// `false` if `t <= current clock`.
    pub fn terminate_at(&self, t: f64) -> bool {
        let mut shared = self.shared.lock().unwrap();
        if t <= self.clock() {
            return false;
        }
        shared.terminate_at = Some(t);
        true
    }

    /// Requests an immediate, ungraceful termination.
    pub fn abort(&self) {
        self.shared.lock().unwrap().abort_requested = true;
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().unwrap().state == SimState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().unwrap().state == SimState::Paused
    }
}

/// The discrete-event simulation environment.
///
/// Owns the clock, both event queues, the entity registry, and the listener
/// registries, and drives the run loop described in `spec.md` §4.2.
pub struct Simulation {
    entities: Vec<Option<Box<dyn Entity>>>,
    names: Vec<String>,
    name_to_id: HashMap<String, EntityId>,
    states: Vec<EntityState>,
    predicates: Vec<Option<Predicate>>,
    event_buffers: Vec<Option<Event>>,
    future_queue: FutureQueue,
    deferred_queue: DeferredQueue,
    pending_creations: HashMap<u64, (String, Box<dyn Entity>)>,
    next_creation_key: u64,
    clock: f64,
    #[allow(dead_code)]
    min_time_between_events: f64,
    already_run_once: bool,
    shared: Arc<Mutex<SharedControl>>,
    clock_mirror: Arc<AtomicU64>,
    event_listeners: EventListeners,
    clock_listeners: ClockListeners,
    paused_listeners: PausedListeners,
    clock_debouncer: ClockTickDebouncer,
}

impl Simulation {
    fn set_clock(&mut self, t: f64) {
        self.clock = t;
        self.clock_mirror.store(t.to_bits(), Ordering::Release);
    }

    /// A cloneable handle for pausing/resuming/terminating this simulation
    /// from another thread.
    pub fn controller(&self) -> SimController {
        SimController {
            shared: self.shared.clone(),
            clock_mirror: self.clock_mirror.clone(),
        }
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().unwrap().state == SimState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().unwrap().state == SimState::Paused
    }

    pub fn get_num_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn get_entity_id(&self, name: &str) -> Option<EntityId> {
        self.name_to_id.get(name).copied()
    }

    pub fn get_entity_name(&self, id: EntityId) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    pub fn add_event_listener<F>(&mut self, callback: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.event_listeners.add(Arc::new(callback))
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.event_listeners.remove(id)
    }

    pub fn add_clock_listener<F>(&mut self, callback: F) -> ListenerId
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.clock_listeners.add(Arc::new(callback))
    }

    pub fn remove_clock_listener(&mut self, id: ListenerId) -> bool {
        self.clock_listeners.remove(id)
    }

    pub fn add_paused_listener<F>(&mut self, callback: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.paused_listeners.add(Arc::new(callback))
    }

    pub fn remove_paused_listener(&mut self, id: ListenerId) -> bool {
        self.paused_listeners.remove(id)
    }

    fn context_for(&mut self, id: EntityId) -> EngineContext<'_> {
        EngineContext {
            self_id: id,
            clock: self.clock,
            future_queue: &mut self.future_queue,
            deferred_queue: &mut self.deferred_queue,
            entity_states: &mut self.states,
            entity_predicates: &mut self.predicates,
            event_buffers: &mut self.event_buffers,
            pending_creations: &mut self.pending_creations,
            next_creation_key: &mut self.next_creation_key,
        }
    }

    fn start_entity(&mut self, id: EntityId) {
        let mut entity = self.entities[id as usize]
            .take()
            .expect("entity slot must be occupied");
        {
            let mut ctx = self.context_for(id);
            entity.start(&mut ctx);
        }
        self.entities[id as usize] = Some(entity);
    }

    fn run_entity(&mut self, id: EntityId) {
        let mut entity = self.entities[id as usize]
            .take()
            .expect("entity slot must be occupied");
        {
            let mut ctx = self.context_for(id);
            entity.run(&mut ctx);
        }
        self.entities[id as usize] = Some(entity);
    }

    fn shutdown_entity(&mut self, id: EntityId) {
        let mut entity = self.entities[id as usize]
            .take()
            .expect("entity slot must be occupied");
        {
            let mut ctx = self.context_for(id);
            entity.shutdown(&mut ctx);
        }
        self.entities[id as usize] = Some(entity);
    }

    fn register_entity(&mut self, name: String, entity: Box<dyn Entity>) -> EntityId {
        let id = self.entities.len() as EntityId;
        self.entities.push(Some(entity));
        self.names.push(name.clone());
        self.name_to_id.insert(name, id);
        self.states.push(EntityState::Runnable);
        self.predicates.push(None);
        self.event_buffers.push(None);
        id
    }

    /// Runs entities' `start()` hooks and drives the main loop to
    /// completion. Returns the final simulation clock.
    ///
    /// Fails with `IllegalState` if called a second time.
    pub fn start(&mut self) -> Result<f64, EngineError> {
        if self.already_run_once {
            return Err(EngineError::IllegalState(IllegalStateKind::AlreadyStarted));
        }
        self.already_run_once = true;

        for id in 0..self.entities.len() as EntityId {
            self.start_entity(id);
        }
        self.shared.lock().unwrap().state = SimState::Running;
        #[cfg(feature = "tracing")]
        debug!(entities = self.entities.len(), "simulation started");

        if self.clock_debouncer.should_notify(self.clock) {
            self.clock_listeners.notify(self.clock);
        }

        self.run_loop()?;

        Ok(self.clock)
    }

    fn run_loop(&mut self) -> Result<(), EngineError> {
        loop {
            for id in 0..self.entities.len() as EntityId {
                if self.states[id as usize] == EntityState::Runnable {
                    self.run_entity(id);
                }
            }

            let queue_was_empty = self.future_queue.is_empty();
            if !queue_was_empty {
                let batch_time = self.future_queue.peek_time().unwrap();
                self.set_clock(batch_time);
                loop {
                    let event = self.future_queue.pop_first().unwrap();
                    self.process_event(event)?;
                    match self.future_queue.peek_time() {
                        Some(t) if t == batch_time => continue,
                        _ => break,
                    }
                }
                if self.clock_debouncer.should_notify(batch_time) {
                    self.clock_listeners.notify(batch_time);
                }
            }

            let (abort_requested, terminate_requested, terminate_at_reached) = {
                let shared = self.shared.lock().unwrap();
                (
                    shared.abort_requested,
                    shared.terminate_requested,
                    shared.terminate_at.is_some_and(|t| self.clock >= t),
                )
            };
            if abort_requested {
                #[cfg(feature = "tracing")]
                debug!(clock = self.clock, "simulation aborted");
                self.shared.lock().unwrap().state = SimState::Finished;
                self.finish(true);
                return Ok(());
            }
            if terminate_requested || terminate_at_reached {
                self.shared.lock().unwrap().state = SimState::Finished;
                break;
            }

            let pause_trigger = {
                let shared = self.shared.lock().unwrap();
                shared.pause_at.map(|p| {
                    let next_is_at_or_past = self
                        .future_queue
                        .peek_time()
                        .map(|t| t >= p)
                        .unwrap_or(self.clock >= p);
                    (p, next_is_at_or_past)
                })
            };
            let mut paused_this_iteration = false;
            if let Some((pause_at, ready)) = pause_trigger {
                if ready {
                    paused_this_iteration = true;
                    self.set_clock(pause_at);
                    self.shared.lock().unwrap().state = SimState::Paused;
                    #[cfg(feature = "tracing")]
                    debug!(clock = self.clock, "simulation paused");
                    self.paused_listeners.notify();
                    loop {
                        if self.shared.lock().unwrap().state != SimState::Paused {
                            break;
                        }
                        std::thread::sleep(PAUSE_POLL_INTERVAL);
                    }
                }
            }

            // Natural termination (`spec.md` §4.2 main-loop step 2) only
            // applies once a possible same-clock-value pause has had its
            // chance to fire — otherwise case (b) of step 5 ("queue is
            // empty and clock >= pauseAt") can never be reached, since an
            // empty queue can never produce a future batch to pause against.
            if queue_was_empty && !paused_this_iteration {
                self.shared.lock().unwrap().state = SimState::Finished;
                break;
            }
        }

        self.finish(false);
        Ok(())
    }

    fn finish(&mut self, aborted: bool) {
        if !aborted {
            for id in 0..self.entities.len() as EntityId {
                if self.states[id as usize] != EntityState::Finished {
                    self.run_entity(id);
                }
            }
        }
        for id in 0..self.entities.len() as EntityId {
            self.shutdown_entity(id);
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), EngineError> {
        if event.time < self.clock {
            return Err(EngineError::IllegalState(IllegalStateKind::PastEvent));
        }
        match event.kind {
            EventKind::Null => {
                return Err(EngineError::InvalidArgument(
                    InvalidArgumentKind::NullEventKind,
                ))
            }
            EventKind::Create => {
                let key = *event
                    .payload
                    .downcast_ref::<u64>()
                    .expect("CREATE payload must carry a pending-creation key");
                let (name, entity) = self
                    .pending_creations
                    .remove(&key)
                    .expect("pending creation must exist");
                let id = self.register_entity(name, entity);
                self.start_entity(id);
                #[cfg(feature = "tracing")]
                trace!(entity = id, "entity created");
            }
            EventKind::HoldDone => {
                let src = event.source as usize;
                if src < self.states.len() {
                    self.states[src] = EntityState::Runnable;
                }
            }
            EventKind::Send => {
                let dest = event.destination;
                if dest >= 0 && (dest as usize) < self.states.len() {
                    let dest_idx = dest as usize;
                    let is_waiting = self.states[dest_idx] == EntityState::Waiting;
                    let matched = is_waiting
                        && (event.is_urgent()
                            || self.predicates[dest_idx]
                                .as_ref()
                                .map(|p| p(&event))
                                .unwrap_or(true));
                    if matched {
                        self.event_buffers[dest_idx] = Some(event.clone());
                        self.states[dest_idx] = EntityState::Runnable;
                        self.predicates[dest_idx] = None;
                    } else {
                        self.deferred_queue.push(event.clone());
                    }
                } else {
                    self.deferred_queue.push(event.clone());
                }
            }
        }
        #[cfg(feature = "tracing")]
        trace!(time = event.time, tag = event.tag, "event processed");
        self.event_listeners.notify(&event);
        Ok(())
    }
}
