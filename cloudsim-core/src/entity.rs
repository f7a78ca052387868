//! Cooperative entities: the actors a [`crate::engine::Simulation`] drives.
//!
//! Entities never hold a reference to the engine. Per `spec.md` §9
//! ("Cyclic references"), the engine owns the entity table and callbacks are
//! handed a [`crate::engine::EngineContext`] parameter for the duration of the
//! call instead — this sidesteps the aliasing problem of an entity storing a
//! live borrow of its own owner.

use std::sync::Arc;

use crate::engine::EngineContext;
use crate::event::Event;

/// Stable identifier assigned on registration; equals the entity's insertion
/// index into the engine's entity table.
///
/// `-1` is reserved as the "no destination" / broadcast sentinel mentioned in
/// `spec.md` §3, though nothing in this core emits it.
pub type EntityId = i64;

pub const BROADCAST: EntityId = -1;

/// Lifecycle state of a registered entity, mutated only by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Runnable,
    Waiting,
    Holding,
    Finished,
}

/// A predicate an entity is blocked on while `Waiting`.
///
/// `None` is the `SIM_ANY` sentinel: match any event at all.
pub type Predicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// A cooperative actor with a state machine and a single-slot inbox.
///
/// Implementations read `event_buffer` (set by the engine before `run` is
/// invoked after a matched wait) and drive their own state machine forward:
/// "wait for predicate, take one step, re-arm a wait" (`spec.md` §9,
/// "Predicate-on-wait as continuation").
pub trait Entity: Send {
    /// Invoked once by the engine when the entity is registered and the
    /// simulation starts (or, for an entity created mid-run, as soon as it
    /// is registered via a `CREATE` event).
    fn start(&mut self, ctx: &mut EngineContext<'_>);

    /// Invoked by the engine's main loop whenever this entity is
    /// `Runnable`. May schedule events and/or re-arm a wait, changing its
    /// own state via `ctx`.
    fn run(&mut self, ctx: &mut EngineContext<'_>);

    /// Invoked once when the simulation is finishing, after the run loop
    /// exits (skipped on `abort`).
    fn shutdown(&mut self, ctx: &mut EngineContext<'_>);
}

