//! A discrete-event simulation core for modeling cloud computing
//! infrastructure.
//!
//! This crate contains the two intertwined subsystems that make up the hard
//! engineering of such a toolkit: a deterministic, time-ordered [`engine`]
//! that drives a population of communicating [`entity`] actors forward in
//! simulated time, and a per-VM [`cloudlet`] scheduler that time-shares
//! processing elements among a dynamic population of compute jobs.
//!
//! # Simulation lifecycle
//!
//! The lifecycle of a simulation typically comprises the following stages:
//!
//! 1. instantiate [`Entity`](entity::Entity) implementations,
//! 2. register them with a [`SimInit`](engine::SimInit) builder,
//! 3. call [`SimInit::build`](engine::SimInit::build) to obtain a
//!    [`Simulation`](engine::Simulation) (state `Initial`),
//! 4. call [`Simulation::start`](engine::Simulation::start), which runs every
//!    entity's `start()` hook once and then drives the main loop — draining
//!    `Runnable` entities, processing the earliest same-time batch of
//!    scheduled events, notifying listeners, and checking
//!    pause/terminate/abort conditions — until the future queue empties or a
//!    termination condition is reached.
//!
//! Entities representing data centers typically tick their hosts on a
//! recurring schedule; each host ticks its VMs'
//! [`CloudletScheduler`](cloudlet::CloudletScheduler)s, and the estimated
//! next-completion time returned from
//! [`update_vm_processing`](cloudlet::CloudletScheduler::update_vm_processing)
//! is what the entity schedules its own next tick event against.
//!
//! # Practical considerations
//!
//! ## Pause is the one cross-thread seam
//!
//! Everything in this core is single-threaded and cooperative except for
//! pause/resume coordination — see [`engine`]'s module documentation for the
//! full rationale and the [`SimController`](engine::SimController) handle
//! that makes it safe.
//!
//! ## Same-time batches and clock-tick listeners
//!
//! Events sharing the same scheduled time are processed as one batch before
//! the clock is allowed to advance again, and a clock-tick listener fires
//! exactly once per distinct clock value reached, after that value's batch
//! has fully drained — not once per event. Code that wants to observe
//! per-event detail should use an event-processed listener instead.
//!
//! ## Units in the cloudlet scheduler
//!
//! [`Cloudlet::length`](cloudlet::Cloudlet::length) and the MIPS values
//! passed to `update_vm_processing` are both expressed in the same
//! "millions of instructions" unit, so executed-instruction accounting
//! never needs an explicit `10^6` scaling step internally — see
//! [`cloudlet::scheduler`] for the derivation.

pub mod cis;
pub mod cloudlet;
pub mod engine;
pub mod entity;
pub mod error;
pub mod event;
pub mod queue;

/// Re-exports of the surface most callers need, so that
/// `use cloudsim_core::prelude::*;` is enough to assemble and drive a
/// simulation without reaching into individual modules.
pub mod prelude {
    pub use crate::cis::CloudInformationService;
    pub use crate::cloudlet::{
        Cloudlet, CloudletExecutionInfo, CloudletId, CloudletScheduler,
        CloudletSchedulerNetworkShared, CloudletSchedulerSpaceShared,
        CloudletSchedulerTimeShared, CloudletStatus, Host, NullPacketScheduler,
        NullVmAllocationPolicy, PacketScheduler, UtilizationModel, UtilizationModelFixed,
        UtilizationModelFull, Vm, VmAllocationPolicy, NO_NEXT_EVENT,
    };
    pub use crate::engine::{EngineContext, ListenerId, SimController, SimInit, Simulation};
    pub use crate::entity::{Entity, EntityId, EntityState, Predicate, BROADCAST};
    pub use crate::error::{EngineError, IllegalStateKind, InvalidArgumentKind, SchedulerError};
    pub use crate::event::{Event, EventKind, Payload, URGENT_TAG};
}
