//! Error types for the simulation engine and the cloudlet scheduler.
//!
//! Both error enums are narrow on purpose: they cover exactly the failure
//! kinds `spec.md` §7 names as synchronous, propagating errors. Lookups that
//! the spec treats as non-fatal (cloudlet-id misses, predicate misses) return
//! `Option`/NULL sentinels instead of an error variant here.

use std::error::Error;
use std::fmt;

/// Errors raised by [`crate::engine::Simulation`] operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EngineError {
    /// A negative delay, a null/unknown destination, a NULL event kind, or a
    /// non-positive `min_time_between_events`.
    InvalidArgument(InvalidArgumentKind),
    /// `start` called a second time, or an event scheduled in the past of the
    /// current clock was processed.
    IllegalState(IllegalStateKind),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InvalidArgumentKind {
    NegativeDelay,
    UnknownDestination,
    NullEntity,
    NullEventKind,
    NonPositiveMinTimeBetweenEvents,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IllegalStateKind {
    AlreadyStarted,
    PastEvent,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidArgument(kind) => {
                write!(f, "invalid argument: {}", kind.message())
            }
            EngineError::IllegalState(kind) => write!(f, "illegal state: {}", kind.message()),
        }
    }
}

impl InvalidArgumentKind {
    fn message(&self) -> &'static str {
        match self {
            InvalidArgumentKind::NegativeDelay => "delay must be non-negative",
            InvalidArgumentKind::UnknownDestination => "destination entity does not exist",
            InvalidArgumentKind::NullEntity => "entity must not be null",
            InvalidArgumentKind::NullEventKind => "event kind must not be NULL",
            InvalidArgumentKind::NonPositiveMinTimeBetweenEvents => {
                "min_time_between_events must be positive"
            }
        }
    }
}

impl IllegalStateKind {
    fn message(&self) -> &'static str {
        match self {
            IllegalStateKind::AlreadyStarted => "the simulation has already been started",
            IllegalStateKind::PastEvent => "event scheduled time is before the current clock",
        }
    }
}

impl Error for EngineError {}

/// Errors raised by [`crate::cloudlet::CloudletScheduler`] operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SchedulerError {
    /// A cloudlet id was required but is unknown to the scheduler.
    UnknownCloudlet,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::UnknownCloudlet => write!(f, "unknown cloudlet id"),
        }
    }
}

impl Error for SchedulerError {}
