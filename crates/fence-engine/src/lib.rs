//! # fence-engine
//!
//! Epoch evaluation for Fenceline.
//!
//! - [`ZoneRegistry`] holds the validated zone snapshot and answers exact
//!   containment queries.
//! - [`CounterStore`] keeps the per-(vehicle, zone) visit tallies.
//! - [`AssignmentEngine`] resolves every indexed vehicle to at most one zone
//!   on a rayon pool.
//! - [`EpochRunner`] drives one epoch end to end against the boundary traits
//!   in `fence_core::boundary`, with a single-flight guard and bounded sink
//!   writes.
//! - [`EpochLock`] keeps epochs from overlapping across processes that share
//!   a store.
//! - [`Scheduler`] runs epochs on a fixed cadence and on demand.
//!
//! The `test-support` feature exposes `MemoryStore`, an in-process
//! implementation of every boundary trait with fault injection.

mod counters;
mod engine;
mod error;
mod lock;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod registry;
mod runner;
mod scheduler;

pub use counters::CounterStore;
pub use engine::AssignmentEngine;
pub use error::{CounterError, EngineError};
pub use lock::EpochLock;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;
pub use registry::{LoadReport, ZoneRegistry, ZoneSnapshot};
pub use runner::{EpochReport, EpochRun, EpochRunner};
pub use scheduler::{Scheduler, SchedulerHandle};
