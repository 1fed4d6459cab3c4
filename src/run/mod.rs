//! Tick-driven run engine.
//!
//! Layered bottom-up: [`step`] resolves a single step across ticks,
//! [`phase`] walks one phase's steps in order, [`controller`] chains
//! phases into a preset run with cancellation and progress reporting,
//! and [`preset`] plans which phases a target transition needs.
//!
//! Nothing in this module blocks. The host owns the clock: it calls
//! `tick` with the elapsed interval and the engine advances by at most
//! one step evaluation.

pub mod controller;
pub mod phase;
pub mod preset;
pub mod step;

pub use controller::{PresetController, RunId, RunProgress, RunStatus};
pub use phase::{PhaseExecution, PhaseTick, StepOutcome};
pub use preset::PresetTarget;
pub use step::{StepExecution, StepResult};

use std::time::Duration;

/// Duration as whole milliseconds, saturating for display.
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
