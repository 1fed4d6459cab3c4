//! Phase execution over an ordered step list.
//!
//! `PhaseExecution` walks one phase's steps strictly in array order,
//! evaluating at most one step per tick. A resolved step yields to the
//! next tick before its successor is entered, so per-tick work stays
//! bounded no matter how large the phase is.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::catalogue::Phase;
use crate::error::ExprError;
use crate::run::millis;
use crate::run::step::{StepExecution, StepResult};
use crate::vars::VariableStore;

/// Result of one phase tick.
#[derive(Debug)]
pub enum PhaseTick {
    /// One step was evaluated; the phase continues next tick.
    InProgress {
        /// Index of the evaluated step.
        step: usize,
        /// What the evaluation produced.
        result: StepResult,
    },
    /// Every step has resolved.
    Complete,
    /// A step failed to evaluate; the phase cannot continue.
    Aborted {
        /// Index of the failing step.
        step: usize,
        /// The evaluation error.
        error: ExprError,
    },
}

/// Terminal record for one resolved step, kept for reporting.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Index of the step within its phase.
    pub step: usize,
    /// Step display name.
    pub name: String,
    /// Panel display id (grouping tag, not an ordering key).
    pub display_id: u32,
    /// How the step resolved.
    pub result: StepResult,
    /// Wait time accumulated when it resolved.
    pub elapsed: Duration,
}

/// Execution state for one phase.
#[derive(Debug, Default)]
pub struct PhaseExecution {
    step_idx: usize,
    current: StepExecution,
    outcomes: Vec<StepOutcome>,
}

impl PhaseExecution {
    /// Fresh state positioned at the first step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the step the next tick will evaluate.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.step_idx
    }

    /// Number of steps resolved so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    /// Terminal records for the steps resolved so far.
    #[must_use]
    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    /// Whether every step of `phase` has resolved.
    #[must_use]
    pub fn is_complete(&self, phase: &Phase) -> bool {
        self.step_idx >= phase.steps.len()
    }

    /// Advances the phase by one tick against `phase`.
    ///
    /// The caller must pass the same phase on every tick of this
    /// execution. A timed-out step is logged and the phase proceeds; an
    /// evaluation failure aborts with the step left unresolved.
    pub fn tick(&mut self, phase: &Phase, vars: &dyn VariableStore, dt: Duration) -> PhaseTick {
        let Some(step) = phase.steps.get(self.step_idx) else {
            return PhaseTick::Complete;
        };

        match self.current.advance(step, vars, dt) {
            Ok(result) => {
                match result {
                    StepResult::Commanded => {
                        debug!(phase = %phase.id, step = %step.name, display_id = step.display_id, "command fired");
                    }
                    StepResult::Waiting => {
                        trace!(phase = %phase.id, step = %step.name, elapsed_ms = millis(self.current.elapsed()), "waiting");
                    }
                    StepResult::Skipped | StepResult::Satisfied => {
                        debug!(phase = %phase.id, step = %step.name, outcome = %result, "step resolved");
                    }
                    StepResult::TimedOut => {
                        warn!(
                            phase = %phase.id,
                            step = %step.name,
                            display_id = step.display_id,
                            timeout_ms = millis(step.timeout),
                            "step timed out; continuing"
                        );
                    }
                }

                let evaluated = self.step_idx;
                if result.is_terminal() {
                    self.outcomes.push(StepOutcome {
                        step: evaluated,
                        name: step.name.clone(),
                        display_id: step.display_id,
                        result,
                        elapsed: self.current.elapsed(),
                    });
                    self.step_idx += 1;
                    self.current = StepExecution::new();
                }

                PhaseTick::InProgress {
                    step: evaluated,
                    result,
                }
            }
            Err(error) => PhaseTick::Aborted {
                step: self.step_idx,
                error,
            },
        }
    }
}
