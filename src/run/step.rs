//! Single-step execution state machine.
//!
//! A step resolves over one or more ticks: the entry tick evaluates the
//! skip predicate and fires the command, subsequent ticks poll the
//! completion predicate until it holds or the timeout elapses. The
//! executor never blocks and never re-fires a command.

use std::time::Duration;

use crate::catalogue::ProcedureStep;
use crate::error::ExprError;
use crate::vars::{ReadOnly, VariableStore};

/// Result of advancing a step by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The skip predicate already held on entry; the command never ran.
    Skipped,
    /// The command program fired this tick.
    Commanded,
    /// The completion predicate does not hold yet; poll again next tick.
    Waiting,
    /// The completion predicate holds.
    Satisfied,
    /// The timeout elapsed with the predicate still false. The step is
    /// resolved and the phase proceeds; this is a warning, not a failure.
    TimedOut,
}

impl StepResult {
    /// Whether this result resolves the step.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Skipped | Self::Satisfied | Self::TimedOut)
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Commanded => "commanded",
            Self::Waiting => "waiting",
            Self::Satisfied => "satisfied",
            Self::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for StepResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-step execution state.
///
/// Holds whether the step has been entered, whether its command fired,
/// and the wait time accumulated so far. One value per step attempt;
/// the phase runner creates a fresh one when it moves to the next step.
#[derive(Debug, Default)]
pub struct StepExecution {
    entered: bool,
    commanded: bool,
    elapsed: Duration,
}

impl StepExecution {
    /// Fresh state for a step that has not been entered yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the command program has fired.
    #[must_use]
    pub const fn commanded(&self) -> bool {
        self.commanded
    }

    /// Wait time accumulated after the entry tick.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Advances the step by one tick.
    ///
    /// The entry tick evaluates the skip predicate at zero elapsed time
    /// and, for command steps, fires the program when the predicate does
    /// not hold. Every later tick accumulates `dt`, re-polls the
    /// completion predicate, and times out once `elapsed >= timeout`.
    /// Predicates are evaluated through a read-only store view; the
    /// command runs against the store itself, exactly once.
    ///
    /// # Errors
    ///
    /// Returns the expression error when a predicate or command fails to
    /// evaluate (unknown variable, write during a predicate). The step is
    /// unresolved and the caller is expected to abort the run.
    pub fn advance(
        &mut self,
        step: &ProcedureStep,
        vars: &dyn VariableStore,
        dt: Duration,
    ) -> Result<StepResult, ExprError> {
        if !self.entered {
            self.entered = true;

            if predicate_holds(step, vars)? {
                return Ok(if step.pure_wait {
                    StepResult::Satisfied
                } else {
                    StepResult::Skipped
                });
            }

            if !step.pure_wait {
                step.program.evaluate(vars)?;
                self.commanded = true;
                return Ok(StepResult::Commanded);
            }

            return Ok(StepResult::Waiting);
        }

        self.elapsed += dt;

        if predicate_holds(step, vars)? {
            return Ok(StepResult::Satisfied);
        }

        if self.elapsed >= step.timeout {
            return Ok(StepResult::TimedOut);
        }

        Ok(StepResult::Waiting)
    }
}

fn predicate_holds(step: &ProcedureStep, vars: &dyn VariableStore) -> Result<bool, ExprError> {
    let view = ReadOnly::new(vars);
    step.predicate().evaluate_bool(&view)
}
