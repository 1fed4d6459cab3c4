//! Preset run orchestration.
//!
//! The `PresetController` coordinates one preset run at a time over a
//! frozen catalogue:
//! - phase sequence validation at start
//! - one phase tick per engine tick, phases strictly in the given order
//! - cooperative cancellation at tick boundaries, without rollback
//! - progress snapshots and a buffered structured event stream
//!
//! Runs are independent: once a run reaches a terminal status the
//! controller can start a fresh one. Idempotency of re-runs comes from
//! the catalogue's skip predicates, not from the controller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalogue::{Phase, PhaseId, ProcedureCatalogue};
use crate::error::RunError;
use crate::observability::events::Event;
use crate::observability::metrics;
use crate::run::millis;
use crate::run::phase::{PhaseExecution, PhaseTick};
use crate::run::step::StepResult;
use crate::vars::VariableStore;

/// Identifier of a preset run.
pub type RunId = Uuid;

/// Lifecycle status of a preset run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No run on this controller.
    Idle,
    /// A run is active.
    Running,
    /// Every phase completed.
    Completed,
    /// Cancelled at a tick boundary; completed steps stand.
    Cancelled,
    /// A step failed to evaluate.
    Failed,
}

impl RunStatus {
    /// Whether this status ends a run.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only snapshot of a run's progress.
#[derive(Debug, Clone, Serialize)]
pub struct RunProgress {
    /// Id of the run.
    pub run_id: String,
    /// Current status.
    pub status: RunStatus,
    /// Active phase name, while running.
    pub phase: Option<String>,
    /// Active step name, while running.
    pub step: Option<String>,
    /// Steps resolved so far, across the whole sequence.
    pub steps_completed: usize,
    /// Total steps planned.
    pub steps_total: usize,
    /// Completion percentage.
    pub percent: f64,
    /// Timeout notes collected so far.
    pub warnings: Vec<String>,
    /// Terminal error, when the run failed.
    pub error: Option<String>,
}

/// State of the run currently held by the controller.
#[derive(Debug)]
struct ActiveRun {
    id: RunId,
    sequence: Vec<PhaseId>,
    phase_idx: usize,
    announced: bool,
    exec: PhaseExecution,
    steps_total: usize,
    steps_completed: usize,
    warnings: Vec<String>,
    cancel_requested: bool,
    status: RunStatus,
    error: Option<String>,
}

/// Controller driving preset runs against a frozen catalogue.
///
/// The host calls [`tick`](Self::tick) periodically; each tick performs
/// at most one step evaluation. The controller never blocks and never
/// spawns threads of its own.
#[derive(Debug)]
pub struct PresetController {
    catalogue: Arc<ProcedureCatalogue>,
    active: Option<ActiveRun>,
    events: Vec<Event>,
}

impl PresetController {
    /// Creates a controller over `catalogue`.
    #[must_use]
    pub fn new(catalogue: Arc<ProcedureCatalogue>) -> Self {
        Self {
            catalogue,
            active: None,
            events: Vec::new(),
        }
    }

    /// Starts a run over the given phase sequence.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::AlreadyActive`] while a run is in progress,
    /// [`RunError::EmptySequence`] for an empty sequence, and
    /// [`RunError::PhaseNotInCatalogue`] when a requested phase is not in
    /// the loaded catalogue.
    pub fn start(&mut self, sequence: &[PhaseId]) -> Result<RunId, RunError> {
        if let Some(run) = &self.active {
            if run.status == RunStatus::Running {
                return Err(RunError::AlreadyActive { active: run.id });
            }
        }
        if sequence.is_empty() {
            return Err(RunError::EmptySequence);
        }
        for id in sequence {
            if !self.catalogue.contains(*id) {
                return Err(RunError::PhaseNotInCatalogue {
                    phase: id.as_str().to_string(),
                });
            }
        }

        let id = Uuid::new_v4();
        let steps_total = self.catalogue.total_steps(sequence);
        info!(run_id = %id, phases = ?sequence, steps_total, "preset run started");

        self.events.push(Event::RunStarted {
            timestamp: Utc::now(),
            run_id: id.to_string(),
            phases: sequence.iter().map(|p| p.as_str().to_string()).collect(),
            steps_total,
        });
        metrics::set_run_active(true);
        metrics::set_run_progress(0.0);

        self.active = Some(ActiveRun {
            id,
            sequence: sequence.to_vec(),
            phase_idx: 0,
            announced: false,
            exec: PhaseExecution::new(),
            steps_total,
            steps_completed: 0,
            warnings: Vec::new(),
            cancel_requested: false,
            status: RunStatus::Running,
            error: None,
        });
        Ok(id)
    }

    /// Requests cooperative cancellation of the active run.
    ///
    /// Takes effect at the next tick boundary; completed steps are not
    /// rolled back. Idempotent, and harmless with no active run.
    pub fn cancel(&mut self) {
        if let Some(run) = &mut self.active {
            if run.status == RunStatus::Running && !run.cancel_requested {
                run.cancel_requested = true;
                info!(run_id = %run.id, "cancellation requested");
            }
        }
    }

    /// Advances the active run by one tick.
    ///
    /// At most one step evaluation happens per call. Returns the run's
    /// status after the tick, or [`RunStatus::Idle`] with no run.
    pub fn tick(&mut self, vars: &dyn VariableStore, dt: Duration) -> RunStatus {
        let Self {
            catalogue,
            active,
            events,
        } = self;
        let Some(run) = active.as_mut() else {
            return RunStatus::Idle;
        };
        if run.status != RunStatus::Running {
            return run.status;
        }
        metrics::record_tick();

        if run.cancel_requested {
            run.status = RunStatus::Cancelled;
            info!(run_id = %run.id, steps_completed = run.steps_completed, "run cancelled");
            events.push(Event::RunCancelled {
                timestamp: Utc::now(),
                run_id: run.id.to_string(),
                steps_completed: run.steps_completed,
                steps_total: run.steps_total,
            });
            metrics::record_run_finished(RunStatus::Cancelled.as_str());
            metrics::set_run_active(false);
            return run.status;
        }

        let Some(&phase_id) = run.sequence.get(run.phase_idx) else {
            // start() guarantees a non-empty sequence and completion is
            // detected on the last phase's Complete tick, so this is
            // unreachable; resolve to Completed rather than panic.
            Self::finish_completed(run, events);
            return run.status;
        };
        let Some(phase) = catalogue.phase(phase_id) else {
            run.status = RunStatus::Failed;
            let message = format!("phase '{phase_id}' missing from catalogue");
            run.error = Some(message.clone());
            events.push(Event::RunFailed {
                timestamp: Utc::now(),
                run_id: run.id.to_string(),
                error: message,
            });
            metrics::record_run_finished(RunStatus::Failed.as_str());
            metrics::set_run_active(false);
            return run.status;
        };

        if !run.announced {
            run.announced = true;
            debug!(run_id = %run.id, phase = %phase_id, "phase started");
            events.push(Event::PhaseStarted {
                timestamp: Utc::now(),
                run_id: run.id.to_string(),
                phase: phase_id.as_str().to_string(),
            });
        }

        match run.exec.tick(phase, vars, dt) {
            PhaseTick::InProgress { step, result } => {
                Self::record_step_result(run, events, phase, phase_id, step, result);
            }
            PhaseTick::Complete => {
                debug!(run_id = %run.id, phase = %phase_id, "phase completed");
                events.push(Event::PhaseCompleted {
                    timestamp: Utc::now(),
                    run_id: run.id.to_string(),
                    phase: phase_id.as_str().to_string(),
                    steps_completed: run.exec.completed(),
                });
                run.phase_idx += 1;
                run.announced = false;
                run.exec = PhaseExecution::new();
                if run.phase_idx >= run.sequence.len() {
                    Self::finish_completed(run, events);
                }
            }
            PhaseTick::Aborted { step, error } => {
                let (step_name, display_id) = phase
                    .steps
                    .get(step)
                    .map_or(("<none>", 0), |s| (s.name.as_str(), s.display_id));
                warn!(
                    run_id = %run.id,
                    phase = %phase_id,
                    step = step_name,
                    error = %error,
                    "step failed; aborting run"
                );
                let message = error.to_string();
                events.push(Event::StepFailed {
                    timestamp: Utc::now(),
                    run_id: run.id.to_string(),
                    phase: phase_id.as_str().to_string(),
                    step: step_name.to_string(),
                    display_id,
                    error: message.clone(),
                });
                events.push(Event::PhaseAborted {
                    timestamp: Utc::now(),
                    run_id: run.id.to_string(),
                    phase: phase_id.as_str().to_string(),
                    error: message.clone(),
                });
                events.push(Event::RunFailed {
                    timestamp: Utc::now(),
                    run_id: run.id.to_string(),
                    error: message.clone(),
                });
                metrics::record_step("failed", Duration::ZERO);
                metrics::record_run_finished(RunStatus::Failed.as_str());
                metrics::set_run_active(false);
                run.status = RunStatus::Failed;
                run.error = Some(message);
            }
        }

        if run.status == RunStatus::Running {
            metrics::set_run_progress(percent(run.steps_completed, run.steps_total));
        }
        run.status
    }

    /// Returns a progress snapshot, or `None` when no run has started.
    #[must_use]
    pub fn progress(&self) -> Option<RunProgress> {
        let run = self.active.as_ref()?;
        let active_phase = if run.status == RunStatus::Running {
            run.sequence.get(run.phase_idx).copied()
        } else {
            None
        };
        let step = active_phase.and_then(|id| {
            self.catalogue
                .phase(id)
                .and_then(|p| p.steps.get(run.exec.current_index()))
                .map(|s| s.name.clone())
        });
        Some(RunProgress {
            run_id: run.id.to_string(),
            status: run.status,
            phase: active_phase.map(|id| id.as_str().to_string()),
            step,
            steps_completed: run.steps_completed,
            steps_total: run.steps_total,
            percent: percent(run.steps_completed, run.steps_total),
            warnings: run.warnings.clone(),
            error: run.error.clone(),
        })
    }

    /// Status of the held run, or [`RunStatus::Idle`] with none.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.active.as_ref().map_or(RunStatus::Idle, |r| r.status)
    }

    /// Id of the held run, if any.
    #[must_use]
    pub fn run_id(&self) -> Option<RunId> {
        self.active.as_ref().map(|r| r.id)
    }

    /// Whether a run is currently in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status() == RunStatus::Running
    }

    /// Takes the events buffered since the last drain.
    ///
    /// The buffer grows until drained; hosts that want the stream should
    /// drain once per tick.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    fn finish_completed(run: &mut ActiveRun, events: &mut Vec<Event>) {
        run.status = RunStatus::Completed;
        info!(run_id = %run.id, steps_completed = run.steps_completed, "run completed");
        events.push(Event::RunCompleted {
            timestamp: Utc::now(),
            run_id: run.id.to_string(),
            steps_completed: run.steps_completed,
            steps_total: run.steps_total,
        });
        metrics::record_run_finished(RunStatus::Completed.as_str());
        metrics::set_run_active(false);
        metrics::set_run_progress(100.0);
    }

    fn record_step_result(
        run: &mut ActiveRun,
        events: &mut Vec<Event>,
        phase: &Phase,
        phase_id: PhaseId,
        step: usize,
        result: StepResult,
    ) {
        let Some(step_def) = phase.steps.get(step) else {
            return;
        };
        let timestamp = Utc::now();
        let run_id = run.id.to_string();
        let phase_name = phase_id.as_str().to_string();
        let step_name = step_def.name.clone();

        if result.is_terminal() {
            run.steps_completed += 1;
        }
        let elapsed = run
            .exec
            .outcomes()
            .last()
            .filter(|o| o.step == step)
            .map_or(Duration::ZERO, |o| o.elapsed);

        match result {
            StepResult::Waiting => {}
            StepResult::Commanded => {
                events.push(Event::StepCommanded {
                    timestamp,
                    run_id,
                    phase: phase_name,
                    step: step_name,
                    display_id: step_def.display_id,
                });
            }
            StepResult::Skipped => {
                metrics::record_step(result.as_str(), elapsed);
                events.push(Event::StepSkipped {
                    timestamp,
                    run_id,
                    phase: phase_name,
                    step: step_name,
                    display_id: step_def.display_id,
                });
            }
            StepResult::Satisfied => {
                metrics::record_step(result.as_str(), elapsed);
                events.push(Event::StepSatisfied {
                    timestamp,
                    run_id,
                    phase: phase_name,
                    step: step_name,
                    display_id: step_def.display_id,
                    elapsed_ms: millis(elapsed),
                });
            }
            StepResult::TimedOut => {
                metrics::record_step(result.as_str(), elapsed);
                run.warnings.push(format!(
                    "step '{}' ({}) timed out after {}ms",
                    step_def.name,
                    phase_id,
                    millis(step_def.timeout)
                ));
                events.push(Event::StepTimedOut {
                    timestamp,
                    run_id,
                    phase: phase_name,
                    step: step_name,
                    display_id: step_def.display_id,
                    timeout_ms: millis(step_def.timeout),
                    elapsed_ms: millis(elapsed),
                });
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}
