//! Preset run driver.
//!
//! Drives a [`PresetController`] against an in-memory [`TableStore`] on
//! a fixed tick interval. Ctrl+C cancels the run cooperatively; the run
//! then finishes at the next tick boundary with no state rollback. A
//! second Ctrl+C forces the process down.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::catalogue::{CatalogueLoader, PhaseId};
use crate::cli::args::RunArgs;
use crate::error::{ExitCode, ProcdeckError};
use crate::observability::EventEmitter;
use crate::run::{PresetController, RunStatus};
use crate::vars::{ReadPolicy, TableStore};

/// Execute a preset run and return the process exit code.
///
/// # Errors
///
/// Returns a usage error for invalid flag combinations, a catalogue
/// error when the file fails to load, and an I/O error when the seed or
/// events file cannot be used. Step failures during the run do not
/// surface here; they end the run with [`RunStatus::Failed`] and map to
/// the `RUN_FAILED` exit code.
pub async fn run(args: &RunArgs) -> Result<i32, ProcdeckError> {
    if args.tick_interval.is_zero() {
        return Err(ProcdeckError::Usage(
            "--tick-interval must be positive".to_string(),
        ));
    }
    let sequence = plan_sequence(args)?;
    if sequence.is_empty() {
        tracing::info!(target_preset = ?args.preset, "already at target preset; nothing to do");
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let loader = CatalogueLoader::new();
    let loaded = loader.load(&args.file)?;
    for warning in &loaded.warnings {
        tracing::warn!(file = %args.file.display(), "{warning}");
    }

    let policy = if args.strict_vars {
        ReadPolicy::Strict
    } else {
        ReadPolicy::Permissive
    };
    let store = match &args.state {
        Some(path) => {
            tracing::info!(state = %path.display(), "seeding variable store");
            TableStore::from_seed_path(path, policy)?
        }
        None => TableStore::new(policy),
    };

    let emitter = event_emitter(args.events.as_deref())?;

    let mut controller = PresetController::new(Arc::clone(&loaded.catalogue));
    let run_id = controller.start(&sequence)?;
    tracing::info!(
        %run_id,
        file = %args.file.display(),
        phases = ?sequence,
        tick_ms = crate::run::millis(args.tick_interval),
        "run started"
    );

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let mut interval = tokio::time::interval(args.tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut ticks: u64 = 0;
    let status = loop {
        interval.tick().await;
        ticks += 1;
        if cancel.is_cancelled() {
            controller.cancel();
        }
        let status = controller.tick(&store, args.tick_interval);
        for event in controller.drain_events() {
            emitter.emit(event);
        }
        if status != RunStatus::Running {
            break status;
        }
        if let Some(max) = args.max_ticks {
            if ticks >= max {
                tracing::warn!(ticks, "tick budget exhausted; cancelling run");
                controller.cancel();
            }
        }
    };

    if let Some(progress) = controller.progress() {
        tracing::info!(
            status = %progress.status,
            steps_completed = progress.steps_completed,
            steps_total = progress.steps_total,
            ticks,
            "run finished"
        );
        for warning in &progress.warnings {
            tracing::warn!("{warning}");
        }
        if let Some(error) = &progress.error {
            tracing::error!(error = %error, "run failed");
        }
    }

    if args.journal {
        for entry in store.journal() {
            println!("{}", serde_json::to_string(&entry)?);
        }
    }

    Ok(match status {
        RunStatus::Cancelled => ExitCode::INTERRUPTED,
        RunStatus::Failed => ExitCode::RUN_FAILED,
        RunStatus::Completed | RunStatus::Idle | RunStatus::Running => ExitCode::SUCCESS,
    })
}

/// Resolves the phase sequence from `--phases` or `--preset`/`--from`.
fn plan_sequence(args: &RunArgs) -> Result<Vec<PhaseId>, ProcdeckError> {
    if let Some(phases) = &args.phases {
        return Ok(phases.clone());
    }
    match args.preset {
        Some(target) => Ok(args.from.transition_sequence(target)),
        None => Err(ProcdeckError::Usage(
            "one of --preset or --phases is required".to_string(),
        )),
    }
}

/// Picks the event sink: none, stdout for `-`, or a file.
fn event_emitter(path: Option<&Path>) -> Result<EventEmitter, ProcdeckError> {
    match path {
        None => Ok(EventEmitter::noop()),
        Some(p) if p == Path::new("-") => Ok(EventEmitter::stdout()),
        Some(p) => Ok(EventEmitter::from_file(p)?),
    }
}

/// First Ctrl+C or SIGTERM cancels cooperatively; a second one forces
/// the process down with the conventional signal exit code.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }

        eprintln!("\nCancelling run at the next tick... (press Ctrl+C again to force)");
        cancel.cancel();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
        }
    });
}
