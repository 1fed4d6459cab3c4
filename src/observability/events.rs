//! Structured event stream for preset runs.
//!
//! Discrete, typed events emitted while a run executes. Events are
//! serialized as newline-delimited JSON (JSONL) and include a
//! monotonically increasing sequence number for ordering guarantees.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a preset run.
///
/// Each variant is tagged with `"type"` when serialized to JSON so
/// consumers can dispatch on the event kind. Run ids are carried as
/// strings so every line is self-contained.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A preset run has started.
    RunStarted {
        /// When the run started.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Planned phase names, in execution order.
        phases: Vec<String>,
        /// Total number of steps across the whole sequence.
        steps_total: usize,
    },

    /// The run entered a phase.
    PhaseStarted {
        /// When the phase was entered.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Name of the phase.
        phase: String,
    },

    /// A step's skip predicate already held; its command never ran.
    StepSkipped {
        /// When the step resolved.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Name of the phase.
        phase: String,
        /// Step display name.
        step: String,
        /// Panel display id.
        display_id: u32,
    },

    /// A step's command program fired.
    StepCommanded {
        /// When the command fired.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Name of the phase.
        phase: String,
        /// Step display name.
        step: String,
        /// Panel display id.
        display_id: u32,
    },

    /// A step's completion predicate became true.
    StepSatisfied {
        /// When the step resolved.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Name of the phase.
        phase: String,
        /// Step display name.
        step: String,
        /// Panel display id.
        display_id: u32,
        /// Wait time accumulated before satisfaction, in milliseconds.
        elapsed_ms: u64,
    },

    /// A step's timeout elapsed with the predicate still false.
    StepTimedOut {
        /// When the step resolved.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Name of the phase.
        phase: String,
        /// Step display name.
        step: String,
        /// Panel display id.
        display_id: u32,
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
        /// Actual wait accumulated when the timeout fired.
        elapsed_ms: u64,
    },

    /// A step failed to evaluate.
    StepFailed {
        /// When the failure occurred.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Name of the phase.
        phase: String,
        /// Step display name.
        step: String,
        /// Panel display id.
        display_id: u32,
        /// The evaluation error.
        error: String,
    },

    /// Every step of a phase has resolved.
    PhaseCompleted {
        /// When the phase completed.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Name of the phase.
        phase: String,
        /// Number of steps the phase resolved.
        steps_completed: usize,
    },

    /// A phase aborted on a failed step.
    PhaseAborted {
        /// When the abort occurred.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Name of the phase.
        phase: String,
        /// The evaluation error.
        error: String,
    },

    /// The run finished with every phase complete.
    RunCompleted {
        /// When the run finished.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Steps resolved across the whole run.
        steps_completed: usize,
        /// Total steps planned.
        steps_total: usize,
    },

    /// The run was cancelled at a tick boundary. Completed steps stand.
    RunCancelled {
        /// When the cancellation took effect.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// Steps resolved before cancellation.
        steps_completed: usize,
        /// Total steps planned.
        steps_total: usize,
    },

    /// The run ended on a failed step.
    RunFailed {
        /// When the failure occurred.
        timestamp: DateTime<Utc>,
        /// Id of the run.
        run_id: String,
        /// The terminal error.
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) atomically increments the sequence
/// counter, serializes the event as a single JSON line, and flushes the
/// underlying writer. Serialization or I/O failures are silently dropped
/// because observability must never break a run.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug; provide a manual impl.
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that writes to stderr, keeping stdout free for
    /// the human-readable run report.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    ///
    /// Failures are silently dropped; observability must not break a run.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
