//! Error types for `procdeck`
//!
//! Error hierarchy for catalogue loading, expression handling, variable
//! resolution, and preset run control, with CLI exit code mapping.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `procdeck` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Catalogue error (invalid YAML, expression compile failure, validation failure)
    pub const CATALOGUE_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// A preset run ended in the Failed status
    pub const RUN_FAILED: i32 = 4;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `procdeck` operations.
///
/// Aggregates all domain-specific errors and provides a unified
/// interface for error handling and exit code mapping.
#[derive(Debug, Error)]
pub enum ProcdeckError {
    /// Catalogue loading or validation error
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    /// Expression compile or evaluation error
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// Variable store resolution error
    #[error(transparent)]
    Var(#[from] VarError),

    /// Preset run control error
    #[error(transparent)]
    Run(#[from] RunError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid argument combination not expressible as a clap constraint
    #[error("{0}")]
    Usage(String),
}

impl ProcdeckError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Catalogue(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CATALOGUE_ERROR,
            Self::Expr(_) | Self::Var(_) | Self::Run(_) => ExitCode::RUN_FAILED,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
        }
    }
}

// ============================================================================
// Catalogue Errors
// ============================================================================

/// Catalogue loading and validation errors.
///
/// These errors cover all failure modes during catalogue parsing,
/// expression compilation, and validation. Every one of them is fatal
/// at load time; a catalogue that produced any of these never reaches
/// the preset controller.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// Referenced catalogue file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// I/O error while reading a catalogue file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the catalogue file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Catalogue validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the catalogue file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during catalogue validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "phases[2].steps[0].program")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents the catalogue from being used
    Error,
    /// Warning - potential issue that does not prevent catalogue loading
    Warning,
}

// ============================================================================
// Expression Errors
// ============================================================================

/// Expression compile and evaluation errors.
///
/// Compile-time variants (`UnknownToken`, `StackUnderflow`, `StrayBlockClose`,
/// `UnbalancedBlock`) are detected once at catalogue load and reported as
/// validation errors. The `Variable` variant occurs at evaluation time and is
/// fatal to the run that triggered it.
#[derive(Debug, Error)]
pub enum ExprError {
    /// Token not in the expression vocabulary
    #[error("unknown token '{token}' at byte {offset}")]
    UnknownToken {
        /// The offending token text
        token: String,
        /// Byte offset of the token in the source
        offset: usize,
    },

    /// An operation would pop from an empty stack
    #[error("stack underflow at '{op}' (byte {offset})")]
    StackUnderflow {
        /// The operation that underflowed
        op: String,
        /// Byte offset of the operation in the source
        offset: usize,
    },

    /// A `}` with no open conditional block
    #[error("'}}' without matching 'if{{' at byte {offset}")]
    StrayBlockClose {
        /// Byte offset of the stray close
        offset: usize,
    },

    /// A conditional block whose net stack effect is nonzero
    #[error("conditional block at byte {offset} does not leave the stack balanced")]
    UnbalancedBlock {
        /// Byte offset of the `if{` opening the block
        offset: usize,
    },

    /// Variable resolution failed during evaluation
    #[error(transparent)]
    Variable(#[from] VarError),
}

// ============================================================================
// Variable Store Errors
// ============================================================================

/// Variable store resolution errors.
///
/// Raised by [`crate::vars::VariableStore`] implementations when a name
/// cannot be resolved. During a run these surface as a Failed step and
/// abort the run.
#[derive(Debug, Error)]
pub enum VarError {
    /// Named flag variable does not exist
    #[error("unknown flag variable '{name}'{}", suggestion_text(.suggestion))]
    UnknownFlag {
        /// The unresolved flag name
        name: String,
        /// Closest known name, when one is close enough to be useful
        suggestion: Option<String>,
    },

    /// Named simulator-state variable does not exist
    #[error("unknown simulator variable '{name}'")]
    UnknownSimVar {
        /// The unresolved variable name
        name: String,
    },

    /// Named event does not exist
    #[error("unknown event '{name}'")]
    UnknownEvent {
        /// The unresolved event name
        name: String,
    },

    /// A write or trigger was attempted through a read-only view
    #[error("write to '{name}' during read-only predicate evaluation")]
    WriteInReadOnly {
        /// The name the write targeted
        name: String,
    },
}

fn suggestion_text(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

// ============================================================================
// Run Control Errors
// ============================================================================

/// Preset run control errors.
#[derive(Debug, Error)]
pub enum RunError {
    /// A run is already active on this controller
    #[error("a preset run is already active ({active})")]
    AlreadyActive {
        /// Id of the active run
        active: uuid::Uuid,
    },

    /// Requested phase is not present in the loaded catalogue
    #[error("phase '{phase}' is not in the catalogue")]
    PhaseNotInCatalogue {
        /// The requested phase name
        phase: String,
    },

    /// The requested phase sequence is empty
    #[error("the requested phase sequence is empty")]
    EmptySequence,
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `procdeck` operations.
pub type Result<T> = std::result::Result<T, ProcdeckError>;

// ============================================================================
// Tests
// ============================================================================
