//! Variable store abstraction layer.
//!
//! Provides the [`VariableStore`] trait through which all procedure
//! expressions read and mutate cockpit state. The store is an injected
//! capability: the engine never owns a global one, and a host embedding the
//! engine supplies its own implementation backed by whatever simulator it
//! talks to. [`TableStore`] is the in-memory implementation used by the CLI
//! driver and the test suite.

pub mod table;

pub use table::{JournalEntry, Mutation, ReadPolicy, TableStore};

use crate::error::VarError;

/// Result type alias for variable store operations.
pub type Result<T> = std::result::Result<T, VarError>;

/// Named variable access for procedure expressions.
///
/// Implementations use `&self` with interior mutability so a single store
/// can be shared between the engine and other subsystems mutating the same
/// state concurrently. All reads must be side-effect-free.
pub trait VariableStore: Send + Sync {
    /// Reads a named flag variable.
    ///
    /// # Errors
    ///
    /// Returns [`VarError::UnknownFlag`] when the name cannot be resolved
    /// (strict implementations; permissive ones may substitute a default).
    fn read_flag(&self, name: &str) -> Result<f64>;

    /// Writes a named flag variable, creating it on first write.
    ///
    /// A write never fails on an unknown name.
    ///
    /// # Errors
    ///
    /// Returns an error only from restricted views such as
    /// [`ReadOnly`], which reject all mutation.
    fn write_flag(&self, name: &str, value: f64) -> Result<()>;

    /// Reads an indexed, unit-tagged simulator-state variable.
    ///
    /// The unit tag is advisory; implementations may use it for conversion
    /// or ignore it.
    ///
    /// # Errors
    ///
    /// Returns [`VarError::UnknownSimVar`] when the name cannot be resolved.
    fn read_sim(&self, name: &str, index: Option<u32>, unit: Option<&str>) -> Result<f64>;

    /// Fires a named one-shot event with a parameter value.
    ///
    /// # Errors
    ///
    /// Returns [`VarError::UnknownEvent`] when the event name cannot be
    /// resolved, or a rejection from restricted views.
    fn trigger_event(&self, name: &str, index: Option<u32>, param: f64) -> Result<()>;
}

/// Write-rejecting view over another store.
///
/// The step executor evaluates skip and confirmation predicates through
/// this view, so a catalogue that hides mutations inside a predicate fails
/// fast instead of corrupting state during polling.
pub struct ReadOnly<'a> {
    inner: &'a dyn VariableStore,
}

impl<'a> ReadOnly<'a> {
    /// Wraps a store in a read-only view.
    #[must_use]
    pub const fn new(inner: &'a dyn VariableStore) -> Self {
        Self { inner }
    }
}

impl VariableStore for ReadOnly<'_> {
    fn read_flag(&self, name: &str) -> Result<f64> {
        self.inner.read_flag(name)
    }

    fn write_flag(&self, name: &str, _value: f64) -> Result<()> {
        Err(VarError::WriteInReadOnly {
            name: name.to_string(),
        })
    }

    fn read_sim(&self, name: &str, index: Option<u32>, unit: Option<&str>) -> Result<f64> {
        self.inner.read_sim(name, index, unit)
    }

    fn trigger_event(&self, name: &str, _index: Option<u32>, _param: f64) -> Result<()> {
        Err(VarError::WriteInReadOnly {
            name: name.to_string(),
        })
    }
}
