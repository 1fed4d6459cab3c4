//! In-memory variable store.
//!
//! [`TableStore`] backs the CLI driver and the test suite: flat DashMap
//! tables for flags and simulator variables, a registered-event set, and a
//! timestamped journal of every mutation so callers can audit exactly what
//! a procedure run changed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};

use crate::error::{ProcdeckError, VarError};
use crate::vars::VariableStore;

/// Similarity threshold above which an unknown-name error carries a
/// nearest-known-name suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Policy for reads of names the store has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Unknown reads and triggers are errors. Used by tests, where an
    /// unresolved name means the fixture is wrong.
    Strict,
    /// Unknown reads resolve to `0.0` with a once-per-name warning, and
    /// unknown events are accepted. Used by the CLI driver, where seeding
    /// every variable a catalogue touches would be busywork.
    #[default]
    Permissive,
}

/// One recorded mutation.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    /// When the mutation happened.
    pub at: DateTime<Utc>,
    /// What changed.
    #[serde(flatten)]
    pub mutation: Mutation,
}

/// A mutation applied through the store.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// A flag variable write.
    FlagWrite {
        /// Flag name.
        name: String,
        /// Value written.
        value: f64,
    },
    /// An event trigger.
    EventTrigger {
        /// Event name.
        name: String,
        /// Optional event index.
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<u32>,
        /// Parameter value popped from the stack.
        param: f64,
    },
}

/// Seed file shape: flat maps of initial values plus known event names.
///
/// Simulator variable keys may carry an index suffix (`"EXTERNAL POWER
/// ON:1"`), matching the expression syntax.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    flags: HashMap<String, f64>,
    #[serde(default)]
    sim: HashMap<String, f64>,
    #[serde(default)]
    events: Vec<String>,
}

/// In-memory [`VariableStore`] with a mutation journal.
pub struct TableStore {
    flags: DashMap<String, f64>,
    sim: DashMap<(String, Option<u32>), f64>,
    events: DashSet<String>,
    journal: Mutex<Vec<JournalEntry>>,
    writes: AtomicU64,
    triggers: AtomicU64,
    policy: ReadPolicy,
    warned: DashSet<String>,
}

impl TableStore {
    /// Creates an empty store with the given read policy.
    #[must_use]
    pub fn new(policy: ReadPolicy) -> Self {
        Self {
            flags: DashMap::new(),
            sim: DashMap::new(),
            events: DashSet::new(),
            journal: Mutex::new(Vec::new()),
            writes: AtomicU64::new(0),
            triggers: AtomicU64::new(0),
            policy,
            warned: DashSet::new(),
        }
    }

    /// Empty store that errors on unknown names.
    #[must_use]
    pub fn strict() -> Self {
        Self::new(ReadPolicy::Strict)
    }

    /// Empty store that reads unknown names as `0.0`.
    #[must_use]
    pub fn permissive() -> Self {
        Self::new(ReadPolicy::Permissive)
    }

    /// Loads a seed file from disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be read, or a YAML error
    /// when it does not match the seed shape.
    pub fn from_seed_path(path: &Path, policy: ReadPolicy) -> Result<Self, ProcdeckError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_seed_str(&text, policy)
    }

    /// Parses a seed document from a string.
    ///
    /// # Errors
    ///
    /// Returns a YAML error when the document does not match the seed shape.
    pub fn from_seed_str(text: &str, policy: ReadPolicy) -> Result<Self, ProcdeckError> {
        let seed: SeedFile = serde_yaml::from_str(text)?;
        let store = Self::new(policy);
        for (name, value) in seed.flags {
            store.flags.insert(name, value);
        }
        for (key, value) in seed.sim {
            let (name, index) = split_index(&key);
            store.sim.insert((name.to_string(), index), value);
        }
        for name in seed.events {
            store.events.insert(name);
        }
        Ok(store)
    }

    /// Sets a flag without journaling. Seeding/test convenience.
    pub fn set_flag(&self, name: &str, value: f64) {
        self.flags.insert(name.to_string(), value);
    }

    /// Sets a simulator variable without journaling.
    pub fn set_sim(&self, name: &str, index: Option<u32>, value: f64) {
        self.sim.insert((name.to_string(), index), value);
    }

    /// Registers an event name so strict stores accept it.
    pub fn register_event(&self, name: &str) {
        self.events.insert(name.to_string());
    }

    /// Current value of a flag, if present.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<f64> {
        self.flags.get(name).map(|v| *v)
    }

    /// Number of flag writes since construction.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of event triggers since construction.
    #[must_use]
    pub fn trigger_count(&self) -> u64 {
        self.triggers.load(Ordering::Relaxed)
    }

    /// Total mutation count (writes plus triggers).
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.write_count() + self.trigger_count()
    }

    /// Snapshot of the mutation journal in order of occurrence.
    #[must_use]
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.journal
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, mutation: Mutation) {
        let entry = JournalEntry {
            at: Utc::now(),
            mutation,
        };
        self.journal
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(entry);
    }

    /// Closest known flag name, when close enough to be a plausible typo.
    fn suggest_flag(&self, name: &str) -> Option<String> {
        self.flags
            .iter()
            .map(|entry| {
                let key = entry.key().clone();
                let score = strsim::jaro_winkler(name, &key);
                (key, score)
            })
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(key, _)| key)
    }

    fn warn_once(&self, kind: &str, name: &str) {
        if self.warned.insert(format!("{kind}:{name}")) {
            tracing::warn!(kind, name, "unknown variable read as 0");
        }
    }
}

impl VariableStore for TableStore {
    fn read_flag(&self, name: &str) -> Result<f64, VarError> {
        if let Some(value) = self.flags.get(name) {
            return Ok(*value);
        }
        match self.policy {
            ReadPolicy::Strict => Err(VarError::UnknownFlag {
                name: name.to_string(),
                suggestion: self.suggest_flag(name),
            }),
            ReadPolicy::Permissive => {
                self.warn_once("flag", name);
                Ok(0.0)
            }
        }
    }

    fn write_flag(&self, name: &str, value: f64) -> Result<(), VarError> {
        self.flags.insert(name.to_string(), value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.record(Mutation::FlagWrite {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn read_sim(&self, name: &str, index: Option<u32>, _unit: Option<&str>) -> Result<f64, VarError> {
        // Units are journal/diagnostic metadata here; lookup is by name+index.
        if let Some(value) = self.sim.get(&(name.to_string(), index)) {
            return Ok(*value);
        }
        match self.policy {
            ReadPolicy::Strict => Err(VarError::UnknownSimVar {
                name: index.map_or_else(|| name.to_string(), |i| format!("{name}:{i}")),
            }),
            ReadPolicy::Permissive => {
                self.warn_once("sim", name);
                Ok(0.0)
            }
        }
    }

    fn trigger_event(&self, name: &str, index: Option<u32>, param: f64) -> Result<(), VarError> {
        if self.policy == ReadPolicy::Strict && !self.events.contains(name) {
            return Err(VarError::UnknownEvent {
                name: name.to_string(),
            });
        }
        self.triggers.fetch_add(1, Ordering::Relaxed);
        self.record(Mutation::EventTrigger {
            name: name.to_string(),
            index,
            param,
        });
        Ok(())
    }
}

/// Splits a trailing all-digit `:<index>` suffix off a seed key.
fn split_index(key: &str) -> (&str, Option<u32>) {
    if let Some(pos) = key.rfind(':') {
        let suffix = &key[pos + 1..];
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = suffix.parse() {
                return (&key[..pos], Some(index));
            }
        }
    }
    (key, None)
}
