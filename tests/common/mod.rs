//! Shared integration-test harness: one-shot `procdeck` invocations as
//! a child process, plus in-process engine helpers over inline YAML
//! catalogues.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;

use procdeck::catalogue::{CatalogueLoader, ProcedureCatalogue};
use procdeck::run::{PresetController, RunStatus};
use procdeck::vars::TableStore;

/// Tick interval used by in-process engine tests.
pub const TICK: Duration = Duration::from_millis(100);

/// Runs the `procdeck` binary once with the given arguments.
#[must_use]
pub fn run_procdeck(args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_procdeck");
    std::process::Command::new(bin)
        .args(args)
        .output()
        .expect("failed to run procdeck")
}

/// Returns the path to a test fixture.
#[must_use]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Returns the path to the shipped demo catalogue.
#[must_use]
pub fn demo_catalogue_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("catalogues/a320ceo.yaml")
}

/// Loads a catalogue from inline YAML, failing the test on any error.
///
/// Warnings are tolerated; partial catalogues (fewer than the eight
/// standard phases) warn by design.
#[must_use]
pub fn load_catalogue(yaml: &str) -> Arc<ProcedureCatalogue> {
    CatalogueLoader::new()
        .load_str(yaml, "inline")
        .expect("catalogue should load")
        .catalogue
}

/// Builds a strict store pre-seeded with the given flags.
#[must_use]
pub fn strict_store(flags: &[(&str, f64)]) -> TableStore {
    let store = TableStore::strict();
    for (name, value) in flags {
        store.set_flag(name, *value);
    }
    store
}

/// Ticks the controller until the run leaves `Running`.
///
/// Panics if the run does not settle within a generous tick budget.
pub fn drive_to_completion(controller: &mut PresetController, store: &TableStore) -> RunStatus {
    for _ in 0..10_000 {
        let status = controller.tick(store, TICK);
        if status != RunStatus::Running {
            return status;
        }
    }
    panic!("run did not settle within 10000 ticks");
}
