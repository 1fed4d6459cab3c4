//! Behavioral guarantees of the run engine, driven in-process.
//!
//! Each test builds a small inline catalogue, seeds a strict store, and
//! ticks a [`PresetController`] to a terminal status.

mod common;

use common::{TICK, drive_to_completion, load_catalogue, strict_store};
use procdeck::catalogue::PhaseId;
use procdeck::observability::Event;
use procdeck::run::{PresetController, RunStatus};
use procdeck::vars::Mutation;

#[test]
fn steps_execute_in_array_order_not_display_id_order() {
    let catalogue = load_catalogue(
        r"
aircraft:
  name: Test
phases:
  - name: power_on
    steps:
      - name: Third id, first slot
        display_id: 50
        timeout_ms: 1000
        check: (L:TEST_A)
        program: 1 (>L:TEST_A)
      - name: First id, second slot
        display_id: 10
        timeout_ms: 1000
        check: (L:TEST_B)
        program: 1 (>L:TEST_B)
      - name: Second id, third slot
        display_id: 30
        timeout_ms: 1000
        check: (L:TEST_C)
        program: 1 (>L:TEST_C)
",
    );
    let store = strict_store(&[("TEST_A", 0.0), ("TEST_B", 0.0), ("TEST_C", 0.0)]);
    let mut controller = PresetController::new(catalogue);
    controller.start(&[PhaseId::PowerOn]).unwrap();

    let status = drive_to_completion(&mut controller, &store);
    assert_eq!(status, RunStatus::Completed);

    let written: Vec<String> = store
        .journal()
        .into_iter()
        .map(|entry| match entry.mutation {
            Mutation::FlagWrite { name, .. } => name,
            Mutation::EventTrigger { name, .. } => name,
        })
        .collect();
    assert_eq!(written, ["TEST_A", "TEST_B", "TEST_C"]);
}

#[test]
fn satisfied_checks_skip_without_touching_the_store() {
    let catalogue = load_catalogue(
        r"
aircraft:
  name: Test
phases:
  - name: power_on
    steps:
      - name: BAT 1 On
        display_id: 10
        timeout_ms: 1000
        check: (L:TEST_BAT_1)
        program: 1 (>L:TEST_BAT_1)
      - name: BAT 2 On
        display_id: 20
        timeout_ms: 1000
        check: (L:TEST_BAT_2)
        program: 1 (>L:TEST_BAT_2)
",
    );
    // Both flags already at their target values.
    let store = strict_store(&[("TEST_BAT_1", 1.0), ("TEST_BAT_2", 1.0)]);
    let mut controller = PresetController::new(catalogue);
    controller.start(&[PhaseId::PowerOn]).unwrap();

    let status = drive_to_completion(&mut controller, &store);
    assert_eq!(status, RunStatus::Completed);
    assert_eq!(store.mutation_count(), 0);
    assert!(store.journal().is_empty());

    let skips = controller
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, Event::StepSkipped { .. }))
        .count();
    assert_eq!(skips, 2);
}

#[test]
fn command_fires_once_no_matter_how_long_confirmation_takes() {
    let catalogue = load_catalogue(
        r"
aircraft:
  name: Test
phases:
  - name: power_on
    steps:
      - name: Await external feedback
        display_id: 10
        timeout_ms: 5000
        check: (L:TEST_FDBK)
        program: 1 (>L:TEST_CMD)
",
    );
    let store = strict_store(&[("TEST_FDBK", 0.0)]);
    let mut controller = PresetController::new(catalogue);
    controller.start(&[PhaseId::PowerOn]).unwrap();

    // Entry tick: check is false, the command fires.
    assert_eq!(controller.tick(&store, TICK), RunStatus::Running);
    assert_eq!(store.write_count(), 1);

    // Polls while the external system lags. No re-fire.
    for _ in 0..5 {
        assert_eq!(controller.tick(&store, TICK), RunStatus::Running);
    }
    assert_eq!(store.write_count(), 1);

    // The simulated system confirms; the run drains to completion.
    store.set_flag("TEST_FDBK", 1.0);
    let status = drive_to_completion(&mut controller, &store);
    assert_eq!(status, RunStatus::Completed);
    assert_eq!(store.write_count(), 1);
}

#[test]
fn timed_out_wait_resolves_within_one_tick_of_its_budget() {
    let catalogue = load_catalogue(
        r"
aircraft:
  name: Test
phases:
  - name: power_on
    steps:
      - name: Await a condition that never holds
        display_id: 10
        pure_wait: true
        timeout_ms: 1000
        program: (L:TEST_NEVER)
",
    );
    let store = strict_store(&[("TEST_NEVER", 0.0)]);
    let mut controller = PresetController::new(catalogue);
    controller.start(&[PhaseId::PowerOn]).unwrap();

    let status = drive_to_completion(&mut controller, &store);
    assert_eq!(status, RunStatus::Completed, "a timeout is not a failure");

    let timeout = controller
        .drain_events()
        .into_iter()
        .find_map(|event| match event {
            Event::StepTimedOut {
                timeout_ms,
                elapsed_ms,
                ..
            } => Some((timeout_ms, elapsed_ms)),
            _ => None,
        })
        .expect("a StepTimedOut event");
    assert_eq!(timeout.0, 1000);
    assert!(timeout.1 >= 1000, "resolved before the budget: {}", timeout.1);
    assert!(timeout.1 <= 1100, "overshot by more than a tick: {}", timeout.1);

    let progress = controller.progress().unwrap();
    assert_eq!(progress.warnings.len(), 1);
}

#[test]
fn rerunning_a_completed_phase_performs_no_mutations() {
    let catalogue = load_catalogue(
        r"
aircraft:
  name: Test
phases:
  - name: power_on
    steps:
      - name: BAT 1 On
        display_id: 10
        timeout_ms: 1000
        check: (L:TEST_BAT_1)
        program: 1 (>L:TEST_BAT_1)
      - name: BAT 2 On
        display_id: 20
        timeout_ms: 1000
        check: (L:TEST_BAT_2)
        program: 1 (>L:TEST_BAT_2)
",
    );
    let store = strict_store(&[("TEST_BAT_1", 0.0), ("TEST_BAT_2", 0.0)]);
    let mut controller = PresetController::new(catalogue);

    controller.start(&[PhaseId::PowerOn]).unwrap();
    assert_eq!(drive_to_completion(&mut controller, &store), RunStatus::Completed);
    assert_eq!(store.write_count(), 2);

    // Same phase again against the same store: everything skips.
    controller.start(&[PhaseId::PowerOn]).unwrap();
    assert_eq!(drive_to_completion(&mut controller, &store), RunStatus::Completed);
    assert_eq!(store.write_count(), 2);
}

#[test]
fn power_cycle_restores_the_initial_flags() {
    let catalogue = load_catalogue(
        r"
aircraft:
  name: Test
phases:
  - name: power_on
    steps:
      - name: BAT 1 On
        display_id: 10
        timeout_ms: 1000
        check: (L:TEST_BAT_1)
        program: 1 (>L:TEST_BAT_1)
  - name: power_off
    steps:
      - name: BAT 1 Off
        display_id: 10
        timeout_ms: 1000
        check: (L:TEST_BAT_1) !
        program: 0 (>L:TEST_BAT_1)
",
    );
    let store = strict_store(&[("TEST_BAT_1", 0.0)]);
    let mut controller = PresetController::new(catalogue);
    controller
        .start(&[PhaseId::PowerOn, PhaseId::PowerOff])
        .unwrap();

    let status = drive_to_completion(&mut controller, &store);
    assert_eq!(status, RunStatus::Completed);
    assert_eq!(store.flag("TEST_BAT_1"), Some(0.0));
    assert_eq!(store.write_count(), 2, "one write up, one write down");
}

#[test]
fn cancellation_stops_the_run_without_reverting_anything() {
    let catalogue = load_catalogue(
        r"
aircraft:
  name: Test
phases:
  - name: power_on
    steps:
      - name: BAT 1 On
        display_id: 10
        timeout_ms: 1000
        check: (L:TEST_BAT_1)
        program: 1 (>L:TEST_BAT_1)
      - name: BAT 2 On
        display_id: 20
        timeout_ms: 1000
        check: (L:TEST_BAT_2)
        program: 1 (>L:TEST_BAT_2)
",
    );
    let store = strict_store(&[("TEST_BAT_1", 0.0), ("TEST_BAT_2", 0.0)]);
    let mut controller = PresetController::new(catalogue);
    controller.start(&[PhaseId::PowerOn]).unwrap();

    // Let the first command land, then cancel before the second step runs.
    while store.write_count() == 0 {
        assert_eq!(controller.tick(&store, TICK), RunStatus::Running);
    }
    controller.cancel();
    assert_eq!(controller.tick(&store, TICK), RunStatus::Cancelled);

    assert_eq!(store.flag("TEST_BAT_1"), Some(1.0), "no rollback on cancel");
    assert_eq!(store.write_count(), 1);

    // Further ticks are inert.
    assert_eq!(controller.tick(&store, TICK), RunStatus::Cancelled);
    assert_eq!(store.write_count(), 1);
}
