//! Procedure catalogue: schema, loading, validation, compiled model.
//!
//! A catalogue is an aircraft-specific, immutable mapping from phase name
//! to an ordered list of procedure steps. It is authored as YAML, loaded
//! once at startup through [`CatalogueLoader`] (parse, expression
//! compilation, validation, freeze into `Arc`), and shared read-only by
//! every preset run.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{CatalogueLoader, LoadedCatalogue, LoaderOptions};
pub use validation::{ValidationResult, Validator};

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::expr::Program;

// ============================================================================
// Phase identity
// ============================================================================

/// The four paired procedure categories, in power-up rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhaseCategory {
    /// Electrical power and APU.
    Power,
    /// Pushback readiness (fuel, exterior lights, doors).
    Pushback,
    /// Taxi readiness (engines, flight controls, taxi lights).
    Taxi,
    /// Takeoff readiness (flaps, packs, strobes, transponder).
    Takeoff,
}

impl PhaseCategory {
    /// All categories in power-up order.
    pub const ALL: [Self; 4] = [Self::Power, Self::Pushback, Self::Taxi, Self::Takeoff];

    /// The ON (setup) phase of this category.
    #[must_use]
    pub const fn on(self) -> PhaseId {
        match self {
            Self::Power => PhaseId::PowerOn,
            Self::Pushback => PhaseId::PushbackOn,
            Self::Taxi => PhaseId::TaxiOn,
            Self::Takeoff => PhaseId::TakeoffOn,
        }
    }

    /// The OFF (teardown) phase of this category.
    #[must_use]
    pub const fn off(self) -> PhaseId {
        match self {
            Self::Power => PhaseId::PowerOff,
            Self::Pushback => PhaseId::PushbackOff,
            Self::Taxi => PhaseId::TaxiOff,
            Self::Takeoff => PhaseId::TakeoffOff,
        }
    }
}

/// One of the eight recognized phases: four categories times ON/OFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    /// Power-up.
    PowerOn,
    /// Power-down.
    PowerOff,
    /// Pushback setup.
    PushbackOn,
    /// Pushback teardown.
    PushbackOff,
    /// Taxi setup.
    TaxiOn,
    /// Taxi teardown.
    TaxiOff,
    /// Takeoff setup.
    TakeoffOn,
    /// Takeoff teardown.
    TakeoffOff,
}

impl PhaseId {
    /// All eight phases, ON before OFF within each category.
    pub const ALL: [Self; 8] = [
        Self::PowerOn,
        Self::PowerOff,
        Self::PushbackOn,
        Self::PushbackOff,
        Self::TaxiOn,
        Self::TaxiOff,
        Self::TakeoffOn,
        Self::TakeoffOff,
    ];

    /// The category this phase belongs to.
    #[must_use]
    pub const fn category(self) -> PhaseCategory {
        match self {
            Self::PowerOn | Self::PowerOff => PhaseCategory::Power,
            Self::PushbackOn | Self::PushbackOff => PhaseCategory::Pushback,
            Self::TaxiOn | Self::TaxiOff => PhaseCategory::Taxi,
            Self::TakeoffOn | Self::TakeoffOff => PhaseCategory::Takeoff,
        }
    }

    /// Whether this is a setup (ON) phase.
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(
            self,
            Self::PowerOn | Self::PushbackOn | Self::TaxiOn | Self::TakeoffOn
        )
    }

    /// Canonical catalogue name, e.g. `power_on`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PowerOn => "power_on",
            Self::PowerOff => "power_off",
            Self::PushbackOn => "pushback_on",
            Self::PushbackOff => "pushback_off",
            Self::TaxiOn => "taxi_on",
            Self::TaxiOff => "taxi_off",
            Self::TakeoffOn => "takeoff_on",
            Self::TakeoffOff => "takeoff_off",
        }
    }

    /// Parses a canonical phase name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }
}

impl std::fmt::Display for PhaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Compiled model
// ============================================================================

/// A fully compiled procedure step.
///
/// `display_id` groups steps for display and external tooling; it is NOT a
/// sort key. Ids repeat and run non-monotonic in real catalogues, and
/// execution order is array position alone.
#[derive(Debug, Clone)]
pub struct ProcedureStep {
    /// Human-readable step description (not unique).
    pub name: String,
    /// Display/grouping tag.
    pub display_id: u32,
    /// Pure waits poll a predicate and command nothing.
    pub pure_wait: bool,
    /// Time budget before the step is abandoned with a warning.
    pub timeout: Duration,
    /// Skip/confirmation predicate for command steps.
    pub check: Program,
    /// Command program, or the wait predicate for pure waits.
    pub program: Program,
    /// Recognized catalogue flag with no runtime effect.
    pub expedite: bool,
}

impl ProcedureStep {
    /// The predicate polled for skip and confirmation. For pure waits the
    /// wait predicate itself fills both roles.
    #[must_use]
    pub const fn predicate(&self) -> &Program {
        if self.pure_wait { &self.program } else { &self.check }
    }
}

/// A named, ordered list of procedure steps.
#[derive(Debug, Clone)]
pub struct Phase {
    /// Which of the eight phases this is.
    pub id: PhaseId,
    /// Steps in execution order.
    pub steps: Vec<ProcedureStep>,
}

/// Aircraft metadata carried by a catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AircraftInfo {
    /// Aircraft type name, e.g. `A320-251N`.
    pub name: String,
    /// Optional variant qualifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// An immutable, aircraft-specific procedure catalogue.
///
/// Built exclusively by the loader; the preset controller and CLI share it
/// behind `Arc` and never mutate it.
#[derive(Debug, Clone)]
pub struct ProcedureCatalogue {
    aircraft: AircraftInfo,
    phases: IndexMap<PhaseId, Phase>,
}

impl ProcedureCatalogue {
    pub(crate) fn new(aircraft: AircraftInfo, phases: IndexMap<PhaseId, Phase>) -> Self {
        Self { aircraft, phases }
    }

    /// Aircraft metadata.
    #[must_use]
    pub const fn aircraft(&self) -> &AircraftInfo {
        &self.aircraft
    }

    /// Looks up a phase.
    #[must_use]
    pub fn phase(&self, id: PhaseId) -> Option<&Phase> {
        self.phases.get(&id)
    }

    /// Whether the catalogue defines the given phase.
    #[must_use]
    pub fn contains(&self, id: PhaseId) -> bool {
        self.phases.contains_key(&id)
    }

    /// Phases in catalogue file order.
    pub fn phases(&self) -> impl Iterator<Item = &Phase> {
        self.phases.values()
    }

    /// Number of phases defined.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Whether the catalogue defines no phases. The loader rejects such
    /// catalogues, so this is only reachable on hand-built instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Total step count across a phase sequence. Phases missing from the
    /// catalogue count zero.
    #[must_use]
    pub fn total_steps(&self, sequence: &[PhaseId]) -> usize {
        sequence
            .iter()
            .filter_map(|id| self.phase(*id))
            .map(|phase| phase.steps.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_id_round_trip() {
        for id in PhaseId::ALL {
            assert_eq!(PhaseId::parse(id.as_str()), Some(id));
        }
        assert_eq!(PhaseId::parse("cruise"), None);
    }

    #[test]
    fn test_phase_id_serde_names() {
        let yaml = serde_yaml::to_string(&PhaseId::PushbackOff).unwrap();
        assert_eq!(yaml.trim(), "pushback_off");
        let parsed: PhaseId = serde_yaml::from_str("takeoff_on").unwrap();
        assert_eq!(parsed, PhaseId::TakeoffOn);
    }

    #[test]
    fn test_category_pairing() {
        assert_eq!(PhaseCategory::Power.on(), PhaseId::PowerOn);
        assert_eq!(PhaseCategory::Takeoff.off(), PhaseId::TakeoffOff);
        for id in PhaseId::ALL {
            let category = id.category();
            let paired = if id.is_on() { category.on() } else { category.off() };
            assert_eq!(paired, id);
        }
    }

    #[test]
    fn test_category_rank_order() {
        assert!(PhaseCategory::Power < PhaseCategory::Pushback);
        assert!(PhaseCategory::Pushback < PhaseCategory::Taxi);
        assert!(PhaseCategory::Taxi < PhaseCategory::Takeoff);
    }

    #[test]
    fn test_pure_wait_predicate_is_the_program() {
        let step = ProcedureStep {
            name: "Await AC bus".to_string(),
            display_id: 1060,
            pure_wait: true,
            timeout: Duration::from_secs(2),
            check: Program::empty(),
            program: Program::compile("(L:AC_BUS_POWERED)").unwrap(),
            expedite: false,
        };
        assert_eq!(step.predicate().source(), "(L:AC_BUS_POWERED)");
    }
}
