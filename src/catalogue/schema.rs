//! Raw catalogue file schema.
//!
//! These types mirror the YAML document exactly, before expression
//! compilation and validation. Field-level problems (unknown phase names,
//! missing timeouts, uncompilable expressions) are deliberately NOT
//! enforced here so the validator can collect every issue in one pass
//! instead of failing on the first.

use serde::{Deserialize, Serialize};

use crate::catalogue::AircraftInfo;

/// Top-level catalogue document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueFile {
    /// Aircraft metadata.
    pub aircraft: AircraftInfo,
    /// Phase definitions in file order.
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
}

/// One phase definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Phase name; must be one of the eight canonical names and unique
    /// within the file (validated, not enforced by serde).
    pub name: String,
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// One step definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Human-readable description.
    pub name: String,
    /// Display/grouping tag; not a sort key.
    pub display_id: u32,
    /// Pure waits poll `program` as a predicate and command nothing.
    #[serde(default)]
    pub pure_wait: bool,
    /// Time budget in milliseconds. Required; validated rather than
    /// defaulted so an omission is an authoring error, not a silent zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Skip/confirmation predicate source. Empty means never skip.
    #[serde(default)]
    pub check: String,
    /// Command program source, or the wait predicate for pure waits.
    #[serde(default)]
    pub program: String,
    /// Recognized flag with no runtime effect.
    #[serde(default)]
    pub expedite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_step_defaults() {
        let yaml = r"
name: BAT1 On
display_id: 1010
timeout_ms: 1000
";
        let step: StepConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.name, "BAT1 On");
        assert_eq!(step.display_id, 1010);
        assert_eq!(step.timeout_ms, Some(1000));
        assert!(!step.pure_wait);
        assert!(!step.expedite);
        assert!(step.check.is_empty());
        assert!(step.program.is_empty());
    }

    #[test]
    fn test_full_document_parses() {
        let yaml = r#"
aircraft:
  name: A320-251N
  variant: FlyByWire
phases:
  - name: power_on
    steps:
      - name: BAT1 On
        display_id: 1010
        timeout_ms: 1000
        check: "(L:ELEC_BAT_1_AUTO)"
        program: "1 (>L:ELEC_BAT_1_AUTO)"
      - name: Await AC bus
        display_id: 1060
        pure_wait: true
        timeout_ms: 2000
        program: "(L:ELEC_AC_1_BUS_POWERED)"
"#;
        let file: CatalogueFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.aircraft.name, "A320-251N");
        assert_eq!(file.aircraft.variant.as_deref(), Some("FlyByWire"));
        assert_eq!(file.phases.len(), 1);
        assert_eq!(file.phases[0].steps.len(), 2);
        assert!(file.phases[0].steps[1].pure_wait);
    }

    #[test]
    fn test_missing_timeout_parses_as_none() {
        let yaml = "
name: CVR Test
display_id: 1100
";
        let step: StepConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.timeout_ms, None);
    }
}
