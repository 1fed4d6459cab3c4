//! Named preset targets and transition planning.
//!
//! A preset target names an aircraft readiness level over the four phase
//! categories. Planning a transition between two targets yields the
//! phase sequence the controller should run: ON phases in category order
//! going up, OFF phases in reverse category order coming down.

use serde::{Deserialize, Serialize};

use crate::catalogue::{PhaseCategory, PhaseId};

/// The five aircraft readiness targets, ordered cold to ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetTarget {
    /// Nothing powered.
    ColdAndDark,
    /// Electrical power established.
    Powered,
    /// Powered, pushback preparations done.
    ReadyForPushback,
    /// Engines running, ready to taxi.
    ReadyForTaxi,
    /// Takeoff configuration set.
    ReadyForTakeoff,
}

/// Category activation order, lowest readiness first.
const CATEGORY_ORDER: [PhaseCategory; 4] = [
    PhaseCategory::Power,
    PhaseCategory::Pushback,
    PhaseCategory::Taxi,
    PhaseCategory::Takeoff,
];

impl PresetTarget {
    /// All targets, cold to ready.
    pub const ALL: [Self; 5] = [
        Self::ColdAndDark,
        Self::Powered,
        Self::ReadyForPushback,
        Self::ReadyForTaxi,
        Self::ReadyForTakeoff,
    ];

    /// Readiness rank: the number of active categories at this target.
    #[must_use]
    pub const fn rank(self) -> usize {
        match self {
            Self::ColdAndDark => 0,
            Self::Powered => 1,
            Self::ReadyForPushback => 2,
            Self::ReadyForTaxi => 3,
            Self::ReadyForTakeoff => 4,
        }
    }

    /// Kebab-case name as used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColdAndDark => "cold-and-dark",
            Self::Powered => "powered",
            Self::ReadyForPushback => "ready-for-pushback",
            Self::ReadyForTaxi => "ready-for-taxi",
            Self::ReadyForTakeoff => "ready-for-takeoff",
        }
    }

    /// Parses a kebab-case target name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Plans the phase sequence from `self` to `to`.
    ///
    /// Going up, the ON phases of every category above `self` up to `to`
    /// run in category order. Coming down, the OFF phases of every
    /// category above `to` run in reverse category order; step order
    /// inside each OFF phase is not reversed. Equal targets plan an
    /// empty sequence.
    #[must_use]
    pub fn transition_sequence(self, to: Self) -> Vec<PhaseId> {
        let from = self.rank();
        let to = to.rank();
        if to > from {
            CATEGORY_ORDER[from..to].iter().map(|c| c.on()).collect()
        } else {
            CATEGORY_ORDER[to..from]
                .iter()
                .rev()
                .map(|c| c.off())
                .collect()
        }
    }
}

impl std::fmt::Display for PresetTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_power_up_sequence() {
        let seq = PresetTarget::ColdAndDark.transition_sequence(PresetTarget::ReadyForTakeoff);
        assert_eq!(
            seq,
            [
                PhaseId::PowerOn,
                PhaseId::PushbackOn,
                PhaseId::TaxiOn,
                PhaseId::TakeoffOn,
            ]
        );
    }

    #[test]
    fn test_full_power_down_reverses_categories() {
        let seq = PresetTarget::ReadyForTakeoff.transition_sequence(PresetTarget::ColdAndDark);
        assert_eq!(
            seq,
            [
                PhaseId::TakeoffOff,
                PhaseId::TaxiOff,
                PhaseId::PushbackOff,
                PhaseId::PowerOff,
            ]
        );
    }

    #[test]
    fn test_partial_up_skips_active_categories() {
        let seq = PresetTarget::Powered.transition_sequence(PresetTarget::ReadyForTaxi);
        assert_eq!(seq, [PhaseId::PushbackOn, PhaseId::TaxiOn]);
    }

    #[test]
    fn test_partial_down_keeps_lower_categories() {
        let seq = PresetTarget::ReadyForTaxi.transition_sequence(PresetTarget::Powered);
        assert_eq!(seq, [PhaseId::TaxiOff, PhaseId::PushbackOff]);
    }

    #[test]
    fn test_same_target_plans_nothing() {
        for target in PresetTarget::ALL {
            assert!(target.transition_sequence(target).is_empty());
        }
    }

    #[test]
    fn test_adjacent_transitions_are_single_phases() {
        assert_eq!(
            PresetTarget::ColdAndDark.transition_sequence(PresetTarget::Powered),
            [PhaseId::PowerOn]
        );
        assert_eq!(
            PresetTarget::Powered.transition_sequence(PresetTarget::ColdAndDark),
            [PhaseId::PowerOff]
        );
    }

    #[test]
    fn test_parse_round_trip() {
        for target in PresetTarget::ALL {
            assert_eq!(PresetTarget::parse(target.as_str()), Some(target));
        }
        assert_eq!(PresetTarget::parse("warp-speed"), None);
    }

    #[test]
    fn test_rank_is_monotonic() {
        let ranks: Vec<usize> = PresetTarget::ALL.iter().map(|t| t.rank()).collect();
        assert_eq!(ranks, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_serde_names_are_kebab_case() {
        let json = serde_json::to_string(&PresetTarget::ReadyForTaxi).unwrap();
        assert_eq!(json, "\"ready-for-taxi\"");
        let parsed: PresetTarget = serde_json::from_str("\"cold-and-dark\"").unwrap();
        assert_eq!(parsed, PresetTarget::ColdAndDark);
    }
}
