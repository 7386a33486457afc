// SPDX-License-Identifier: GPL-3.0-or-later

//! Keep / upgrade / reject decision for a scored candidate release.
//!
//! Checks run in a fixed order:
//! 1. Candidates below the profile's minimum score are rejected.
//! 2. With nothing on disk, the candidate is acquired.
//! 3. With upgrades disabled, the existing release is kept.
//! 4. Once the cutoff is met and the existing score reached the ceiling,
//!    the existing release is kept.
//! 5. Otherwise the candidate must beat the existing score by the minimum
//!    increment.

use profilarr_domain::Profile;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeDecision {
    Keep,
    Upgrade,
    Reject,
}

impl std::fmt::Display for UpgradeDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Upgrade => write!(f, "upgrade"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    BelowMinimumScore,
    FirstAcquisition,
    UpgradesDisabled,
    CeilingReached,
    IncrementMet,
    IncrementNotMet,
}

impl DecisionReason {
    pub fn decision(self) -> UpgradeDecision {
        match self {
            Self::BelowMinimumScore => UpgradeDecision::Reject,
            Self::FirstAcquisition | Self::IncrementMet => UpgradeDecision::Upgrade,
            Self::UpgradesDisabled | Self::CeilingReached | Self::IncrementNotMet => {
                UpgradeDecision::Keep
            }
        }
    }
}

/// Decide what to do with a candidate scoring `candidate_score` when the
/// existing release (if any) scores `existing_score`.
pub fn decide(
    candidate_score: i32,
    existing_score: Option<i32>,
    cutoff_met: bool,
    profile: &Profile,
) -> UpgradeDecision {
    explain_decision(candidate_score, existing_score, cutoff_met, profile).decision()
}

/// Like [`decide`], but returns the rule that fired.
pub fn explain_decision(
    candidate_score: i32,
    existing_score: Option<i32>,
    cutoff_met: bool,
    profile: &Profile,
) -> DecisionReason {
    let reason = if candidate_score < profile.min_custom_format_score {
        DecisionReason::BelowMinimumScore
    } else {
        match existing_score {
            None => DecisionReason::FirstAcquisition,
            Some(_) if !profile.upgrades_allowed => DecisionReason::UpgradesDisabled,
            Some(existing) if cutoff_met && existing >= profile.upgrade_until_score => {
                DecisionReason::CeilingReached
            }
            Some(existing) => {
                if candidate_score.saturating_sub(existing) >= profile.min_score_increment {
                    DecisionReason::IncrementMet
                } else {
                    DecisionReason::IncrementNotMet
                }
            }
        }
    };

    debug!(
        target: "upgrade",
        profile = %profile.name,
        candidate_score,
        existing_score,
        cutoff_met,
        ?reason,
        "upgrade decision"
    );

    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use profilarr_domain::ConsumerApp;

    fn profile() -> Profile {
        Profile::new("HD", ConsumerApp::Radarr)
            .with_min_score(0)
            .with_upgrades(100, 5)
    }

    #[test]
    fn floor_dominates_everything() {
        let profile = profile().with_min_score(10);
        assert_eq!(decide(9, None, false, &profile), UpgradeDecision::Reject);
        assert_eq!(decide(9, Some(0), false, &profile), UpgradeDecision::Reject);
        assert_eq!(
            explain_decision(-50, Some(-100), true, &profile),
            DecisionReason::BelowMinimumScore
        );
    }

    #[test]
    fn first_acquisition_upgrades_even_when_disabled() {
        let mut profile = profile();
        profile.upgrades_allowed = false;
        assert_eq!(decide(0, None, false, &profile), UpgradeDecision::Upgrade);
        assert_eq!(
            explain_decision(0, None, true, &profile),
            DecisionReason::FirstAcquisition
        );
    }

    #[test]
    fn disabled_upgrades_keep_existing() {
        let mut profile = profile();
        profile.upgrades_allowed = false;
        assert_eq!(decide(1_000, Some(0), false, &profile), UpgradeDecision::Keep);
        assert_eq!(
            explain_decision(1_000, Some(0), false, &profile),
            DecisionReason::UpgradesDisabled
        );
    }

    #[test]
    fn ceiling_requires_cutoff_and_score() {
        let profile = profile();
        assert_eq!(
            explain_decision(200, Some(100), true, &profile),
            DecisionReason::CeilingReached
        );
        // ceiling score reached but cutoff not met: keep improving
        assert_eq!(decide(200, Some(100), false, &profile), UpgradeDecision::Upgrade);
    }

    #[test]
    fn increment_threshold() {
        let profile = profile();
        assert_eq!(decide(86, Some(80), true, &profile), UpgradeDecision::Upgrade);
        assert_eq!(decide(85, Some(80), true, &profile), UpgradeDecision::Upgrade);
        assert_eq!(decide(83, Some(80), true, &profile), UpgradeDecision::Keep);
        assert_eq!(
            explain_decision(83, Some(80), true, &profile),
            DecisionReason::IncrementNotMet
        );
    }

    #[test]
    fn reason_maps_to_decision() {
        assert_eq!(DecisionReason::IncrementMet.decision(), UpgradeDecision::Upgrade);
        assert_eq!(DecisionReason::CeilingReached.decision(), UpgradeDecision::Keep);
        assert_eq!(UpgradeDecision::Reject.to_string(), "reject");
    }
}
