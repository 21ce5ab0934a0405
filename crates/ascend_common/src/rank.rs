//! Rank tiers (v0.3.0)
//!
//! Six ordered tiers, E through S. A hunter's tier is seeded once from the
//! onboarding assessment and afterwards only moves through the rank-up exam.
//!
//! ## Tier ladder
//!
//! | Tier   | Assessment pushups | Exam unlocks at level |
//! |--------|--------------------|-----------------------|
//! | E-Rank | < 10               | 10 (for D-Rank)       |
//! | D-Rank | >= 10              | 20 (for C-Rank)       |
//! | C-Rank | >= 25              | 30 (for B-Rank)       |
//! | B-Rank | >= 50              | 40 (for A-Rank)       |
//! | A-Rank | >= 75              | 50 (for S-Rank)       |
//! | S-Rank | >= 100             | -                     |

use crate::error::EngineError;
use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Hunter rank tier, ordered from weakest (E) to strongest (S)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum RankTier {
    #[default]
    #[serde(rename = "E-Rank")]
    E,
    #[serde(rename = "D-Rank")]
    D,
    #[serde(rename = "C-Rank")]
    C,
    #[serde(rename = "B-Rank")]
    B,
    #[serde(rename = "A-Rank")]
    A,
    #[serde(rename = "S-Rank")]
    S,
}

/// Minimum level for each tier, used both descriptively and as exam gates
pub const LEVEL_THRESHOLDS: &[(RankTier, u32)] = &[
    (RankTier::S, 50),
    (RankTier::A, 40),
    (RankTier::B, 30),
    (RankTier::C, 20),
    (RankTier::D, 10),
];

/// Minimum pushups in the onboarding assessment for each tier
pub const ASSESSMENT_THRESHOLDS: &[(RankTier, u32)] = &[
    (RankTier::S, 100),
    (RankTier::A, 75),
    (RankTier::B, 50),
    (RankTier::C, 25),
    (RankTier::D, 10),
];

impl RankTier {
    pub const ALL: [RankTier; 6] = [
        RankTier::E,
        RankTier::D,
        RankTier::C,
        RankTier::B,
        RankTier::A,
        RankTier::S,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankTier::E => "E-Rank",
            RankTier::D => "D-Rank",
            RankTier::C => "C-Rank",
            RankTier::B => "B-Rank",
            RankTier::A => "A-Rank",
            RankTier::S => "S-Rank",
        }
    }

    /// The tier an exam from this tier would grant. S-Rank is terminal.
    pub fn next(&self) -> Option<RankTier> {
        match self {
            RankTier::E => Some(RankTier::D),
            RankTier::D => Some(RankTier::C),
            RankTier::C => Some(RankTier::B),
            RankTier::B => Some(RankTier::A),
            RankTier::A => Some(RankTier::S),
            RankTier::S => None,
        }
    }

    /// Level at which a hunter of this tier may attempt the next tier's exam
    pub fn exam_level(&self) -> Option<u32> {
        let next = self.next()?;
        LEVEL_THRESHOLDS
            .iter()
            .find(|(tier, _)| *tier == next)
            .map(|(_, level)| *level)
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for RankTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RankTier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RankTier::ALL
            .iter()
            .copied()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| EngineError::UnknownValue {
                kind: "rank tier",
                value: s.to_string(),
            })
    }
}

/// Seed tier from the onboarding pushup assessment. Applied once per hunter.
pub fn initial_rank_from_assessment(pushups: u32) -> RankTier {
    ASSESSMENT_THRESHOLDS
        .iter()
        .find(|(_, min)| pushups >= *min)
        .map(|(tier, _)| *tier)
        .unwrap_or(RankTier::E)
}

/// Tier that a level would describe.
///
/// Descriptive only: a profile's tier never follows this mapping on its own,
/// it changes through the rank-up exam.
pub fn rank_from_level(level: u32) -> RankTier {
    LEVEL_THRESHOLDS
        .iter()
        .find(|(_, min)| level >= *min)
        .map(|(tier, _)| *tier)
        .unwrap_or(RankTier::E)
}

/// Result of an eligibility check for the next tier's exam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub next_rank: Option<RankTier>,
}

impl Eligibility {
    pub fn not_eligible() -> Self {
        Self { eligible: false, next_rank: None }
    }
}

/// Check whether a hunter may attempt the exam for the tier above theirs
pub fn check_rank_up_eligibility(profile: &Profile) -> Eligibility {
    let tier = profile.rank_tier();
    match (tier.next(), tier.exam_level()) {
        (Some(next), Some(required)) if profile.level() >= required => Eligibility {
            eligible: true,
            next_rank: Some(next),
        },
        _ => Eligibility::not_eligible(),
    }
}
