//! Scoring gate: turns sub-scores into awarded XP and a verification outcome.
//!
//! Pure function over deterministic signals. Rules, in order:
//! 1. Proof required but missing -> Rejected, no XP
//! 2. Safety below the hard floor -> Pending_Review (regardless of quality)
//! 3. Overall quality inside the ambiguous band -> Pending_Review
//! 4. Otherwise -> Auto_Approved
//!
//! XP is `round(xp_potential * overall_quality)`, floored at the minimum
//! participation award for every non-rejected outcome.

use crate::completion::{ScoreCard, VerificationStatus};
use crate::profile::HunterClass;
use serde::{Deserialize, Serialize};

/// Thresholds and multipliers for scoring (configurable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Smallest award for any non-rejected completion (default: 10)
    pub min_participation_xp: u32,
    /// Lower bound of the ambiguous quality band, inclusive (default: 0.4)
    pub review_band_low: f64,
    /// Upper bound of the ambiguous quality band, inclusive (default: 0.6)
    pub review_band_high: f64,
    /// Safety below this always goes to review (default: 0.3)
    pub safety_floor: f64,
    /// Apply class synergy and streak multipliers (default: off)
    pub apply_bonuses: bool,
    /// Multiplier when the plan targets the hunter's class (default: 1.1)
    pub class_synergy_multiplier: f64,
    /// Streak bonus per consecutive completion (default: 0.02)
    pub streak_bonus_per_day: f64,
    /// Cap on the streak bonus (default: 0.2)
    pub streak_bonus_cap: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            min_participation_xp: 10,
            review_band_low: 0.4,
            review_band_high: 0.6,
            safety_floor: 0.3,
            apply_bonuses: false,
            class_synergy_multiplier: 1.1,
            streak_bonus_per_day: 0.02,
            streak_bonus_cap: 0.2,
        }
    }
}

impl ScoringPolicy {
    pub fn in_review_band(&self, quality: f64) -> bool {
        quality >= self.review_band_low && quality <= self.review_band_high
    }

    /// Combined class synergy and streak multiplier (1.0 when bonuses are off)
    pub fn bonus_multiplier(&self, bonus: &BonusContext) -> f64 {
        if !self.apply_bonuses {
            return 1.0;
        }
        let synergy = if bonus.plan_class == bonus.hunter_class {
            self.class_synergy_multiplier
        } else {
            1.0
        };
        let streak = 1.0
            + (bonus.streak_current as f64 * self.streak_bonus_per_day).min(self.streak_bonus_cap);
        synergy * streak
    }
}

/// Inputs for the optional bonus multipliers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusContext {
    pub plan_class: HunterClass,
    pub hunter_class: HunterClass,
    pub streak_current: u32,
}

/// Why a completion was not auto-approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    MissingProof,
    SafetyFloor,
    AmbiguousQuality,
}

/// Everything the gate needs to decide
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput {
    pub scores: ScoreCard,
    pub xp_potential: u32,
    pub requires_proof: bool,
    pub proof_supplied: bool,
    pub bonus: Option<BonusContext>,
}

impl ScoringInput {
    pub fn new(scores: ScoreCard, xp_potential: u32) -> Self {
        Self {
            scores,
            xp_potential,
            requires_proof: false,
            proof_supplied: false,
            bonus: None,
        }
    }

    pub fn with_proof(mut self, required: bool, supplied: bool) -> Self {
        self.requires_proof = required;
        self.proof_supplied = supplied;
        self
    }

    pub fn with_bonus(mut self, bonus: BonusContext) -> Self {
        self.bonus = Some(bonus);
        self
    }
}

/// Computed fields for a completion log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringOutcome {
    pub overall_quality: f64,
    pub xp_awarded: u32,
    pub verification_status: VerificationStatus,
    pub reasons: Vec<ReviewReason>,
    pub bonus_multiplier: f64,
}

/// Score a completion with the given policy
pub fn score_completion(input: &ScoringInput, policy: &ScoringPolicy) -> ScoringOutcome {
    let quality = input.scores.overall_quality();

    // Rule 1: proof gate
    if input.requires_proof && !input.proof_supplied {
        tracing::debug!(quality, "Completion rejected: proof missing");
        return ScoringOutcome {
            overall_quality: quality,
            xp_awarded: 0,
            verification_status: VerificationStatus::Rejected,
            reasons: vec![ReviewReason::MissingProof],
            bonus_multiplier: 1.0,
        };
    }

    let bonus_multiplier = input
        .bonus
        .map(|b| policy.bonus_multiplier(&b))
        .unwrap_or(1.0);
    let raw = (input.xp_potential as f64 * quality * bonus_multiplier).round() as u32;
    let xp_awarded = raw.max(policy.min_participation_xp);

    let mut reasons = Vec::new();

    // Rule 2: safety floor flags regardless of everything else
    if input.scores.safety_score < policy.safety_floor {
        tracing::warn!(
            safety = input.scores.safety_score,
            floor = policy.safety_floor,
            "Safety floor breached, flagging for review"
        );
        reasons.push(ReviewReason::SafetyFloor);
    }

    // Rule 3: ambiguous middle band
    if policy.in_review_band(quality) {
        reasons.push(ReviewReason::AmbiguousQuality);
    }

    let verification_status = if reasons.is_empty() {
        VerificationStatus::AutoApproved
    } else {
        VerificationStatus::PendingReview
    };

    tracing::debug!(
        quality,
        xp_awarded,
        status = %verification_status,
        "Completion scored"
    );

    ScoringOutcome {
        overall_quality: quality,
        xp_awarded,
        verification_status,
        reasons,
        bonus_multiplier,
    }
}
