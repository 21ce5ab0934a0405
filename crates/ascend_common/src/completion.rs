//! Completion submissions and the immutable completion log.

use crate::bypass::OverrideRecord;
use crate::error::{EngineError, Result};
use crate::quest::ProofType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of verifying a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    #[serde(rename = "Auto_Approved")]
    AutoApproved,
    #[serde(rename = "Pending_Review")]
    PendingReview,
    Rejected,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AutoApproved => write!(f, "Auto_Approved"),
            Self::PendingReview => write!(f, "Pending_Review"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Per-exercise report in a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub exercise_id: String,
    pub sets_done: u32,
    pub reps_done: String,
    #[serde(default)]
    pub skipped: bool,
}

impl ExerciseLog {
    /// Reps claimed for this exercise (0 when skipped or unparseable).
    /// Saturates at `u64::MAX`.
    pub fn total_reps(&self) -> u64 {
        if self.skipped {
            return 0;
        }
        leading_number(&self.reps_done).saturating_mul(self.sets_done as u64)
    }
}

/// Leading integer of a reps string: "12" -> 12, "8-10" -> 8, "AMRAP" -> 0.
/// Numbers too large for u64 read as `u64::MAX`.
fn leading_number(reps: &str) -> u64 {
    reps.trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .fold(0u64, |acc, c| {
            acc.saturating_mul(10)
                .saturating_add(u64::from(c as u8 - b'0'))
        })
}

/// What the hunter submits when finishing a quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSubmission {
    pub quest_id: Uuid,
    /// Minutes actually spent
    pub duration_actual: u32,
    /// Reported exertion, 1-10
    pub rpe_actual: u8,
    #[serde(default)]
    pub user_feedback: Option<String>,
    #[serde(default)]
    pub exercises_completed: Vec<ExerciseLog>,
    #[serde(default)]
    pub proof_media_url: Option<String>,
    #[serde(default)]
    pub proof_type: ProofType,
}

impl CompletionSubmission {
    pub fn validate(&self) -> Result<()> {
        if self.duration_actual == 0 {
            return Err(EngineError::InvalidRecord(
                "duration_actual must be at least 1 minute".to_string(),
            ));
        }
        if !(1..=10).contains(&self.rpe_actual) {
            return Err(EngineError::InvalidRecord(format!(
                "rpe_actual {} outside 1-10",
                self.rpe_actual
            )));
        }
        Ok(())
    }

    pub fn has_proof(&self) -> bool {
        self.proof_media_url
            .as_deref()
            .map(|u| !u.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn completed_exercises(&self) -> usize {
        self.exercises_completed.iter().filter(|e| !e.skipped).count()
    }

    pub fn total_reps(&self) -> u64 {
        self.exercises_completed
            .iter()
            .map(ExerciseLog::total_reps)
            .fold(0, u64::saturating_add)
    }
}

/// Integrity / effort / safety sub-scores, each validated into [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub integrity_score: f64,
    pub effort_score: f64,
    pub safety_score: f64,
}

impl ScoreCard {
    pub fn new(integrity: f64, effort: f64, safety: f64) -> Result<Self> {
        let card = Self {
            integrity_score: integrity,
            effort_score: effort,
            safety_score: safety,
        };
        card.validate()?;
        Ok(card)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("integrity_score", self.integrity_score),
            ("effort_score", self.effort_score),
            ("safety_score", self.safety_score),
        ] {
            // NaN fails the range check too
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidScore { field, value });
            }
        }
        Ok(())
    }

    /// Mean of the three sub-scores
    pub fn overall_quality(&self) -> f64 {
        (self.integrity_score + self.effort_score + self.safety_score) / 3.0
    }
}

/// Immutable record of one quest completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionLog {
    pub id: Uuid,
    pub quest_id: Uuid,
    pub user_id: Uuid,
    pub duration_actual: u32,
    pub rpe_actual: u8,
    pub user_feedback: Option<String>,
    pub exercises_completed: Vec<ExerciseLog>,
    pub proof_media_url: Option<String>,
    pub proof_type: ProofType,
    #[serde(flatten)]
    pub scores: ScoreCard,
    pub overall_quality: f64,
    pub xp_awarded: u32,
    pub verification_status: VerificationStatus,
    /// Set only when a judge or admin forced the outcome
    #[serde(default)]
    pub override_record: Option<OverrideRecord>,
    pub completed_at: DateTime<Utc>,
}

impl CompletionLog {
    pub fn is_overridden(&self) -> bool {
        self.override_record.is_some()
    }
}
