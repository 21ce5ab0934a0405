//! Error types for the progression engine.

use crate::quest::QuestStatus;
use crate::rank::RankTier;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Quest cannot move from {from} to {to}")]
    InvalidTransition { from: QuestStatus, to: QuestStatus },

    #[error("Not eligible for a rank-up exam ({rank}, level {level})")]
    NotEligible { rank: RankTier, level: u32 },

    #[error("A rank-up exam is already active (quest {quest_id})")]
    ExamAlreadyActive { quest_id: Uuid },

    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("Score {field} must be within [0, 1], got {value}")]
    InvalidScore { field: &'static str, value: f64 },

    #[error("Unknown override value: {0}")]
    InvalidOverride(String),

    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Quest {quest_id} does not belong to this hunter")]
    Ownership { quest_id: Uuid },

    #[error("Quest was overridden recently, retry in {remaining_secs}s")]
    BypassCooldown { remaining_secs: i64 },

    #[error("Quest generation failed: {0}")]
    Generation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn code(&self) -> i32 {
        match self {
            EngineError::InvalidTransition { .. } => -33001,
            EngineError::NotEligible { .. } => -33002,
            EngineError::ExamAlreadyActive { .. } => -33003,
            EngineError::InvalidProof(_) => -33004,
            EngineError::InvalidScore { .. } => -33005,
            EngineError::InvalidOverride(_) => -33006,
            EngineError::UnknownValue { .. } => -33007,
            EngineError::InvalidRecord(_) => -33008,
            EngineError::Ownership { .. } => -33009,
            EngineError::BypassCooldown { .. } => -33010,
            EngineError::Generation(_) => -33011,
            EngineError::Json(_) => -32700,
        }
    }

    /// Errors the hunter caused and can fix themselves (vs. bad collaborator input)
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidTransition { .. }
                | EngineError::NotEligible { .. }
                | EngineError::ExamAlreadyActive { .. }
                | EngineError::InvalidProof(_)
                | EngineError::BypassCooldown { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            EngineError::InvalidTransition {
                from: QuestStatus::Completed,
                to: QuestStatus::Completed,
            },
            EngineError::NotEligible { rank: RankTier::E, level: 3 },
            EngineError::ExamAlreadyActive { quest_id: Uuid::nil() },
            EngineError::InvalidProof("missing".to_string()),
            EngineError::InvalidScore { field: "safety_score", value: 1.5 },
            EngineError::InvalidOverride("nope".to_string()),
            EngineError::UnknownValue { kind: "rank tier", value: "Z".to_string() },
            EngineError::InvalidRecord("bad".to_string()),
            EngineError::Ownership { quest_id: Uuid::nil() },
            EngineError::BypassCooldown { remaining_secs: 5 },
            EngineError::Generation("timeout".to_string()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_transition_message() {
        let err = EngineError::InvalidTransition {
            from: QuestStatus::Expired,
            to: QuestStatus::Completed,
        };
        assert_eq!(err.to_string(), "Quest cannot move from Expired to Completed");
        assert!(err.is_user_facing());
        assert!(!EngineError::InvalidRecord("x".into()).is_user_facing());
    }
}
