//! Ascend Common - progression and quest lifecycle engine v0.6.0
//!
//! Pure and synchronous. Records are handed in, decisions and updated
//! records come back; storage, proof upload and plan generation belong to
//! the caller.
//! v0.5.0: Rank-up exams and judge overrides.
//! v0.6.0: Fallback judge, streak bonuses, TOML config.

pub mod bypass;
pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod exam;
pub mod judge;
pub mod profile;
pub mod progression;
pub mod quest;
pub mod rank;
pub mod scoring;

pub use bypass::{
    apply_override, BypassPolicy, BypassReason, BypassRequest, BypassType, OverrideOutcome,
    OverrideRecord, RawBypassRequest,
};
pub use completion::{CompletionLog, CompletionSubmission, ExerciseLog, ScoreCard, VerificationStatus};
pub use config::EngineConfig;
pub use engine::{AbandonOutcome, CompletionOutcome, OverrideApplied, QuestEngine};
pub use error::{EngineError, Result};
pub use events::ProgressEvent;
pub use exam::{start_exam, resolve_exam, ExamPolicy, ExamResolution, PlanRequest, QuestPlanner};
pub use judge::fallback_scores;
pub use profile::{Assessment, HunterClass, HunterStats, HunterStatus, Profile};
pub use progression::{
    level_from_xp, level_progress, xp_for_level, xp_to_next_level, LevelChange, Progression,
    StreakState,
};
pub use quest::{
    end_of_day, is_expired, reusable_daily_quest, AbandonPolicy, Exercise, ExerciseKind,
    ProofType, Quest, QuestStatus, QuestType, WorkoutPlan,
};
pub use rank::{
    check_rank_up_eligibility, initial_rank_from_assessment, rank_from_level, Eligibility,
    RankTier,
};
pub use scoring::{score_completion, BonusContext, ReviewReason, ScoringInput, ScoringOutcome, ScoringPolicy};
