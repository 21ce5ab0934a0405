//! Rank-up exam orchestrator (v0.5.0)
//!
//! An exam is a `RankUp` quest for the tier above the hunter's current one.
//! Starting one requires eligibility and no other open exam. Passing it is
//! the only way a tier changes after onboarding.

use crate::completion::{CompletionLog, VerificationStatus};
use crate::error::{EngineError, Result};
use crate::profile::{HunterClass, Profile};
use crate::quest::{ProofType, Quest, QuestStatus, QuestType, WorkoutPlan};
use crate::rank::{check_rank_up_eligibility, RankTier};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXAM_XP: u32 = 500;
pub const DEFAULT_EXAM_DURATION_MIN: u32 = 45;
pub const DEFAULT_EXAM_WINDOW_HOURS: i64 = 24;

const EXAM_NARRATIVE: &str =
    "You stand before the Gate. Prove your strength to ascend. ASCEND demands absolute perfection.";

/// Fixed parameters for every exam quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamPolicy {
    pub xp_potential: u32,
    pub duration_min: u32,
    pub window_hours: i64,
    /// Equipment assumed for every hunter, regardless of what they own
    pub equipment: Vec<String>,
}

impl Default for ExamPolicy {
    fn default() -> Self {
        Self {
            xp_potential: DEFAULT_EXAM_XP,
            duration_min: DEFAULT_EXAM_DURATION_MIN,
            window_hours: DEFAULT_EXAM_WINDOW_HOURS,
            equipment: vec!["Bodyweight".to_string()],
        }
    }
}

/// What the planner is asked to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub class: HunterClass,
    pub rank: RankTier,
    pub time_window_min: u32,
    pub equipment: Vec<String>,
    pub muscle_soreness: Vec<String>,
}

/// Workout plan generator (an AI planner in production)
pub trait QuestPlanner {
    /// Produce a plan for the request; the orchestrator overrides exam fields
    fn generate(&self, request: &PlanRequest) -> anyhow::Result<WorkoutPlan>;
}

impl<F> QuestPlanner for F
where
    F: Fn(&PlanRequest) -> anyhow::Result<WorkoutPlan>,
{
    fn generate(&self, request: &PlanRequest) -> anyhow::Result<WorkoutPlan> {
        self(request)
    }
}

/// Open exam quest for this hunter, if any
pub fn active_exam<'a>(profile: &Profile, quests: &'a [Quest], now: DateTime<Utc>) -> Option<&'a Quest> {
    quests.iter().find(|q| {
        q.user_id == profile.id && q.is_exam() && q.effective_status(now) == QuestStatus::Active
    })
}

/// Create an exam quest for the hunter's next tier
pub fn start_exam(
    profile: &Profile,
    quests: &[Quest],
    planner: &dyn QuestPlanner,
    policy: &ExamPolicy,
    now: DateTime<Utc>,
) -> Result<Quest> {
    let eligibility = check_rank_up_eligibility(profile);
    let next_rank = match eligibility.next_rank {
        Some(next) if eligibility.eligible => next,
        _ => {
            return Err(EngineError::NotEligible {
                rank: profile.rank_tier(),
                level: profile.level(),
            })
        }
    };

    if let Some(open) = active_exam(profile, quests, now) {
        return Err(EngineError::ExamAlreadyActive { quest_id: open.id });
    }

    let request = PlanRequest {
        class: profile.class,
        rank: next_rank,
        time_window_min: policy.duration_min,
        equipment: policy.equipment.clone(),
        // Soreness is ignored for exams
        muscle_soreness: Vec::new(),
    };
    let mut plan = planner
        .generate(&request)
        .map_err(|e| EngineError::Generation(format!("{:#}", e)))?;

    plan.quest_name = format!("GATEKEEPER EXAM: {}", next_rank.as_str().to_uppercase());
    plan.quest_type = QuestType::RankUp;
    plan.quest_rank = next_rank;
    plan.narrative_intro = EXAM_NARRATIVE.to_string();
    plan.requires_proof = true;
    plan.proof_type = ProofType::Video;
    plan.base_xp = policy.xp_potential;
    plan.estimated_duration_min = policy.duration_min;
    plan.validate()?;

    let quest = Quest::from_plan(
        profile.id,
        plan,
        now,
        now + Duration::hours(policy.window_hours),
    );

    tracing::info!(
        profile = %profile.id,
        quest = %quest.id,
        from = %profile.rank_tier(),
        to = %next_rank,
        "Rank-up exam started"
    );
    Ok(quest)
}

/// What a finished exam did to the hunter's tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ExamResolution {
    Promoted { from: RankTier, to: RankTier },
    /// Not approved; the tier is unchanged and the exam may be retried
    NotPassed { status: VerificationStatus },
    /// The hunter's tier no longer sits just below the exam's tier
    Stale { current: RankTier },
    /// XP was clawed back below the exam level; the tier is unchanged
    BelowLevel { level: u32, required: u32 },
    NotAnExam,
}

impl ExamResolution {
    pub fn promoted(&self) -> bool {
        matches!(self, ExamResolution::Promoted { .. })
    }
}

/// Apply a scored exam completion to the hunter's tier.
///
/// Promotion needs an `Auto_Approved` log, whether scored that way or forced
/// by a judge override, and the hunter must still hold the exam level.
pub fn resolve_exam(profile: &mut Profile, quest: &Quest, log: &CompletionLog) -> Result<ExamResolution> {
    if quest.user_id != profile.id {
        return Err(EngineError::Ownership { quest_id: quest.id });
    }
    if log.quest_id != quest.id {
        return Err(EngineError::InvalidRecord(format!(
            "completion log {} does not belong to quest {}",
            log.id, quest.id
        )));
    }
    if !quest.is_exam() {
        return Ok(ExamResolution::NotAnExam);
    }
    if log.verification_status != VerificationStatus::AutoApproved {
        tracing::info!(
            profile = %profile.id,
            quest = %quest.id,
            status = %log.verification_status,
            "Rank-up exam not passed"
        );
        return Ok(ExamResolution::NotPassed {
            status: log.verification_status,
        });
    }

    let from = profile.rank_tier();
    if from.next() != Some(quest.rank_difficulty) {
        tracing::warn!(
            profile = %profile.id,
            quest = %quest.id,
            current = %from,
            exam = %quest.rank_difficulty,
            "Exam tier does not follow current tier"
        );
        return Ok(ExamResolution::Stale { current: from });
    }

    if let Some(required) = from.exam_level().filter(|required| profile.level() < *required) {
        tracing::info!(
            profile = %profile.id,
            quest = %quest.id,
            level = profile.level(),
            required,
            "Exam approved below the exam level"
        );
        return Ok(ExamResolution::BelowLevel {
            level: profile.level(),
            required,
        });
    }

    profile.promote(quest.rank_difficulty);
    tracing::info!(profile = %profile.id, %from, to = %quest.rank_difficulty, "Rank up");
    Ok(ExamResolution::Promoted {
        from,
        to: quest.rank_difficulty,
    })
}
