//! Engine facade: one call per lifecycle operation.
//!
//! The engine holds only configuration. Records go in by reference and come
//! back by value; persisting them (first committer wins per quest, atomic
//! profile updates) is the caller's job.

use crate::bypass::{self, BypassRequest, OverrideRecord};
use crate::completion::{CompletionLog, CompletionSubmission, ScoreCard, VerificationStatus};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::ProgressEvent;
use crate::exam::{self, ExamResolution, QuestPlanner};
use crate::judge;
use crate::profile::Profile;
use crate::progression::{LevelChange, StreakChange};
use crate::quest::{Quest, QuestStatus};
use crate::rank::{check_rank_up_eligibility, Eligibility};
use crate::scoring::{score_completion, BonusContext, ScoringInput, ScoringOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Everything a completion produced
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub quest: Quest,
    pub log: CompletionLog,
    pub profile: Profile,
    pub scoring: ScoringOutcome,
    pub events: Vec<ProgressEvent>,
    pub leveled_up: bool,
    pub ranked_up: bool,
    pub exam: ExamResolution,
}

/// Result of abandoning a quest
#[derive(Debug, Clone, Serialize)]
pub struct AbandonOutcome {
    pub quest: Quest,
    pub profile: Profile,
    pub xp_awarded: u32,
    pub events: Vec<ProgressEvent>,
    pub leveled_up: bool,
}

/// Result of a judge or admin override
#[derive(Debug, Clone, Serialize)]
pub struct OverrideApplied {
    pub log: CompletionLog,
    pub record: OverrideRecord,
    pub profile: Profile,
    pub xp_delta: i64,
    pub events: Vec<ProgressEvent>,
    pub exam: ExamResolution,
}

#[derive(Debug, Clone, Default)]
pub struct QuestEngine {
    pub config: EngineConfig,
}

impl QuestEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Score a completion without touching any record
    pub fn score(&self, input: &ScoringInput) -> ScoringOutcome {
        score_completion(input, &self.config.scoring)
    }

    /// Complete a quest: score it, close it, and credit the hunter.
    ///
    /// `scores` are the external judge's sub-scores; without them the
    /// rule-based fallback judge scores the submission.
    pub fn submit_completion(
        &self,
        profile: &Profile,
        quest: &Quest,
        submission: &CompletionSubmission,
        scores: Option<ScoreCard>,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        check_quest(profile, quest)?;
        if submission.quest_id != quest.id {
            return Err(EngineError::InvalidRecord(format!(
                "submission is for quest {} but quest {} was given",
                submission.quest_id, quest.id
            )));
        }
        submission.validate()?;

        let scores = match scores {
            Some(card) => {
                card.validate()?;
                card
            }
            None => judge::fallback_scores(&quest.plan, submission),
        };

        let status = quest.effective_status(now);
        if status != QuestStatus::Active {
            tracing::warn!(quest = %quest.id, %status, "Completion on closed quest");
            return Err(EngineError::InvalidTransition {
                from: status,
                to: QuestStatus::Completed,
            });
        }

        quest.check_proof(submission.proof_media_url.as_deref(), submission.proof_type)?;

        let input = ScoringInput::new(scores, quest.xp_potential)
            .with_proof(quest.requires_proof, submission.has_proof())
            .with_bonus(BonusContext {
                plan_class: quest.plan.target_class,
                hunter_class: profile.class,
                streak_current: profile.streak_current,
            });
        let scoring = self.score(&input);

        let mut quest = quest.clone();
        quest.complete(now)?;

        let log = CompletionLog {
            id: Uuid::new_v4(),
            quest_id: quest.id,
            user_id: profile.id,
            duration_actual: submission.duration_actual,
            rpe_actual: submission.rpe_actual,
            user_feedback: submission.user_feedback.clone(),
            exercises_completed: submission.exercises_completed.clone(),
            proof_media_url: submission.proof_media_url.clone(),
            proof_type: submission.proof_type,
            scores,
            overall_quality: scoring.overall_quality,
            xp_awarded: scoring.xp_awarded,
            verification_status: scoring.verification_status,
            override_record: None,
            completed_at: now,
        };

        let mut profile = profile.clone();
        let before = check_rank_up_eligibility(&profile);
        let mut events = Vec::new();

        let level_change = profile.apply_award(scoring.xp_awarded as u64);
        push_xp_events(&mut events, &profile, scoring.xp_awarded as i64, level_change);

        let streak = profile.record_streak(scoring.verification_status);
        push_streak_event(&mut events, &profile, streak);

        let exam = exam::resolve_exam(&mut profile, &quest, &log)?;
        push_rank_events(&mut events, &profile, exam, before);
        log_events(&events);

        Ok(CompletionOutcome {
            leveled_up: level_change.leveled_up(),
            ranked_up: exam.promoted(),
            quest,
            log,
            profile,
            scoring,
            events,
            exam,
        })
    }

    /// Close a quest whose deadline has passed
    pub fn expire(&self, quest: &Quest, now: DateTime<Utc>) -> Result<Quest> {
        quest.validate()?;
        let mut quest = quest.clone();
        quest.expire(now)?;
        Ok(quest)
    }

    /// Abandon an open quest, crediting the partial award. Tier is untouched.
    pub fn abandon(&self, profile: &Profile, quest: &Quest, now: DateTime<Utc>) -> Result<AbandonOutcome> {
        check_quest(profile, quest)?;

        let mut quest = quest.clone();
        let xp_awarded = quest.abandon(now, &self.config.abandon)?;

        let mut profile = profile.clone();
        let level_change = profile.apply_award(xp_awarded as u64);
        let mut events = Vec::new();
        push_xp_events(&mut events, &profile, xp_awarded as i64, level_change);
        log_events(&events);

        Ok(AbandonOutcome {
            quest,
            profile,
            xp_awarded,
            events,
            leveled_up: level_change.leveled_up(),
        })
    }

    /// Start a rank-up exam for the hunter's next tier
    pub fn start_exam(
        &self,
        profile: &Profile,
        quests: &[Quest],
        planner: &dyn QuestPlanner,
        now: DateTime<Utc>,
    ) -> Result<Quest> {
        exam::start_exam(profile, quests, planner, &self.config.exam, now)
    }

    /// Force a verification outcome and correct the hunter's XP.
    ///
    /// An approved override of an exam completion promotes the hunter the
    /// same way an auto-approved completion would. Rejecting a completion
    /// that was not already rejected breaks the streak.
    pub fn apply_override(
        &self,
        profile: &Profile,
        quest: &Quest,
        log: &CompletionLog,
        request: &BypassRequest,
        previous: Option<&OverrideRecord>,
        now: DateTime<Utc>,
    ) -> Result<OverrideApplied> {
        check_quest(profile, quest)?;
        if quest.status != QuestStatus::Completed {
            return Err(EngineError::InvalidOverride(format!(
                "quest {} is {}, only completed quests can be overridden",
                quest.id, quest.status
            )));
        }

        let outcome = bypass::apply_override(log, request, previous, &self.config.bypass, now)?;

        let mut profile = profile.clone();
        let before = check_rank_up_eligibility(&profile);
        let mut events = Vec::new();
        let level_change = profile.apply_xp_delta(outcome.xp_delta);
        push_xp_events(&mut events, &profile, outcome.xp_delta, level_change);

        if outcome.log.verification_status == VerificationStatus::Rejected
            && log.verification_status != VerificationStatus::Rejected
        {
            let streak = profile.record_streak(VerificationStatus::Rejected);
            push_streak_event(&mut events, &profile, streak);
        }

        let exam = exam::resolve_exam(&mut profile, quest, &outcome.log)?;
        push_rank_events(&mut events, &profile, exam, before);
        log_events(&events);

        Ok(OverrideApplied {
            log: outcome.log,
            record: outcome.record,
            profile,
            xp_delta: outcome.xp_delta,
            events,
            exam,
        })
    }
}

/// Quest record is well formed and belongs to this hunter
fn check_quest(profile: &Profile, quest: &Quest) -> Result<()> {
    if quest.user_id != profile.id {
        tracing::warn!(quest = %quest.id, profile = %profile.id, "Quest owned by another hunter");
        return Err(EngineError::Ownership { quest_id: quest.id });
    }
    if let Err(err) = quest.validate() {
        tracing::warn!(quest = %quest.id, error = %err, "Malformed quest record");
        return Err(err);
    }
    Ok(())
}

fn push_streak_event(events: &mut Vec<ProgressEvent>, profile: &Profile, change: StreakChange) {
    match change {
        StreakChange::Extended { current, new_best } => events.push(ProgressEvent::StreakExtended {
            profile_id: profile.id,
            current,
            new_best,
        }),
        StreakChange::Broken { previous } => events.push(ProgressEvent::StreakBroken {
            profile_id: profile.id,
            previous,
        }),
        StreakChange::Unchanged => {}
    }
}

fn push_xp_events(events: &mut Vec<ProgressEvent>, profile: &Profile, xp: i64, change: LevelChange) {
    if xp != 0 {
        events.push(ProgressEvent::XpAwarded {
            profile_id: profile.id,
            xp,
            total_xp: profile.total_xp(),
        });
    }
    if change.leveled_up() {
        events.push(ProgressEvent::LevelUp {
            profile_id: profile.id,
            from: change.from,
            to: change.to,
        });
    }
}

fn push_rank_events(
    events: &mut Vec<ProgressEvent>,
    profile: &Profile,
    exam: ExamResolution,
    before: Eligibility,
) {
    if let ExamResolution::Promoted { from, to } = exam {
        events.push(ProgressEvent::RankUp {
            profile_id: profile.id,
            from,
            to,
        });
    }

    let after = check_rank_up_eligibility(profile);
    if let Some(next_rank) = after.next_rank.filter(|_| after.eligible) {
        let newly = !before.eligible || before.next_rank != Some(next_rank);
        if newly {
            events.push(ProgressEvent::ExamUnlocked {
                profile_id: profile.id,
                next_rank,
            });
        }
    }
}

fn log_events(events: &[ProgressEvent]) {
    for event in events {
        tracing::info!("{}", event.format_log());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bypass::{BypassReason, BypassType};
    use crate::completion::ExerciseLog;
    use crate::profile::HunterClass;
    use crate::progression::xp_for_level;
    use crate::quest::{fixtures, ProofType};
    use crate::rank::RankTier;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 20, 6, 45, 0).unwrap()
    }

    fn hunter(xp: u64, tier: RankTier) -> Profile {
        Profile::from_record(Uuid::new_v4(), "hunter", xp, tier, HunterClass::Striker)
    }

    fn submission(quest: &Quest) -> CompletionSubmission {
        CompletionSubmission {
            quest_id: quest.id,
            duration_actual: 30,
            rpe_actual: 7,
            user_feedback: Some("Tough one".to_string()),
            exercises_completed: vec![ExerciseLog {
                exercise_id: "ex1".to_string(),
                sets_done: 3,
                reps_done: "15".to_string(),
                skipped: false,
            }],
            proof_media_url: None,
            proof_type: ProofType::None,
        }
    }

    #[test]
    fn test_safety_breach_still_awards() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::E);
        let quest = fixtures::quest(profile.id, 200, now());
        let scores = ScoreCard::new(0.9, 0.8, 0.2).unwrap();

        let out = engine
            .submit_completion(&profile, &quest, &submission(&quest), Some(scores), now())
            .unwrap();

        assert_eq!(out.quest.status, QuestStatus::Completed);
        assert_eq!(out.log.xp_awarded, 127);
        assert_eq!(out.log.verification_status, VerificationStatus::PendingReview);
        assert_eq!(out.profile.total_xp(), 127);
        assert_eq!(out.profile.level(), 1);
        assert_eq!(out.profile.streak_current, 1);
        assert!(!out.leveled_up);
        assert!(!out.ranked_up);
        assert_eq!(out.exam, ExamResolution::NotAnExam);
    }

    #[test]
    fn test_fallback_judge_used_without_scores() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::E);
        let quest = fixtures::quest(profile.id, 100, now());

        let out = engine
            .submit_completion(&profile, &quest, &submission(&quest), None, now())
            .unwrap();
        assert_eq!(out.log.scores, ScoreCard::new(1.0, 1.0, 1.0).unwrap());
        assert_eq!(out.log.xp_awarded, 100);
        assert_eq!(out.log.verification_status, VerificationStatus::AutoApproved);
    }

    #[test]
    fn test_level_up_and_exam_unlock_events() {
        let engine = QuestEngine::default();
        let profile = hunter(xp_for_level(10) - 50, RankTier::E);
        assert_eq!(profile.level(), 9);
        let quest = fixtures::quest(profile.id, 100, now());

        let out = engine
            .submit_completion(&profile, &quest, &submission(&quest), None, now())
            .unwrap();

        assert!(out.leveled_up);
        assert_eq!(out.profile.level(), 10);
        assert_eq!(out.profile.rank_tier(), RankTier::E);
        assert!(out.events.contains(&ProgressEvent::LevelUp {
            profile_id: profile.id,
            from: 9,
            to: 10
        }));
        assert!(out.events.contains(&ProgressEvent::ExamUnlocked {
            profile_id: profile.id,
            next_rank: RankTier::D
        }));
    }

    #[test]
    fn test_rejects_out_of_range_scores() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::E);
        let quest = fixtures::quest(profile.id, 100, now());
        let bad = ScoreCard {
            integrity_score: 1.5,
            effort_score: 0.5,
            safety_score: 0.5,
        };
        assert!(matches!(
            engine.submit_completion(&profile, &quest, &submission(&quest), Some(bad), now()),
            Err(EngineError::InvalidScore { .. })
        ));
    }

    #[test]
    fn test_expired_quest_cannot_complete() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::E);
        let quest = fixtures::quest(profile.id, 100, now());
        let late = quest.expires_at + Duration::seconds(1);

        let err = engine
            .submit_completion(&profile, &quest, &submission(&quest), None, late)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition { from: QuestStatus::Expired, to: QuestStatus::Completed }
        ));
    }

    #[test]
    fn test_missing_proof_keeps_quest_open() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::E);
        let mut quest = fixtures::quest(profile.id, 100, now());
        quest.requires_proof = true;
        quest.proof_type = ProofType::Photo;

        let err = engine
            .submit_completion(&profile, &quest, &submission(&quest), None, now())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidProof(_)));
        assert_eq!(quest.status, QuestStatus::Active);
    }

    #[test]
    fn test_other_hunters_quest() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::E);
        let quest = fixtures::quest(Uuid::new_v4(), 100, now());
        assert!(matches!(
            engine.submit_completion(&profile, &quest, &submission(&quest), None, now()),
            Err(EngineError::Ownership { .. })
        ));
        assert!(engine.abandon(&profile, &quest, now()).is_err());
    }

    #[test]
    fn test_abandon_awards_partial() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::C);
        let quest = fixtures::quest(profile.id, 260, now());

        let out = engine.abandon(&profile, &quest, now()).unwrap();
        assert_eq!(out.quest.status, QuestStatus::Abandoned);
        assert_eq!(out.xp_awarded, 52);
        assert_eq!(out.profile.total_xp(), 52);
        assert_eq!(out.profile.rank_tier(), RankTier::C);
        assert_eq!(out.profile.streak_current, 0);
    }

    #[test]
    fn test_expire_via_engine() {
        let engine = QuestEngine::default();
        let quest = fixtures::quest(Uuid::new_v4(), 100, now());
        assert!(engine.expire(&quest, now()).is_err());
        let closed = engine.expire(&quest, quest.expires_at + Duration::hours(1)).unwrap();
        assert_eq!(closed.status, QuestStatus::Expired);
    }

    #[test]
    fn test_huge_rep_claim_scores_zero_integrity() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::E);
        let quest = fixtures::quest(profile.id, 100, now());
        let mut sub = submission(&quest);
        sub.exercises_completed[0].reps_done = "18446744073709551615".to_string();
        sub.exercises_completed[0].sets_done = 2;

        let out = engine.submit_completion(&profile, &quest, &sub, None, now()).unwrap();
        assert_eq!(out.log.scores.integrity_score, 0.0);
        assert_eq!(out.log.xp_awarded, 67);
        assert_eq!(out.log.verification_status, VerificationStatus::AutoApproved);
    }

    #[test]
    fn test_rejecting_override_breaks_streak() {
        let engine = QuestEngine::default();
        let mut profile = hunter(0, RankTier::E);
        profile.streak_current = 4;
        profile.streak_best = 4;
        let quest = fixtures::quest(profile.id, 100, now());

        let done = engine
            .submit_completion(&profile, &quest, &submission(&quest), None, now())
            .unwrap();
        assert_eq!(done.profile.streak_current, 5);

        let request = BypassRequest {
            quest_id: quest.id,
            judge_id: Uuid::new_v4(),
            bypass_type: BypassType::JudgeManualOverride,
            bypass_reason: BypassReason::VerificationNeeded,
            notes: "Form broke down".to_string(),
            verdict: VerificationStatus::Rejected,
            xp_awarded: None,
        };
        let applied = engine
            .apply_override(&done.profile, &done.quest, &done.log, &request, None, now())
            .unwrap();

        assert_eq!(applied.log.verification_status, VerificationStatus::Rejected);
        assert_eq!(applied.xp_delta, -100);
        assert_eq!(applied.profile.total_xp(), 0);
        assert_eq!(applied.profile.streak_current, 0);
        assert_eq!(applied.profile.streak_best, 5);
        assert!(applied.events.contains(&ProgressEvent::StreakBroken {
            profile_id: profile.id,
            previous: 5
        }));

        // Rejecting an already rejected log leaves the streak alone
        let mut rebuilt = applied.profile.clone();
        rebuilt.streak_current = 2;
        let again = engine
            .apply_override(
                &rebuilt,
                &done.quest,
                &applied.log,
                &request,
                None,
                now() + Duration::minutes(5),
            )
            .unwrap();
        assert_eq!(again.profile.streak_current, 2);
        assert!(!again
            .events
            .iter()
            .any(|e| matches!(e, ProgressEvent::StreakBroken { .. })));
    }

    #[test]
    fn test_malformed_quests_refused() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::E);
        let later = now() + Duration::hours(1);

        let mut no_proof_type = fixtures::quest(profile.id, 100, now());
        no_proof_type.requires_proof = true;
        no_proof_type.proof_type = ProofType::None;

        let mut no_exercises = fixtures::quest(profile.id, 100, now());
        no_exercises.plan.exercises.clear();

        let mut backwards = fixtures::quest(profile.id, 100, now());
        backwards.expires_at = backwards.created_at;

        for quest in [no_proof_type, no_exercises, backwards] {
            assert!(matches!(
                engine.submit_completion(&profile, &quest, &submission(&quest), None, later),
                Err(EngineError::InvalidRecord(_))
            ));
            assert!(matches!(
                engine.abandon(&profile, &quest, later),
                Err(EngineError::InvalidRecord(_))
            ));
            assert!(matches!(
                engine.expire(&quest, later + Duration::days(1)),
                Err(EngineError::InvalidRecord(_))
            ));
        }
    }

    #[test]
    fn test_override_refuses_malformed_quest() {
        let engine = QuestEngine::default();
        let profile = hunter(0, RankTier::E);
        let quest = fixtures::quest(profile.id, 100, now());
        let done = engine
            .submit_completion(&profile, &quest, &submission(&quest), None, now())
            .unwrap();

        let mut broken = done.quest.clone();
        broken.plan.exercises.clear();
        let request = BypassRequest {
            quest_id: quest.id,
            judge_id: Uuid::new_v4(),
            bypass_type: BypassType::AdminForceApprove,
            bypass_reason: BypassReason::TechnicalIssue,
            notes: String::new(),
            verdict: VerificationStatus::AutoApproved,
            xp_awarded: Some(150),
        };
        assert!(matches!(
            engine.apply_override(&done.profile, &broken, &done.log, &request, None, now()),
            Err(EngineError::InvalidRecord(_))
        ));
    }
}
