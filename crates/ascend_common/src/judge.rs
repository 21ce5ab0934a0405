//! Rule-based judge used when no external judge has scored a completion.
//!
//! Deterministic: the same plan and submission always give the same card.

use crate::completion::{CompletionSubmission, ScoreCard};
use crate::quest::WorkoutPlan;

/// Physical ceiling on claimed reps per minute of workout
pub const MAX_REPS_PER_MINUTE: u64 = 80;
/// Completing fewer than this share of exercises halves integrity
pub const MIN_COMPLETION_RATE: f64 = 0.5;

/// Integrity from claimed volume and completion rate
pub fn integrity_score(plan: &WorkoutPlan, submission: &CompletionSubmission) -> f64 {
    let ceiling = submission.duration_actual as u64 * MAX_REPS_PER_MINUTE;
    if submission.total_reps() > ceiling {
        tracing::warn!(
            quest = %submission.quest_id,
            reps = submission.total_reps(),
            ceiling,
            "Claimed reps exceed physical ceiling"
        );
        return 0.0;
    }

    if !plan.exercises.is_empty() {
        let rate = submission.completed_exercises() as f64 / plan.exercises.len() as f64;
        if rate < MIN_COMPLETION_RATE {
            return 0.5;
        }
    }

    1.0
}

/// Effort from how far reported RPE fell short of the plan's target
pub fn effort_score(plan: &WorkoutPlan, submission: &CompletionSubmission) -> f64 {
    let delta = plan.average_rpe_target() - submission.rpe_actual as f64;
    // Working harder than planned still caps at 1.0
    if delta <= 2.0 {
        1.0
    } else if delta <= 4.0 {
        0.8
    } else {
        0.5
    }
}

/// Full score card from the fallback rules; safety is always 1.0
pub fn fallback_scores(plan: &WorkoutPlan, submission: &CompletionSubmission) -> ScoreCard {
    let card = ScoreCard {
        integrity_score: integrity_score(plan, submission),
        effort_score: effort_score(plan, submission),
        safety_score: 1.0,
    };
    tracing::debug!(
        integrity = card.integrity_score,
        effort = card.effort_score,
        "Fallback judge scored completion"
    );
    card
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::ExerciseLog;
    use crate::quest::fixtures::plan;
    use crate::quest::ProofType;
    use uuid::Uuid;

    fn submission(duration: u32, rpe: u8, logs: Vec<ExerciseLog>) -> CompletionSubmission {
        CompletionSubmission {
            quest_id: Uuid::new_v4(),
            duration_actual: duration,
            rpe_actual: rpe,
            user_feedback: None,
            exercises_completed: logs,
            proof_media_url: None,
            proof_type: ProofType::None,
        }
    }

    fn ex(id: &str, sets: u32, reps: &str, skipped: bool) -> ExerciseLog {
        ExerciseLog {
            exercise_id: id.to_string(),
            sets_done: sets,
            reps_done: reps.to_string(),
            skipped,
        }
    }

    #[test]
    fn test_honest_run_scores_full() {
        let s = submission(30, 7, vec![ex("ex1", 3, "15", false), ex("ex2", 3, "20", false)]);
        let card = fallback_scores(&plan(100), &s);
        assert_eq!(card, ScoreCard::new(1.0, 1.0, 1.0).unwrap());
    }

    #[test]
    fn test_impossible_volume_zeroes_integrity() {
        // 2 minutes allows 160 reps
        let s = submission(2, 7, vec![ex("ex1", 10, "20", false)]);
        assert_eq!(integrity_score(&plan(100), &s), 0.0);
    }

    #[test]
    fn test_partial_completion_halves_integrity() {
        let s = submission(30, 7, vec![ex("ex1", 3, "15", true), ex("ex2", 3, "20", true)]);
        assert_eq!(integrity_score(&plan(100), &s), 0.5);

        let s = submission(30, 7, vec![ex("ex1", 3, "15", false)]);
        assert_eq!(integrity_score(&plan(100), &s), 1.0);
    }

    #[test]
    fn test_effort_bands() {
        let p = plan(100);
        for (rpe, expected) in [(10, 1.0), (7, 1.0), (5, 1.0), (4, 0.8), (3, 0.8), (2, 0.5), (1, 0.5)] {
            let s = submission(30, rpe, Vec::new());
            assert_eq!(effort_score(&p, &s), expected, "rpe {}", rpe);
        }
    }

    #[test]
    fn test_fallback_card_is_valid() {
        let p = plan(100);
        for rpe in 1..=10 {
            for duration in [1, 5, 30, 120] {
                let s = submission(duration, rpe, vec![ex("ex1", 4, "12", false)]);
                assert!(fallback_scores(&p, &s).validate().is_ok());
            }
        }
    }
}
