//! Quest records and lifecycle (v0.4.0)
//!
//! A quest starts `Active` and ends in exactly one terminal state:
//!
//! ```text
//!            +--> Completed   (valid completion before expires_at)
//! Active ----+--> Expired     (now > expires_at, no completion)
//!            +--> Abandoned   (explicit user/admin action)
//! ```
//!
//! Terminal states reject every further transition. Expiry is evaluated
//! lazily: an `Active` quest past its deadline is treated as `Expired`
//! everywhere the engine looks at it.

use crate::error::{EngineError, Result};
use crate::profile::HunterClass;
use crate::rank::RankTier;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Default share of xp_potential granted when a quest is abandoned
pub const DEFAULT_ABANDON_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuestType {
    #[default]
    Daily,
    Penalty,
    RankUp,
    Special,
}

impl QuestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestType::Daily => "Daily",
            QuestType::Penalty => "Penalty",
            QuestType::RankUp => "RankUp",
            QuestType::Special => "Special",
        }
    }
}

impl std::fmt::Display for QuestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuestType {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Daily" => Ok(QuestType::Daily),
            "Penalty" => Ok(QuestType::Penalty),
            "RankUp" => Ok(QuestType::RankUp),
            "Special" => Ok(QuestType::Special),
            other => Err(EngineError::UnknownValue {
                kind: "quest type",
                value: other.to_string(),
            }),
        }
    }
}

/// Quest lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
    Expired,
    Abandoned,
}

impl QuestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QuestStatus::Active)
    }
}

impl std::fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Completed => write!(f, "Completed"),
            Self::Expired => write!(f, "Expired"),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProofType {
    #[default]
    None,
    Photo,
    Video,
    Timelapse,
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Photo => write!(f, "Photo"),
            Self::Video => write!(f, "Video"),
            Self::Timelapse => write!(f, "Timelapse"),
        }
    }
}

impl FromStr for ProofType {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "None" => Ok(ProofType::None),
            "Photo" => Ok(ProofType::Photo),
            "Video" => Ok(ProofType::Video),
            "Timelapse" => Ok(ProofType::Timelapse),
            other => Err(EngineError::UnknownValue {
                kind: "proof type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExerciseKind {
    Warmup,
    Skill,
    Compound,
    Isolation,
    Cooldown,
}

/// One exercise in a generated plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    pub sets: u32,
    /// Reps as written by the planner ("12", "8-10", "30s")
    pub reps: String,
    #[serde(default)]
    pub rest_sec: u32,
    /// Target exertion on the 1-10 RPE scale
    pub rpe_target: f64,
    #[serde(default)]
    pub target_muscle: String,
}

/// Workout plan supplied by the quest generation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub quest_name: String,
    #[serde(default)]
    pub quest_type: QuestType,
    pub quest_rank: RankTier,
    #[serde(default)]
    pub narrative_intro: String,
    pub base_xp: u32,
    pub estimated_duration_min: u32,
    #[serde(default)]
    pub target_class: HunterClass,
    #[serde(default)]
    pub requires_proof: bool,
    #[serde(default)]
    pub proof_type: ProofType,
    pub exercises: Vec<Exercise>,
}

impl WorkoutPlan {
    pub fn validate(&self) -> Result<()> {
        if self.exercises.is_empty() {
            return Err(EngineError::InvalidRecord(format!(
                "plan '{}' has no exercises",
                self.quest_name
            )));
        }
        if let Some(bad) = self
            .exercises
            .iter()
            .find(|e| !(1.0..=10.0).contains(&e.rpe_target))
        {
            return Err(EngineError::InvalidRecord(format!(
                "exercise '{}' has rpe_target {} outside 1-10",
                bad.id, bad.rpe_target
            )));
        }
        Ok(())
    }

    /// Mean target RPE across exercises
    pub fn average_rpe_target(&self) -> f64 {
        if self.exercises.is_empty() {
            return 0.0;
        }
        self.exercises.iter().map(|e| e.rpe_target).sum::<f64>() / self.exercises.len() as f64
    }
}

/// Policy for the abandon transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbandonPolicy {
    /// Share of xp_potential awarded on abandon (0.0 - 1.0)
    pub partial_xp_ratio: f64,
}

impl Default for AbandonPolicy {
    fn default() -> Self {
        Self {
            partial_xp_ratio: DEFAULT_ABANDON_RATIO,
        }
    }
}

impl AbandonPolicy {
    pub fn partial_award(&self, xp_potential: u32) -> u32 {
        (xp_potential as f64 * self.partial_xp_ratio).floor() as u32
    }
}

/// A quest instance owned by one hunter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quest_type: QuestType,
    pub rank_difficulty: RankTier,
    pub plan: WorkoutPlan,
    pub xp_potential: u32,
    pub status: QuestStatus,
    pub requires_proof: bool,
    pub proof_type: ProofType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Quest {
    /// New `Active` quest from a generated plan
    pub fn from_plan(
        user_id: Uuid,
        plan: WorkoutPlan,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            quest_type: plan.quest_type,
            rank_difficulty: plan.quest_rank,
            xp_potential: plan.base_xp,
            status: QuestStatus::Active,
            requires_proof: plan.requires_proof,
            proof_type: plan.proof_type,
            created_at: now,
            expires_at,
            plan,
        }
    }

    /// Daily quest, due by the end of the current UTC day
    pub fn daily(user_id: Uuid, plan: WorkoutPlan, now: DateTime<Utc>) -> Self {
        Self::from_plan(user_id, plan, now, end_of_day(now))
    }

    pub fn validate(&self) -> Result<()> {
        if self.expires_at <= self.created_at {
            return Err(EngineError::InvalidRecord(format!(
                "quest {} expires before it was created",
                self.id
            )));
        }
        if self.requires_proof && self.proof_type == ProofType::None {
            return Err(EngineError::InvalidRecord(format!(
                "quest {} requires proof but names no proof type",
                self.id
            )));
        }
        self.plan.validate()
    }

    pub fn is_exam(&self) -> bool {
        self.quest_type == QuestType::RankUp
    }

    /// Whether the deadline has passed with the quest still open
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_expired(self, now)
    }

    /// Stored status with lazy expiry applied
    pub fn effective_status(&self, now: DateTime<Utc>) -> QuestStatus {
        if self.is_expired(now) {
            QuestStatus::Expired
        } else {
            self.status
        }
    }

    /// Check the submitted proof against this quest's requirements
    pub fn check_proof(&self, url: Option<&str>, proof_type: ProofType) -> Result<()> {
        if !self.requires_proof {
            return Ok(());
        }
        let url = url.map(str::trim).unwrap_or_default();
        if url.is_empty() {
            return Err(EngineError::InvalidProof(format!(
                "{} proof required, none supplied",
                self.proof_type
            )));
        }
        if proof_type == ProofType::None {
            return Err(EngineError::InvalidProof(
                "proof supplied without a proof type".to_string(),
            ));
        }
        if self.proof_type != ProofType::None && proof_type != self.proof_type {
            return Err(EngineError::InvalidProof(format!(
                "{} proof required, got {}",
                self.proof_type, proof_type
            )));
        }
        Ok(())
    }

    /// `Active -> Completed`, only before the deadline
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(QuestStatus::Completed, now)
    }

    /// `Active -> Expired`, only once the deadline has passed
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status == QuestStatus::Active && !self.is_expired(now) {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                to: QuestStatus::Expired,
            });
        }
        self.transition(QuestStatus::Expired, now)
    }

    /// `Active -> Abandoned`; returns the partial XP award
    pub fn abandon(&mut self, now: DateTime<Utc>, policy: &AbandonPolicy) -> Result<u32> {
        self.transition(QuestStatus::Abandoned, now)?;
        Ok(policy.partial_award(self.xp_potential))
    }

    fn transition(&mut self, to: QuestStatus, now: DateTime<Utc>) -> Result<()> {
        // Past-deadline quests only move to Expired
        let from = if to == QuestStatus::Expired {
            self.status
        } else {
            self.effective_status(now)
        };

        if from != QuestStatus::Active || to == QuestStatus::Active {
            tracing::warn!(quest = %self.id, %from, %to, "Rejected quest transition");
            return Err(EngineError::InvalidTransition { from, to });
        }

        tracing::info!(quest = %self.id, %from, %to, "Quest transition");
        self.status = to;
        Ok(())
    }
}

/// Whether an open quest is past its deadline
pub fn is_expired(quest: &Quest, now: DateTime<Utc>) -> bool {
    quest.status == QuestStatus::Active && now > quest.expires_at
}

/// Last representable millisecond of `now`'s UTC day
pub fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    midnight + Duration::days(1) - Duration::milliseconds(1)
}

/// Today's Daily quest for this hunter, if one is still usable.
///
/// Abandoned and expired quests do not block generating a new one.
pub fn reusable_daily_quest<'a>(
    quests: &'a [Quest],
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Option<&'a Quest> {
    let today = now.date_naive();
    quests.iter().find(|q| {
        q.user_id == user_id
            && q.quest_type == QuestType::Daily
            && q.created_at.date_naive() == today
            && !matches!(
                q.effective_status(now),
                QuestStatus::Abandoned | QuestStatus::Expired
            )
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::{plan, quest};
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_complete_from_active() {
        let mut q = quest(Uuid::new_v4(), 200, now());
        q.complete(now()).unwrap();
        assert_eq!(q.status, QuestStatus::Completed);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for terminal in [QuestStatus::Completed, QuestStatus::Expired, QuestStatus::Abandoned] {
            let mut q = quest(Uuid::new_v4(), 200, now());
            q.status = terminal;
            let later = now() + Duration::days(2);

            assert!(matches!(
                q.complete(now()),
                Err(EngineError::InvalidTransition { from, to: QuestStatus::Completed }) if from == terminal
            ));
            assert!(q.expire(later).is_err());
            assert!(q.abandon(now(), &AbandonPolicy::default()).is_err());
            assert_eq!(q.status, terminal);
        }
    }

    #[test]
    fn test_complete_after_deadline_is_expired() {
        let mut q = quest(Uuid::new_v4(), 200, now());
        let late = q.expires_at + Duration::seconds(1);
        let err = q.complete(late).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition { from: QuestStatus::Expired, to: QuestStatus::Completed }
        ));
        assert_eq!(q.status, QuestStatus::Active);
    }

    #[test]
    fn test_expire_requires_deadline() {
        let mut q = quest(Uuid::new_v4(), 200, now());
        assert!(q.expire(now()).is_err());
        assert!(!q.is_expired(q.expires_at));
        assert!(q.is_expired(q.expires_at + Duration::milliseconds(1)));

        q.expire(q.expires_at + Duration::minutes(1)).unwrap();
        assert_eq!(q.status, QuestStatus::Expired);
        assert!(!is_expired(&q, q.expires_at + Duration::days(1)));
    }

    #[test]
    fn test_abandon_partial_award() {
        let mut q = quest(Uuid::new_v4(), 250, now());
        let xp = q.abandon(now(), &AbandonPolicy::default()).unwrap();
        assert_eq!(xp, 50);
        assert_eq!(q.status, QuestStatus::Abandoned);

        let policy = AbandonPolicy { partial_xp_ratio: 0.0 };
        let mut q = quest(Uuid::new_v4(), 250, now());
        assert_eq!(q.abandon(now(), &policy).unwrap(), 0);
    }

    #[test]
    fn test_proof_checks() {
        let mut q = quest(Uuid::new_v4(), 100, now());
        assert!(q.check_proof(None, ProofType::None).is_ok());

        q.requires_proof = true;
        q.proof_type = ProofType::Video;
        assert!(matches!(q.check_proof(None, ProofType::Video), Err(EngineError::InvalidProof(_))));
        assert!(q.check_proof(Some("  "), ProofType::Video).is_err());
        assert!(q.check_proof(Some("https://cdn/p.jpg"), ProofType::Photo).is_err());
        assert!(q.check_proof(Some("https://cdn/v.mp4"), ProofType::None).is_err());
        assert!(q.check_proof(Some("https://cdn/v.mp4"), ProofType::Video).is_ok());
    }

    #[test]
    fn test_daily_expires_end_of_day() {
        let q = Quest::daily(Uuid::new_v4(), plan(100), now());
        assert_eq!(
            q.expires_at,
            Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_reusable_daily_quest() {
        let user = Uuid::new_v4();
        let mut abandoned = Quest::daily(user, plan(100), now());
        abandoned.status = QuestStatus::Abandoned;
        let yesterday = Quest::daily(user, plan(100), now() - Duration::days(1));
        let other_user = Quest::daily(Uuid::new_v4(), plan(100), now());

        let quests = vec![abandoned, yesterday, other_user];
        assert!(reusable_daily_quest(&quests, user, now()).is_none());

        let mut quests = quests;
        let todays = Quest::daily(user, plan(100), now());
        let id = todays.id;
        quests.push(todays);
        assert_eq!(reusable_daily_quest(&quests, user, now()).map(|q| q.id), Some(id));
    }

    #[test]
    fn test_parse_enums_at_boundary() {
        assert_eq!("RankUp".parse::<QuestType>().unwrap(), QuestType::RankUp);
        assert!("Boss".parse::<QuestType>().is_err());
        assert_eq!("Timelapse".parse::<ProofType>().unwrap(), ProofType::Timelapse);
        assert!("Audio".parse::<ProofType>().is_err());
        assert!(serde_json::from_str::<QuestStatus>("\"QUEST_BYPASSED\"").is_err());
    }

    #[test]
    fn test_plan_validation() {
        let mut p = plan(100);
        assert!(p.validate().is_ok());
        assert!((p.average_rpe_target() - 7.0).abs() < f64::EPSILON);
        p.exercises[0].rpe_target = 11.0;
        assert!(p.validate().is_err());
        p.exercises.clear();
        assert!(p.validate().is_err());
    }
}
