//! Hunter profile: the progression-relevant subset of a user record.
//!
//! `total_xp`, `level` and `rank_tier` are private so the two invariants hold
//! by construction:
//! - level always equals `level_from_xp(total_xp)`
//! - rank tier changes only at onboarding and through the rank-up exam

use crate::completion::VerificationStatus;
use crate::error::{EngineError, Result};
use crate::progression::{level_from_xp, LevelChange, Progression, StreakChange, StreakState};
use crate::rank::{initial_rank_from_assessment, RankTier};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Maximum pushups accepted by the onboarding assessment
pub const MAX_ASSESSMENT_PUSHUPS: u32 = 500;
/// Maximum running distance (km) accepted by the onboarding assessment
pub const MAX_ASSESSMENT_RUN_KM: f64 = 100.0;
/// Every base stat starts here before assessment bonuses
pub const BASE_STAT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HunterClass {
    #[default]
    Novice,
    Striker,
    Tank,
    Assassin,
    Mage,
    Healer,
}

impl HunterClass {
    pub const ALL: [HunterClass; 6] = [
        HunterClass::Novice,
        HunterClass::Striker,
        HunterClass::Tank,
        HunterClass::Assassin,
        HunterClass::Mage,
        HunterClass::Healer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HunterClass::Novice => "Novice",
            HunterClass::Striker => "Striker",
            HunterClass::Tank => "Tank",
            HunterClass::Assassin => "Assassin",
            HunterClass::Mage => "Mage",
            HunterClass::Healer => "Healer",
        }
    }
}

impl std::fmt::Display for HunterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HunterClass {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        HunterClass::ALL
            .iter()
            .copied()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| EngineError::UnknownValue {
                kind: "hunter class",
                value: s.to_string(),
            })
    }
}

/// Moderation standing of a hunter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HunterStatus {
    #[default]
    Normal,
    Verified,
    Flagged,
    Corrupted,
}

impl HunterStatus {
    /// Corrupted hunters are kept off leaderboards
    pub fn is_ranked(&self) -> bool {
        !matches!(self, HunterStatus::Corrupted)
    }
}

impl std::fmt::Display for HunterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Verified => write!(f, "Verified"),
            Self::Flagged => write!(f, "Flagged"),
            Self::Corrupted => write!(f, "Corrupted"),
        }
    }
}

/// Base attributes seeded at onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunterStats {
    pub strength: u32,
    pub agility: u32,
    pub stamina: u32,
}

impl Default for HunterStats {
    fn default() -> Self {
        Self {
            strength: BASE_STAT,
            agility: BASE_STAT,
            stamina: BASE_STAT,
        }
    }
}

/// Physical capability assessment taken once at onboarding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub max_pushups: u32,
    pub run_capability_km: f64,
    pub selected_class: HunterClass,
}

impl Assessment {
    pub fn validate(&self) -> Result<()> {
        if self.max_pushups > MAX_ASSESSMENT_PUSHUPS {
            return Err(EngineError::InvalidRecord(format!(
                "max_pushups {} exceeds {}",
                self.max_pushups, MAX_ASSESSMENT_PUSHUPS
            )));
        }
        if !(0.0..=MAX_ASSESSMENT_RUN_KM).contains(&self.run_capability_km) {
            return Err(EngineError::InvalidRecord(format!(
                "run_capability_km {} outside 0-{}",
                self.run_capability_km, MAX_ASSESSMENT_RUN_KM
            )));
        }
        Ok(())
    }

    /// Stats derived from the assessment
    pub fn stats(&self) -> HunterStats {
        HunterStats {
            strength: BASE_STAT + self.max_pushups / 10,
            agility: BASE_STAT,
            stamina: BASE_STAT + (self.run_capability_km * 2.0).floor() as u32,
        }
    }
}

/// Hunter profile as seen by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileRecord")]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    total_xp: u64,
    level: u32,
    rank_tier: RankTier,
    pub class: HunterClass,
    pub hunter_status: HunterStatus,
    pub streak_current: u32,
    pub streak_best: u32,
    pub stats: HunterStats,
    pub onboarded: bool,
}

/// Raw persisted shape of a profile, validated into `Profile`
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub total_xp: u64,
    /// Stored level; must agree with total_xp when present
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub rank_tier: RankTier,
    #[serde(default)]
    pub class: HunterClass,
    #[serde(default)]
    pub hunter_status: HunterStatus,
    #[serde(default)]
    pub streak_current: u32,
    #[serde(default)]
    pub streak_best: u32,
    #[serde(default)]
    pub stats: HunterStats,
    #[serde(default)]
    pub onboarded: bool,
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = EngineError;

    fn try_from(record: ProfileRecord) -> Result<Self> {
        let derived = level_from_xp(record.total_xp);
        if let Some(stored) = record.level {
            if stored != derived {
                return Err(EngineError::InvalidRecord(format!(
                    "profile {} has level {} but {} XP means level {}",
                    record.id, stored, record.total_xp, derived
                )));
            }
        }
        Ok(Self {
            id: record.id,
            username: record.username,
            total_xp: record.total_xp,
            level: derived,
            rank_tier: record.rank_tier,
            class: record.class,
            hunter_status: record.hunter_status,
            streak_current: record.streak_current,
            streak_best: record.streak_best.max(record.streak_current),
            stats: record.stats,
            onboarded: record.onboarded,
        })
    }
}

impl Profile {
    /// Fresh profile before onboarding
    pub fn new(id: Uuid, username: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            total_xp: 0,
            level: 1,
            rank_tier: RankTier::E,
            class: HunterClass::Novice,
            hunter_status: HunterStatus::Normal,
            streak_current: 0,
            streak_best: 0,
            stats: HunterStats::default(),
            onboarded: false,
        }
    }

    /// Rebuild an onboarded profile from stored values
    pub fn from_record(
        id: Uuid,
        username: &str,
        total_xp: u64,
        rank_tier: RankTier,
        class: HunterClass,
    ) -> Self {
        Self {
            total_xp,
            level: level_from_xp(total_xp),
            rank_tier,
            class,
            onboarded: true,
            ..Self::new(id, username)
        }
    }

    pub fn with_streak(mut self, current: u32, best: u32) -> Self {
        self.streak_current = current;
        self.streak_best = best.max(current);
        self
    }

    pub fn with_status(mut self, status: HunterStatus) -> Self {
        self.hunter_status = status;
        self
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn rank_tier(&self) -> RankTier {
        self.rank_tier
    }

    pub fn progression(&self) -> Progression {
        Progression::from_xp(self.total_xp)
    }

    pub fn streak(&self) -> StreakState {
        StreakState::new(self.streak_current, self.streak_best)
    }

    /// Seed class, tier and stats from the assessment. Allowed once.
    pub fn onboard(&mut self, assessment: &Assessment) -> Result<RankTier> {
        if self.onboarded {
            return Err(EngineError::InvalidRecord(format!(
                "profile {} is already onboarded",
                self.id
            )));
        }
        assessment.validate()?;

        self.class = assessment.selected_class;
        self.rank_tier = initial_rank_from_assessment(assessment.max_pushups);
        self.stats = assessment.stats();
        self.onboarded = true;

        tracing::info!(
            profile = %self.id,
            rank = %self.rank_tier,
            class = %self.class,
            "Onboarding complete"
        );
        Ok(self.rank_tier)
    }

    /// Add awarded XP and re-derive the level
    pub fn apply_award(&mut self, xp: u64) -> LevelChange {
        let mut progression = self.progression();
        let change = progression.add_xp(xp);
        self.sync(progression);
        change
    }

    /// Apply a signed XP correction, e.g. after an override
    pub fn apply_xp_delta(&mut self, delta: i64) -> LevelChange {
        let mut progression = self.progression();
        let change = progression.apply_delta(delta);
        self.sync(progression);
        change
    }

    pub fn record_streak(&mut self, status: VerificationStatus) -> StreakChange {
        let mut streak = self.streak();
        let change = streak.record(status);
        self.streak_current = streak.current;
        self.streak_best = streak.best;
        change
    }

    /// Only the exam orchestrator moves a tier after onboarding
    pub(crate) fn promote(&mut self, to: RankTier) {
        self.rank_tier = to;
    }

    fn sync(&mut self, progression: Progression) {
        self.total_xp = progression.total_xp;
        self.level = progression.level.value();
    }
}
