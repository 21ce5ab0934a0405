//! Progress events emitted by the engine after each mutation.
//!
//! Events are returned to the caller, never stored by the engine. Each has a
//! single-line log form for grep-friendly audit trails.

use crate::rank::RankTier;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    XpAwarded { profile_id: Uuid, xp: i64, total_xp: u64 },
    LevelUp { profile_id: Uuid, from: u32, to: u32 },
    RankUp { profile_id: Uuid, from: RankTier, to: RankTier },
    ExamUnlocked { profile_id: Uuid, next_rank: RankTier },
    StreakExtended { profile_id: Uuid, current: u32, new_best: bool },
    StreakBroken { profile_id: Uuid, previous: u32 },
}

impl ProgressEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProgressEvent::XpAwarded { .. } => "xp_awarded",
            ProgressEvent::LevelUp { .. } => "level_up",
            ProgressEvent::RankUp { .. } => "rank_up",
            ProgressEvent::ExamUnlocked { .. } => "exam_unlocked",
            ProgressEvent::StreakExtended { .. } => "streak_extended",
            ProgressEvent::StreakBroken { .. } => "streak_broken",
        }
    }

    pub fn profile_id(&self) -> Uuid {
        match self {
            ProgressEvent::XpAwarded { profile_id, .. }
            | ProgressEvent::LevelUp { profile_id, .. }
            | ProgressEvent::RankUp { profile_id, .. }
            | ProgressEvent::ExamUnlocked { profile_id, .. }
            | ProgressEvent::StreakExtended { profile_id, .. }
            | ProgressEvent::StreakBroken { profile_id, .. } => *profile_id,
        }
    }

    /// Format for log output
    pub fn format_log(&self) -> String {
        let detail = match self {
            ProgressEvent::XpAwarded { xp, total_xp, .. } => {
                let sign = if *xp >= 0 { "+" } else { "" };
                format!("xp={}{} total={}", sign, xp, total_xp)
            }
            ProgressEvent::LevelUp { from, to, .. } => format!("from={} to={}", from, to),
            ProgressEvent::RankUp { from, to, .. } => format!("from={} to={}", from, to),
            ProgressEvent::ExamUnlocked { next_rank, .. } => format!("next={}", next_rank),
            ProgressEvent::StreakExtended { current, new_best, .. } => {
                format!("streak={} best={}", current, new_best)
            }
            ProgressEvent::StreakBroken { previous, .. } => format!("previous={}", previous),
        };
        format!(
            "ASCEND_XP event={} profile={} {}",
            self.name(),
            self.profile_id(),
            detail
        )
    }
}
