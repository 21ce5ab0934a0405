//! Streak tracking for consecutive verified completions.
//!
//! Any completion that is not rejected extends the streak; a rejection
//! breaks it.

use crate::completion::VerificationStatus;
use serde::{Deserialize, Serialize};

/// Current and best completion streaks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive non-rejected completions
    pub current: u32,
    /// Best streak ever
    pub best: u32,
}

/// What happened to the streak after a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    Extended { current: u32, new_best: bool },
    Broken { previous: u32 },
    Unchanged,
}

impl StreakState {
    pub fn new(current: u32, best: u32) -> Self {
        Self {
            current,
            best: best.max(current),
        }
    }

    /// Record a completion outcome
    pub fn record(&mut self, status: VerificationStatus) -> StreakChange {
        if status == VerificationStatus::Rejected {
            let previous = self.current;
            self.current = 0;
            return if previous > 0 {
                StreakChange::Broken { previous }
            } else {
                StreakChange::Unchanged
            };
        }

        self.current = self.current.saturating_add(1);
        let new_best = self.current > self.best;
        if new_best {
            self.best = self.current;
        }
        StreakChange::Extended {
            current: self.current,
            new_best,
        }
    }
}
