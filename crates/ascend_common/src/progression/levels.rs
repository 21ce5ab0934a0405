//! Level System v0.2.0
//!
//! Power-curve leveling from total XP.
//!
//! ## XP Curve
//!
//! XP required to reach level L: floor(base_xp * L^exponent)
//! - base_xp = 100
//! - exponent = 1.588
//! - Level 1 is free (0 XP)
//!
//! This means:
//! - Level 2: 300 XP total
//! - Level 10: 3,872 XP total
//! - Level 50: 49,884 XP total
//!
//! ## Inverse
//!
//! The closed-form inverse floor((xp / base_xp)^(1/exponent)) lands one level
//! short whenever xp sits exactly on a floored threshold. `level_from_xp`
//! starts from the closed form and settles onto the largest level whose
//! threshold is reached, so `level_from_xp(xp_for_level(L)) == L` for all L.

use serde::{Deserialize, Serialize};

/// XP configuration constants
pub const BASE_XP: u64 = 100;
pub const EXPONENT: f64 = 1.588;

/// A hunter level (always >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Level(pub u32);

impl Level {
    /// Create a new level (clamped to at least 1)
    pub fn new(level: u32) -> Self {
        Self(level.max(1))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Minimum cumulative XP for this level
    pub fn xp_required(&self) -> u64 {
        xp_for_level(self.0)
    }

    /// XP between this level's threshold and the next one
    pub fn xp_span(&self) -> u64 {
        xp_for_level(self.0.saturating_add(1)).saturating_sub(xp_for_level(self.0))
    }

    pub fn from_xp(total_xp: u64) -> Self {
        Self(level_from_xp(total_xp))
    }
}

impl Default for Level {
    fn default() -> Self {
        Self(1)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimum cumulative XP to reach a level. Saturates at `u64::MAX`.
pub fn xp_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    (BASE_XP as f64 * (level as f64).powf(EXPONENT)).floor() as u64
}

/// Level for a total XP amount: the largest L with xp_for_level(L) <= xp.
///
/// Defined for every u64; XP beyond the top of the curve reads as
/// `u32::MAX`.
pub fn level_from_xp(xp: u64) -> u32 {
    if xp < BASE_XP {
        return 1;
    }

    // `as u32` saturates, so the estimate never wraps
    let estimate = (xp as f64 / BASE_XP as f64).powf(1.0 / EXPONENT).floor() as u32;
    let mut level = estimate.max(1);

    while level < u32::MAX && xp_for_level(level + 1) <= xp {
        level += 1;
    }
    while level > 1 && xp_for_level(level) > xp {
        level -= 1;
    }
    level
}

/// Progress toward the next level as a percentage (0.0 - 100.0)
pub fn level_progress(xp: u64) -> f64 {
    let level = level_from_xp(xp);
    let current_level_xp = xp_for_level(level);
    let next_level_xp = xp_for_level(level.saturating_add(1));

    let needed = next_level_xp.saturating_sub(current_level_xp);
    if needed == 0 {
        return 100.0;
    }

    let earned = xp.saturating_sub(current_level_xp);
    (earned as f64 / needed as f64 * 100.0).clamp(0.0, 100.0)
}

/// XP still missing before the next level
pub fn xp_to_next_level(xp: u64) -> u64 {
    xp_for_level(level_from_xp(xp).saturating_add(1)).saturating_sub(xp)
}

/// Result of adding XP to a progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub from: u32,
    pub to: u32,
}

impl LevelChange {
    pub fn leveled_up(&self) -> bool {
        self.to > self.from
    }

    pub fn leveled_down(&self) -> bool {
        self.to < self.from
    }
}

/// XP and level pair, kept consistent on every update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// Total XP accumulated
    pub total_xp: u64,
    /// Current level (derived from XP)
    pub level: Level,
}

impl Progression {
    pub fn new() -> Self {
        Self {
            total_xp: 0,
            level: Level::new(1),
        }
    }

    pub fn from_xp(total_xp: u64) -> Self {
        Self {
            total_xp,
            level: Level::from_xp(total_xp),
        }
    }

    /// Add XP and re-derive the level
    pub fn add_xp(&mut self, xp: u64) -> LevelChange {
        let from = self.level.value();
        self.total_xp = self.total_xp.saturating_add(xp);
        self.level = Level::from_xp(self.total_xp);
        LevelChange {
            from,
            to: self.level.value(),
        }
    }

    /// Apply a signed correction (overrides can claw XP back)
    pub fn apply_delta(&mut self, delta: i64) -> LevelChange {
        let from = self.level.value();
        self.total_xp = if delta >= 0 {
            self.total_xp.saturating_add(delta as u64)
        } else {
            self.total_xp.saturating_sub(delta.unsigned_abs())
        };
        self.level = Level::from_xp(self.total_xp);
        LevelChange {
            from,
            to: self.level.value(),
        }
    }

    pub fn xp_to_next_level(&self) -> u64 {
        xp_to_next_level(self.total_xp)
    }

    pub fn progress_percent(&self) -> f64 {
        level_progress(self.total_xp)
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}
