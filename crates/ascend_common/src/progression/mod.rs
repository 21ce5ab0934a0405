//! Progression Module
//!
//! RPG-style leveling for hunters: XP curve, level derivation, streaks.
//!
//! ## Level System
//!
//! - Levels start at 1 and are uncapped
//! - XP thresholds follow a 1.588 power curve
//! - Level is always derived from total XP, never stored independently
//!
//! Rank tiers live in `crate::rank`; level never moves a tier on its own.

pub mod levels;
pub mod streaks;

pub use levels::{
    level_from_xp, level_progress, xp_for_level, xp_to_next_level, Level, LevelChange,
    Progression, BASE_XP, EXPONENT,
};
pub use streaks::{StreakChange, StreakState};
