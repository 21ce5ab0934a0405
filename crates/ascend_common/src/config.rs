//! Engine configuration (v0.6.0)
//!
//! Every policy constant lives here so nothing in the engine is a magic
//! literal. Partial files are accepted; missing keys take their defaults.

use crate::bypass::BypassPolicy;
use crate::exam::ExamPolicy;
use crate::quest::AbandonPolicy;
use crate::scoring::ScoringPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "ASCEND_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scoring: ScoringPolicy,

    #[serde(default)]
    pub exam: ExamPolicy,

    #[serde(default)]
    pub abandon: AbandonPolicy,

    #[serde(default)]
    pub bypass: BypassPolicy,
}

impl EngineConfig {
    /// Get default user config path: $XDG_CONFIG_HOME/ascend/config.toml,
    /// falling back to ~/.config/ascend/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        let dir = config_home(
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        )
        .context("Cannot determine config directory: neither XDG_CONFIG_HOME nor HOME is set")?;

        Ok(dir.join("ascend").join("config.toml"))
    }

    /// Get system config path: /etc/ascend/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/ascend/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. $ASCEND_CONFIG
    /// 2. User config (~/.config/ascend/config.toml)
    /// 3. System config (/etc/ascend/config.toml)
    /// 4. Defaults
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&explicit));
        }

        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        Ok(Self::default())
    }

    /// Load and validate a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Write configuration as TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        for (name, value) in [
            ("scoring.review_band_low", s.review_band_low),
            ("scoring.review_band_high", s.review_band_high),
            ("scoring.safety_floor", s.safety_floor),
            ("scoring.streak_bonus_per_day", s.streak_bonus_per_day),
            ("scoring.streak_bonus_cap", s.streak_bonus_cap),
            ("abandon.partial_xp_ratio", self.abandon.partial_xp_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} must be within [0, 1], got {}", name, value);
            }
        }
        if s.review_band_low > s.review_band_high {
            anyhow::bail!(
                "scoring review band is inverted: [{}, {}]",
                s.review_band_low,
                s.review_band_high
            );
        }
        if s.class_synergy_multiplier.is_nan() || s.class_synergy_multiplier < 1.0 {
            anyhow::bail!(
                "scoring.class_synergy_multiplier must be at least 1.0, got {}",
                s.class_synergy_multiplier
            );
        }
        if self.exam.window_hours <= 0 {
            anyhow::bail!("exam.window_hours must be positive");
        }
        if self.exam.duration_min == 0 {
            anyhow::bail!("exam.duration_min must be positive");
        }
        if self.bypass.cooldown_secs < 0 {
            anyhow::bail!("bypass.cooldown_secs cannot be negative");
        }
        Ok(())
    }
}

/// Base config directory; an empty or relative XDG_CONFIG_HOME is ignored
fn config_home(xdg: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    xdg.filter(|dir| dir.is_absolute())
        .or_else(|| home.filter(|dir| !dir.as_os_str().is_empty()).map(|h| h.join(".config")))
}
