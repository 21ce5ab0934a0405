//! Judge and admin overrides of a scored completion.
//!
//! Raw override input arrives as strings and is parsed into closed enums at
//! the boundary; anything outside the known set fails with `InvalidOverride`.
//! The resulting `OverrideRecord` is attached to the completion log so the
//! forced outcome is always explainable.

use crate::completion::{CompletionLog, VerificationStatus};
use crate::error::{EngineError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Default cooldown between two overrides of the same quest
pub const DEFAULT_BYPASS_COOLDOWN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BypassType {
    #[default]
    JudgeManualOverride,
    AdminForceApprove,
    EmergencyOverride,
}

impl BypassType {
    pub const ALL: [BypassType; 3] = [
        BypassType::JudgeManualOverride,
        BypassType::AdminForceApprove,
        BypassType::EmergencyOverride,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BypassType::JudgeManualOverride => "judge_manual_override",
            BypassType::AdminForceApprove => "admin_force_approve",
            BypassType::EmergencyOverride => "emergency_override",
        }
    }
}

impl std::fmt::Display for BypassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BypassType {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BypassType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EngineError::InvalidOverride(format!("bypass_type '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BypassReason {
    #[serde(rename = "Manual Override - Good Run")]
    GoodRun,
    #[serde(rename = "Manual Override - Verification Needed")]
    VerificationNeeded,
    #[serde(rename = "Manual Override - Technical Issue")]
    TechnicalIssue,
    #[serde(rename = "Manual Override - User Dispute")]
    UserDispute,
    #[serde(rename = "Manual Override - Special Circumstance")]
    SpecialCircumstance,
}

impl BypassReason {
    pub const ALL: [BypassReason; 5] = [
        BypassReason::GoodRun,
        BypassReason::VerificationNeeded,
        BypassReason::TechnicalIssue,
        BypassReason::UserDispute,
        BypassReason::SpecialCircumstance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BypassReason::GoodRun => "Manual Override - Good Run",
            BypassReason::VerificationNeeded => "Manual Override - Verification Needed",
            BypassReason::TechnicalIssue => "Manual Override - Technical Issue",
            BypassReason::UserDispute => "Manual Override - User Dispute",
            BypassReason::SpecialCircumstance => "Manual Override - Special Circumstance",
        }
    }
}

impl std::fmt::Display for BypassReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BypassReason {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BypassReason::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| EngineError::InvalidOverride(format!("bypass_reason '{}'", s)))
    }
}

/// Cooldown between overrides of the same quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BypassPolicy {
    pub cooldown_secs: i64,
}

impl Default for BypassPolicy {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_BYPASS_COOLDOWN_SECS,
        }
    }
}

/// Override input as received from a judge or admin tool
#[derive(Debug, Clone, Deserialize)]
pub struct RawBypassRequest {
    pub quest_id: Uuid,
    pub judge_id: Uuid,
    #[serde(default)]
    pub bypass_type: Option<String>,
    pub bypass_reason: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub xp_awarded: Option<u32>,
}

/// Validated override request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BypassRequest {
    pub quest_id: Uuid,
    pub judge_id: Uuid,
    pub bypass_type: BypassType,
    pub bypass_reason: BypassReason,
    pub notes: String,
    /// Forced verification outcome
    pub verdict: VerificationStatus,
    /// Forced XP; `None` keeps the scored award (0 for rejections)
    pub xp_awarded: Option<u32>,
}

impl TryFrom<RawBypassRequest> for BypassRequest {
    type Error = EngineError;

    fn try_from(raw: RawBypassRequest) -> Result<Self> {
        let bypass_type = match raw.bypass_type.as_deref() {
            None => BypassType::default(),
            Some(t) => t.parse()?,
        };
        let verdict = match raw.verdict.as_deref() {
            None | Some("Auto_Approved") => VerificationStatus::AutoApproved,
            Some("Pending_Review") => VerificationStatus::PendingReview,
            Some("Rejected") => VerificationStatus::Rejected,
            Some(other) => {
                return Err(EngineError::InvalidOverride(format!("verdict '{}'", other)))
            }
        };
        Ok(Self {
            quest_id: raw.quest_id,
            judge_id: raw.judge_id,
            bypass_type,
            bypass_reason: raw.bypass_reason.parse()?,
            notes: raw.notes,
            verdict,
            xp_awarded: raw.xp_awarded,
        })
    }
}

/// Audit record of an applied override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub quest_id: Uuid,
    pub judge_id: Uuid,
    pub bypass_type: BypassType,
    pub bypass_reason: BypassReason,
    pub notes: String,
    pub forced_status: VerificationStatus,
    pub forced_xp: u32,
    pub created_at: DateTime<Utc>,
}

/// Overridden log plus the XP correction the profile needs
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideOutcome {
    pub log: CompletionLog,
    pub record: OverrideRecord,
    /// Signed difference between the forced and the previous award
    pub xp_delta: i64,
}

/// Force a verification outcome onto a completion log.
///
/// `previous` is the most recent override of the same quest, if any.
pub fn apply_override(
    log: &CompletionLog,
    request: &BypassRequest,
    previous: Option<&OverrideRecord>,
    policy: &BypassPolicy,
    now: DateTime<Utc>,
) -> Result<OverrideOutcome> {
    if request.quest_id != log.quest_id {
        return Err(EngineError::InvalidOverride(format!(
            "override targets quest {} but log belongs to {}",
            request.quest_id, log.quest_id
        )));
    }

    if let Some(prev) = previous.filter(|p| p.quest_id == request.quest_id) {
        let ready_at = prev.created_at + Duration::seconds(policy.cooldown_secs);
        if now < ready_at {
            let remaining_secs = (ready_at - now).num_seconds().max(1);
            tracing::warn!(quest = %request.quest_id, remaining_secs, "Override on cooldown");
            return Err(EngineError::BypassCooldown { remaining_secs });
        }
    }

    let forced_xp = match (request.xp_awarded, request.verdict) {
        (Some(xp), _) => xp,
        (None, VerificationStatus::Rejected) => 0,
        (None, _) => log.xp_awarded,
    };

    let record = OverrideRecord {
        quest_id: request.quest_id,
        judge_id: request.judge_id,
        bypass_type: request.bypass_type,
        bypass_reason: request.bypass_reason,
        notes: request.notes.clone(),
        forced_status: request.verdict,
        forced_xp,
        created_at: now,
    };

    let mut overridden = log.clone();
    overridden.verification_status = request.verdict;
    overridden.xp_awarded = forced_xp;
    overridden.override_record = Some(record.clone());

    let xp_delta = forced_xp as i64 - log.xp_awarded as i64;

    tracing::info!(
        quest = %request.quest_id,
        bypass_type = %request.bypass_type,
        reason = %request.bypass_reason,
        status = %request.verdict,
        xp_delta,
        "Override applied"
    );

    Ok(OverrideOutcome {
        log: overridden,
        record,
        xp_delta,
    })
}
