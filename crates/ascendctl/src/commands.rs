//! Command implementations for ascendctl

use anyhow::{Context as _, Result};
use ascend_common::{
    check_rank_up_eligibility, initial_rank_from_assessment, level_from_xp, level_progress,
    xp_for_level, xp_to_next_level, BypassRequest, CompletionLog, CompletionSubmission,
    EngineConfig, Profile, ProofType, Quest, QuestEngine, RawBypassRequest, ScoreCard,
    ScoringInput, VerificationStatus,
};
use chrono::Utc;
use owo_colors::OwoColorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Shared state for one invocation
pub struct Context {
    pub json: bool,
    pub engine: QuestEngine,
}

impl Context {
    pub fn new(json: bool, config_path: Option<&Path>) -> Result<Self> {
        tracing::debug!(?config_path, "Loading engine config");
        let config = match config_path {
            Some(path) => EngineConfig::load_from(path)?,
            None => EngineConfig::load()?,
        };
        Ok(Self {
            json,
            engine: QuestEngine::new(config),
        })
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", out);
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid record in {}", path.display()))
}

fn status_label(status: VerificationStatus) -> String {
    match status {
        VerificationStatus::AutoApproved => "[APPROVED]".bright_green().to_string(),
        VerificationStatus::PendingReview => "[REVIEW]".yellow().to_string(),
        VerificationStatus::Rejected => "[REJECTED]".bright_red().to_string(),
    }
}

fn parse_scores(raw: &str) -> Result<ScoreCard> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid scores '{}'", raw))?;
    match parts.as_slice() {
        [i, e, s] => Ok(ScoreCard::new(*i, *e, *s)?),
        _ => anyhow::bail!("Expected three scores as integrity,effort,safety, got '{}'", raw),
    }
}

pub fn level(ctx: &Context, xp: u64) -> Result<()> {
    let level = level_from_xp(xp);
    let progress = level_progress(xp);
    let remaining = xp_to_next_level(xp);

    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "total_xp": xp,
            "level": level,
            "progress_percent": progress,
            "xp_to_next_level": remaining,
        }));
    }

    println!("Level {}  ({} XP)", level.to_string().bold(), xp);
    println!("  Progress: {:.1}%", progress);
    println!("  Next level in {} XP", remaining.cyan());
    Ok(())
}

pub fn curve(ctx: &Context, max: u32) -> Result<()> {
    let rows: Vec<(u32, u64)> = (1..=max.max(1)).map(|l| (l, xp_for_level(l))).collect();

    if ctx.json {
        let table: Vec<_> = rows
            .iter()
            .map(|(level, xp)| serde_json::json!({ "level": level, "xp": xp }))
            .collect();
        return ctx.print_json(&table);
    }

    println!("{:>6}  {:>10}", "LEVEL", "XP");
    for (level, xp) in rows {
        println!("{:>6}  {:>10}", level, xp);
    }
    Ok(())
}

pub fn rank(ctx: &Context, pushups: u32) -> Result<()> {
    let tier = initial_rank_from_assessment(pushups);
    if ctx.json {
        return ctx.print_json(&serde_json::json!({ "pushups": pushups, "rank_tier": tier }));
    }
    println!("{} pushups -> {}", pushups, tier.bold());
    Ok(())
}

pub fn eligibility(ctx: &Context, profile_path: &Path) -> Result<()> {
    let profile: Profile = read_json(profile_path)?;
    let eligibility = check_rank_up_eligibility(&profile);

    if ctx.json {
        return ctx.print_json(&eligibility);
    }

    println!("{} - {} level {}", profile.username, profile.rank_tier(), profile.level());
    match (eligibility.eligible, eligibility.next_rank) {
        (true, Some(next)) => println!("  {} exam for {} unlocked", "[OK]".bright_green(), next),
        _ => match profile.rank_tier().exam_level() {
            Some(required) => println!(
                "  {} next exam unlocks at level {}",
                "[LOCKED]".yellow(),
                required
            ),
            None => println!("  {} highest tier reached", "[MAX]".cyan()),
        },
    }
    Ok(())
}

pub fn score(
    ctx: &Context,
    quest_path: &Path,
    (integrity, effort, safety): (f64, f64, f64),
    proof_url: Option<&str>,
    proof_type: Option<&str>,
) -> Result<()> {
    let quest: Quest = read_json(quest_path)?;
    let card = ScoreCard::new(integrity, effort, safety)?;
    let proof_type = match proof_type {
        Some(t) => t.parse::<ProofType>()?,
        None => ProofType::None,
    };
    let proof_ok = proof_url.is_some() && quest.check_proof(proof_url, proof_type).is_ok();

    let input = ScoringInput::new(card, quest.xp_potential).with_proof(quest.requires_proof, proof_ok);
    let outcome = ctx.engine.score(&input);

    if ctx.json {
        return ctx.print_json(&outcome);
    }

    println!(
        "{}  quality {:.3}, {} XP of {}",
        status_label(outcome.verification_status),
        outcome.overall_quality,
        outcome.xp_awarded.bold(),
        quest.xp_potential
    );
    for reason in &outcome.reasons {
        println!("  * {:?}", reason);
    }
    Ok(())
}

pub fn complete(
    ctx: &Context,
    profile_path: &Path,
    quest_path: &Path,
    submission_path: &Path,
    scores: Option<&str>,
) -> Result<()> {
    let profile: Profile = read_json(profile_path)?;
    let quest: Quest = read_json(quest_path)?;
    let submission: CompletionSubmission = read_json(submission_path)?;
    let scores = scores.map(parse_scores).transpose()?;

    let outcome = ctx
        .engine
        .submit_completion(&profile, &quest, &submission, scores, Utc::now())?;

    if ctx.json {
        return ctx.print_json(&outcome);
    }

    println!(
        "{}  {} XP for '{}'",
        status_label(outcome.log.verification_status),
        outcome.log.xp_awarded.bold(),
        outcome.quest.plan.quest_name
    );
    println!(
        "  {} - level {} ({} XP total)",
        outcome.profile.rank_tier(),
        outcome.profile.level(),
        outcome.profile.total_xp()
    );
    for event in &outcome.events {
        println!("  {}", event.format_log().dimmed());
    }
    Ok(())
}

pub fn bypass(
    ctx: &Context,
    profile_path: &Path,
    quest_path: &Path,
    log_path: &Path,
    request_path: &Path,
) -> Result<()> {
    let profile: Profile = read_json(profile_path)?;
    let quest: Quest = read_json(quest_path)?;
    let log: CompletionLog = read_json(log_path)?;
    let raw: RawBypassRequest = read_json(request_path)?;
    let request = BypassRequest::try_from(raw)?;

    let previous = log.override_record.clone();
    let applied = ctx.engine.apply_override(
        &profile,
        &quest,
        &log,
        &request,
        previous.as_ref(),
        Utc::now(),
    )?;

    if ctx.json {
        return ctx.print_json(&applied);
    }

    let sign = if applied.xp_delta >= 0 { "+" } else { "" };
    println!(
        "{}  {} by {} ({}{} XP)",
        status_label(applied.log.verification_status),
        applied.record.bypass_reason,
        applied.record.bypass_type,
        sign,
        applied.xp_delta
    );
    for event in &applied.events {
        println!("  {}", event.format_log().dimmed());
    }
    Ok(())
}

pub fn config(ctx: &Context, path: Option<&Path>) -> Result<()> {
    let config = &ctx.engine.config;
    match path {
        Some(path) => {
            config.save_to(path)?;
            println!("Wrote {}", path.display());
        }
        None if ctx.json => ctx.print_json(config)?,
        None => {
            let out = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
            print!("{}", out);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scores() {
        let card = parse_scores("0.9, 0.8,0.2").unwrap();
        assert_eq!(card, ScoreCard::new(0.9, 0.8, 0.2).unwrap());
        assert!(parse_scores("0.9,0.8").is_err());
        assert!(parse_scores("0.9,high,0.2").is_err());
        assert!(parse_scores("0.9,0.8,1.2").is_err());
    }
}
