//! Ascend Control - operator CLI for the progression engine
//!
//! Reads profile/quest/log records as JSON files, runs one engine operation
//! and prints the decision. Nothing is persisted.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ascendctl")]
#[command(about = "Ascend - progression and quest lifecycle engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Config file (overrides $ASCEND_CONFIG and the default locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Level, progress and XP to next level for a total XP amount
    Level { xp: u64 },

    /// Print the XP curve
    Curve {
        /// Highest level to show
        #[arg(long, default_value_t = 20)]
        max: u32,
    },

    /// Initial rank tier for an assessment pushup count
    Rank { pushups: u32 },

    /// Rank-up exam eligibility for a profile
    Eligibility {
        #[arg(long)]
        profile: PathBuf,
    },

    /// Score a completion against a quest without changing anything
    Score {
        #[arg(long)]
        quest: PathBuf,
        #[arg(long)]
        integrity: f64,
        #[arg(long)]
        effort: f64,
        #[arg(long)]
        safety: f64,
        #[arg(long)]
        proof_url: Option<String>,
        /// Photo, Video or Timelapse
        #[arg(long)]
        proof_type: Option<String>,
    },

    /// Run a full completion and print the updated records
    Complete {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long)]
        quest: PathBuf,
        #[arg(long)]
        submission: PathBuf,
        /// Judge scores as "integrity,effort,safety"; fallback judge if omitted
        #[arg(long)]
        scores: Option<String>,
    },

    /// Apply a judge/admin override to a completion log
    Bypass {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long)]
        quest: PathBuf,
        #[arg(long)]
        log: PathBuf,
        #[arg(long)]
        request: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Write it to this file instead
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ASCEND_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context::new(cli.json, cli.config.as_deref())?;

    match cli.command {
        Commands::Level { xp } => commands::level(&ctx, xp),
        Commands::Curve { max } => commands::curve(&ctx, max),
        Commands::Rank { pushups } => commands::rank(&ctx, pushups),
        Commands::Eligibility { profile } => commands::eligibility(&ctx, &profile),
        Commands::Score {
            quest,
            integrity,
            effort,
            safety,
            proof_url,
            proof_type,
        } => commands::score(
            &ctx,
            &quest,
            (integrity, effort, safety),
            proof_url.as_deref(),
            proof_type.as_deref(),
        ),
        Commands::Complete {
            profile,
            quest,
            submission,
            scores,
        } => commands::complete(&ctx, &profile, &quest, &submission, scores.as_deref()),
        Commands::Bypass {
            profile,
            quest,
            log,
            request,
        } => commands::bypass(&ctx, &profile, &quest, &log, &request),
        Commands::Config { path } => commands::config(&ctx, path.as_deref()),
    }
}
