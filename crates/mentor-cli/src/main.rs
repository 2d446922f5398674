//! `mentor` — command-line client for the Mentor API.
//!
//! # Usage
//!
//! ```
//! mentor --url http://localhost:8000 schedule alice --due
//! mentor review alice python_basics good
//! mentor --config ~/.config/mentor/config.toml stats alice
//! ```

mod client;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::ApiClient;
use mentor_core::review::Performance;
use serde::Deserialize;

const DEFAULT_URL: &str = "http://localhost:8000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mentor", about = "Spaced-repetition reviews and mastery points")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the mentor server (default: http://localhost:8000).
  #[arg(long, env = "MENTOR_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show a user's review schedule.
  Schedule {
    user_id: String,
    /// Only items that are due now.
    #[arg(long)]
    due:     bool,
  },
  /// Record a review: easy, good, hard or forgot.
  Review {
    user_id:     String,
    item_id:     String,
    #[arg(value_parser = parse_performance)]
    performance: Performance,
  },
  /// Points, badges, streak and the next milestone.
  Stats { user_id: String },
  /// Ledger history, most recent last.
  Points {
    user_id: String,
    #[arg(long)]
    limit:   Option<usize>,
  },
  /// Credit points to a user.
  Award {
    user_id: String,
    #[arg(allow_negative_numbers = true)]
    points:  i64,
    reason:  String,
  },
  /// List the badge catalog, or the badges a user has earned.
  Badges { user_id: Option<String> },
  /// Grant a catalog badge to a user.
  Grant { user_id: String, badge_id: String },
  /// Report a user's current study streak.
  Streak { user_id: String, days: u32 },
}

fn parse_performance(s: &str) -> Result<Performance, String> {
  Performance::parse(s).map_err(|e| e.to_string())
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
  let Some(path) = path else {
    return Ok(ConfigFile::default());
  };
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

/// CLI flag (or `MENTOR_URL`) over config file over the default.
fn resolve_url(flag: Option<String>, file_cfg: &ConfigFile) -> String {
  flag
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let file_cfg = load_config(args.config.as_deref())?;
  let client = ApiClient::new(resolve_url(args.url, &file_cfg))?;

  let output = match args.command {
    Command::Schedule { user_id, due: true } => render::schedule(&client.due(&user_id).await?),
    Command::Schedule { user_id, due: false } => {
      render::schedule(&client.schedule(&user_id).await?.schedule)
    }
    Command::Review { user_id, item_id, performance } => {
      render::review(&client.review(&user_id, &item_id, performance).await?)
    }
    Command::Stats { user_id } => {
      let summary = client.summary(&user_id).await?;
      let mut out = render::summary(&summary);
      out.push_str(&render::earned_badges(&summary.badges));
      out
    }
    Command::Points { user_id, limit } => {
      let view = client.points(&user_id, limit).await?;
      render::history(view.total_points, &view.history)
    }
    Command::Award { user_id, points, reason } => {
      render::ledger_update(&client.add_points(&user_id, points, &reason).await?)
    }
    Command::Badges { user_id: Some(user_id) } => {
      render::earned_badges(&client.earned_badges(&user_id).await?)
    }
    Command::Badges { user_id: None } => render::catalog(&client.catalog().await?),
    Command::Grant { user_id, badge_id } => {
      render::ledger_update(&client.award_badge(&user_id, &badge_id).await?)
    }
    Command::Streak { user_id, days } => {
      let view = client.set_streak(&user_id, days).await?;
      format!("Streak: {} days\n{}", view.current_streak, render::earned(&view.badges_earned))
    }
  };

  print!("{output}");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_precedence() {
    let file_cfg = ConfigFile { url: "http://tutor:9000".into() };
    assert_eq!(resolve_url(Some("http://flag".into()), &file_cfg), "http://flag");
    assert_eq!(resolve_url(None, &file_cfg), "http://tutor:9000");
    assert_eq!(resolve_url(None, &ConfigFile::default()), DEFAULT_URL);
  }

  #[test]
  fn review_rejects_unknown_performance() {
    let err = Args::try_parse_from(["mentor", "review", "alice", "loops", "great"]).unwrap_err();
    assert!(err.to_string().contains("easy, good, hard, forgot"));

    let args = Args::try_parse_from(["mentor", "review", "alice", "loops", "forgot"]).unwrap();
    assert!(matches!(args.command, Command::Review { performance: Performance::Forgot, .. }));
  }

  #[test]
  fn award_accepts_negative_points() {
    let args = Args::try_parse_from(["mentor", "award", "alice", "-5", "correction"]).unwrap();
    assert!(matches!(args.command, Command::Award { points: -5, .. }));
  }
}
