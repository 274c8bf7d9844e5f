//! main.rs: Season simulator entry point
//!
//! Builds synthetic seasons from a preset, runs a full regeneration on each and logs
//! the fairness figures, so scoring weights can be tuned against many seasons at once.
//! Every run is reproducible from `--seed` plus its run index.

mod scenarios;
mod stats;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use roster_backend::{Planner, PlannerConfig, RegenerateRequest};
use tracing::{info, warn};

use scenarios::{build_season, Preset};
use stats::RunStats;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "season-sim", about = "Roster planner season simulator")]
struct Args {
    /// Planner config (weights, fill tuning)
    #[arg(short, long, default_value = "planner.toml")]
    config: PathBuf,
    #[arg(long, value_enum, default_value = "balanced")]
    preset: Preset,
    #[arg(long, default_value = "12")]
    players: usize,
    #[arg(long, default_value = "18")]
    matches: usize,
    #[arg(long, default_value = "20")]
    runs: u64,
    /// Base seed; run i uses seed + i
    #[arg(long, default_value = "1")]
    seed: u64,
    /// Print each run's figures as JSON
    #[arg(long)]
    json: bool,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "season_sim=info,roster_backend=warn".into()),
        )
        .init();

    let args = Args::parse();
    let base = PlannerConfig::load(Some(&args.config))?;

    info!(
        "🎾 Season simulator: {:?} preset, {} players, {} matches, {} runs",
        args.preset, args.players, args.matches, args.runs
    );

    let mut all: Vec<RunStats> = Vec::with_capacity(args.runs as usize);
    for run in 0..args.runs {
        let seed = args.seed + run;
        let store = build_season(args.preset, args.players, args.matches, &mut StdRng::seed_from_u64(seed))?;
        let config = PlannerConfig {
            rng_seed: Some(seed),
            ..base.clone()
        };
        let planner = Planner::new(store, config);

        let report = match planner.regenerate(RegenerateRequest::default()).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Run {run} (seed {seed}): {e}");
                continue;
            }
        };
        let store = planner.into_store();
        let stats = stats::collect(&store, &report)?;

        if stats.double_bookings > 0 {
            warn!("Run {run} (seed {seed}): {} double bookings", stats.double_bookings);
        }
        if args.json {
            println!("{}", serde_json::to_string(&stats)?);
        }
        info!(
            "Run {run:>3} seed {seed:>5}: load {}..{} violations {} backfilled {} swaps {} partners {}",
            stats.min_load,
            stats.max_load,
            stats.violations,
            stats.backfilled,
            stats.diversity_swaps,
            stats
                .partner_rate
                .map(|r| format!("{:.0}%", r * 100.0))
                .unwrap_or_else(|| "-".into())
        );
        all.push(stats);
    }

    summarize(&all);
    Ok(())
}

fn summarize(all: &[RunStats]) {
    if all.is_empty() {
        warn!("No successful runs");
        return;
    }
    let worst_spread = all.iter().map(RunStats::spread).max().unwrap_or(0);
    let violations: usize = all.iter().map(|s| s.violations).sum();
    let double_bookings: usize = all.iter().map(|s| s.double_bookings).sum();
    let rates: Vec<f64> = all.iter().filter_map(|s| s.partner_rate).collect();
    let mean_rate = if rates.is_empty() {
        None
    } else {
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    };

    info!(
        "📊 {} runs: worst load spread {worst_spread}, {violations} violations, {double_bookings} double bookings, partner rate {}",
        all.len(),
        mean_rate
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "-".into())
    );
}
