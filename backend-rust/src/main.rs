use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use roster_backend::audit::AuditLogger;
use roster_backend::persistence::{load_seed, load_state, save_state};
use roster_backend::{MemoryStore, Planner, PlannerConfig, PlannerError, RegenerateRequest};
use roster_types::{MatchId, PlayerId, ScopeMode};
use tracing::{info, warn};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster-planner", about = "Season roster planner: four players per match")]
struct Args {
    /// Planner config file (TOML)
    #[arg(short, long, default_value = "planner.toml")]
    config: PathBuf,
    /// Plan state file; overrides the config and ROSTER_STATE_PATH
    #[arg(long)]
    state: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute rosters of unplayed matches
    Regenerate {
        /// all | until | from
        #[arg(long, default_value = "all")]
        scope: ScopeMode,
        /// YYYY-MM-DD, inclusive
        #[arg(long)]
        cutoff: Option<String>,
        /// Clear pins inside the scope too
        #[arg(long)]
        reset_pins: bool,
        /// Abort and roll back after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Restore the plan from before the latest regeneration
    Undo,
    Pin { match_id: i64, player_id: i64 },
    Unpin { match_id: i64, player_id: i64 },
    PinMatch { match_id: i64 },
    UnpinMatch { match_id: i64 },
    /// Replace a match roster by hand
    SetRoster {
        match_id: i64,
        #[arg(required = true)]
        player_ids: Vec<i64>,
        /// Replace pinned rows as well
        #[arg(long)]
        replace_pinned: bool,
    },
    ActuallyPlayed {
        match_id: i64,
        player_id: i64,
        /// Clear the flag instead of setting it
        #[arg(long)]
        clear: bool,
    },
    MatchPlayed {
        match_id: i64,
        #[arg(long)]
        clear: bool,
    },
    /// Late substitute: add, pin and mark played
    AddPlayer { match_id: i64, player_id: i64 },
    Roster { match_id: i64 },
    Load { player_id: i64 },
    /// Print every match with its roster
    Plan,
    /// List the undo stack, most recent first
    History,
    /// Load players, matches and availability from a JSON seed file
    Import { seed: PathBuf },
}

impl Command {
    fn mutates(&self) -> bool {
        !matches!(self, Command::Roster { .. } | Command::Load { .. } | Command::Plan | Command::History)
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster_backend=info,roster_planner=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = PlannerConfig::load(Some(&args.config))?;
    if let Some(state) = args.state {
        config.state_path = state;
    }

    let state_path = config.state_path.clone();
    let store = MemoryStore::from_state(load_state(&state_path).await);
    let audit = AuditLogger::open(config.audit_path.clone()).await;
    let planner = Planner::new(store, config).with_audit(audit);

    let mutates = args.command.mutates();
    run(&planner, args.command).await?;

    if mutates {
        let state = planner.with_store(MemoryStore::to_state).await;
        save_state(&state_path, &state).await?;
        info!("💾 Plan saved to {}", state_path.display());
    }
    Ok(())
}

async fn run(planner: &Planner, command: Command) -> Result<()> {
    match command {
        Command::Regenerate {
            scope,
            cutoff,
            reset_pins,
            timeout_secs,
        } => {
            let request = RegenerateRequest {
                exclude_pinned: !reset_pins,
                scope,
                cutoff,
                deadline: timeout_secs.map(Duration::from_secs),
            };
            match planner.regenerate(request).await {
                Ok(report) => {
                    if report.scope_widened {
                        warn!("Cutoff could not be parsed; the whole season was planned");
                    }
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Err(e @ PlannerError::EmptyScope { .. }) => info!("{e}"),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Undo => match planner.undo().await {
            Ok(outcome) => println!("{}", serde_json::to_string_pretty(&outcome)?),
            Err(PlannerError::UndoUnavailable) => info!("Nothing to undo"),
            Err(e) => return Err(e.into()),
        },
        Command::Pin { match_id, player_id } => {
            report_row(planner.pin(MatchId(match_id), PlayerId(player_id), true).await?, match_id, player_id)
        }
        Command::Unpin { match_id, player_id } => {
            report_row(planner.pin(MatchId(match_id), PlayerId(player_id), false).await?, match_id, player_id)
        }
        Command::PinMatch { match_id } => {
            let n = planner.pin_match(MatchId(match_id), true).await?;
            info!("Pinned {n} rows of {}", MatchId(match_id));
        }
        Command::UnpinMatch { match_id } => {
            let n = planner.pin_match(MatchId(match_id), false).await?;
            info!("Unpinned {n} rows of {}", MatchId(match_id));
        }
        Command::SetRoster {
            match_id,
            player_ids,
            replace_pinned,
        } => {
            let ids: Vec<PlayerId> = player_ids.into_iter().map(PlayerId).collect();
            planner.set_roster(MatchId(match_id), &ids, !replace_pinned).await?;
        }
        Command::ActuallyPlayed {
            match_id,
            player_id,
            clear,
        } => report_row(
            planner
                .set_actually_played(MatchId(match_id), PlayerId(player_id), !clear)
                .await?,
            match_id,
            player_id,
        ),
        Command::MatchPlayed { match_id, clear } => {
            if !planner.set_match_played(MatchId(match_id), !clear).await? {
                bail!("unknown match {}", MatchId(match_id));
            }
        }
        Command::AddPlayer { match_id, player_id } => {
            planner.add_player_to_match(MatchId(match_id), PlayerId(player_id)).await?;
        }
        Command::Roster { match_id } => {
            let roster = planner.roster(MatchId(match_id)).await?;
            println!("{}", serde_json::to_string_pretty(&roster)?);
        }
        Command::Load { player_id } => {
            let load = planner.player_load(PlayerId(player_id)).await?;
            println!("{}", serde_json::to_string_pretty(&load)?);
        }
        Command::Plan => {
            let plan = planner.plan().await?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::History => {
            for snapshot in planner.snapshots().await? {
                println!(
                    "{}  {}  scope {}{}  {} rows{}",
                    snapshot.id,
                    snapshot.taken_at.format("%Y-%m-%d %H:%M:%S"),
                    snapshot.scope.mode,
                    snapshot.scope.cutoff.map(|d| format!(" {d}")).unwrap_or_default(),
                    snapshot.assignments.len(),
                    if snapshot.exclude_pinned { "" } else { ", pins reset" }
                );
            }
        }
        Command::Import { seed } => {
            let seed = load_seed(&seed).await?;
            let mut state = planner.with_store(MemoryStore::to_state).await;
            let (players, matches, availability) = state.import(seed);
            planner
                .with_store_mut(|store| *store = MemoryStore::from_state(state))
                .await;
            info!("Imported {players} players, {matches} matches, {availability} availability records");
        }
    }
    Ok(())
}

fn report_row(found: bool, match_id: i64, player_id: i64) {
    if !found {
        warn!("No assignment for {} on {}", PlayerId(player_id), MatchId(match_id));
    }
}
