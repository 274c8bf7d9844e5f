//! scenarios.rs: Synthetic season presets
//!
//! Each preset stresses one part of the planner:
//! - `balanced`: everyone available, no partners (pure rotation)
//! - `partners`: most of the squad paired up, some pairs not wanting to play together
//! - `sparse`: ~30% of (player, match) cells unavailable (backfill and violations)
//! - `pinned`: every third match carries a pinned player (seeded loads, partner pull-in)

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use roster_backend::store::AssignmentStore;
use roster_backend::MemoryStore;
use roster_types::{Assignment, Match, MatchId, Player, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Balanced,
    Partners,
    Sparse,
    Pinned,
}

const SPARSE_UNAVAILABLE: f64 = 0.3;
const PAIRED_SHARE: f64 = 0.6;
const PAIR_DECLINES: f64 = 0.2;

fn season_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 6).unwrap_or_default()
}

/// Weekly matches alternating home/away, `players` active players.
pub fn build_season(
    preset: Preset,
    players: usize,
    matches: usize,
    rng: &mut StdRng,
) -> Result<MemoryStore> {
    let mut store = MemoryStore::new();
    let mut squad: Vec<Player> = (1..=players)
        .map(|i| Player::new(i as i64, format!("Player {i:02}")))
        .collect();

    if preset == Preset::Partners {
        pair_up(&mut squad, rng);
    }
    for p in squad {
        store.add_player(p);
    }

    for i in 1..=matches {
        store.add_match(Match {
            id: MatchId(i as i64),
            date: season_start() + Days::new(7 * (i as u64 - 1)),
            home_team: if i % 2 == 1 { "Club".into() } else { format!("Opponent {i}") },
            away_team: if i % 2 == 1 { format!("Opponent {i}") } else { "Club".into() },
            is_home: i % 2 == 1,
            played: false,
        });
    }

    match preset {
        Preset::Sparse => {
            for p in 1..=players as i64 {
                for m in 1..=matches as i64 {
                    if rng.gen_bool(SPARSE_UNAVAILABLE) {
                        store.set_availability(PlayerId(p), MatchId(m), false);
                    }
                }
            }
        }
        Preset::Pinned if players > 0 => {
            for m in (1..=matches as i64).step_by(3) {
                let player_id = PlayerId(rng.gen_range(1..=players as i64));
                store
                    .insert(Assignment {
                        pinned: true,
                        ..Assignment::planned(MatchId(m), player_id)
                    })
                    .with_context(|| format!("pinning {player_id} on {}", MatchId(m)))?;
            }
        }
        _ => {}
    }
    Ok(store)
}

/// Shuffle the squad and link consecutive players as mutual partners.
fn pair_up(squad: &mut [Player], rng: &mut StdRng) {
    let paired = ((squad.len() as f64 * PAIRED_SHARE) as usize) & !1;
    let mut order: Vec<usize> = (0..squad.len()).collect();
    order.shuffle(rng);

    for pair in order[..paired].chunks_exact(2) {
        let (a, b) = (pair[0], pair[1]);
        let together = !rng.gen_bool(PAIR_DECLINES);
        let (id_a, id_b) = (squad[a].id, squad[b].id);
        squad[a].partner_id = Some(id_b);
        squad[b].partner_id = Some(id_a);
        squad[a].prefer_partner_together = together;
        squad[b].prefer_partner_together = together;
    }
}
