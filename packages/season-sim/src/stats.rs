//! stats.rs: Fairness figures of one simulated run

use std::collections::{HashMap, HashSet};

use roster_backend::store::{AssignmentStore, Calendar, Directory};
use roster_backend::MemoryStore;
use roster_types::{MatchId, PlayerId, RegenerationReport};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub min_load: u32,
    pub max_load: u32,
    pub violations: usize,
    pub backfilled: usize,
    pub diversity_swaps: usize,
    /// Share of appearances by a player with a willing partner where the partner played too
    pub partner_rate: Option<f64>,
    pub double_bookings: usize,
}

impl RunStats {
    pub fn spread(&self) -> u32 {
        self.max_load - self.min_load
    }
}

pub fn collect(store: &MemoryStore, report: &RegenerationReport) -> anyhow::Result<RunStats> {
    let loads: Vec<u32> = report.per_player_load.iter().map(|l| l.total).collect();
    let players = store.list_active_players()?;
    let dates: HashMap<MatchId, chrono::NaiveDate> =
        store.list_matches()?.into_iter().map(|m| (m.id, m.date)).collect();
    let assignments = store.list_assignments()?;

    let mut rosters: HashMap<MatchId, HashSet<PlayerId>> = HashMap::new();
    let mut booked = HashSet::new();
    let mut double_bookings = 0;
    for a in &assignments {
        rosters.entry(a.match_id).or_default().insert(a.player_id);
        if let Some(date) = dates.get(&a.match_id) {
            if !booked.insert((a.player_id, *date)) {
                double_bookings += 1;
            }
        }
    }

    let mut with_partner = 0usize;
    let mut appearances = 0usize;
    for a in &assignments {
        let Some(player) = players.iter().find(|p| p.id == a.player_id) else {
            continue;
        };
        let Some(partner) = player
            .partner_id
            .and_then(|id| players.iter().find(|p| p.id == id))
        else {
            continue;
        };
        if !player.is_preferred_partner_of(partner) {
            continue;
        }
        appearances += 1;
        if rosters.get(&a.match_id).is_some_and(|r| r.contains(&partner.id)) {
            with_partner += 1;
        }
    }

    Ok(RunStats {
        min_load: loads.iter().copied().min().unwrap_or(0),
        max_load: loads.iter().copied().max().unwrap_or(0),
        violations: report.violations.len(),
        backfilled: report.backfilled,
        diversity_swaps: report.diversity_swaps,
        partner_rate: (appearances > 0).then(|| with_partner as f64 / appearances as f64),
        double_bookings,
    })
}
