use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use roster_types::{Assignment, Availability, Match, MatchId, Player, PlayerId, Snapshot};

use crate::config::PlannerConfig;
use crate::planner::Planner;
use crate::store::{
    AssignmentStore, AvailabilitySource, Calendar, Directory, MemoryStore, SnapshotStore,
    StoreError, StoreResult,
};

// ============== Season builders ==============

pub fn day(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap() + Days::new(n)
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `players` active players (ids 1..), `matches` weekly matches (ids 1..) alternating home/away.
pub fn season(players: usize, matches: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    for i in 1..=players {
        store.add_player(Player::new(i as i64, format!("Player {i:02}")));
    }
    for i in 1..=matches {
        store.add_match(Match {
            id: MatchId(i as i64),
            date: day(7 * i as u64),
            home_team: "Club".into(),
            away_team: format!("Opponent {i}"),
            is_home: i % 2 == 1,
            played: false,
        });
    }
    store
}

pub fn link_partners(store: &mut MemoryStore, a: i64, b: i64) {
    for (me, other) in [(a, b), (b, a)] {
        let mut p = store.player(PlayerId(me)).cloned().unwrap();
        p.partner_id = Some(PlayerId(other));
        p.prefer_partner_together = true;
        store.add_player(p);
    }
}

pub fn seeded_config() -> PlannerConfig {
    PlannerConfig {
        rng_seed: Some(7),
        ..PlannerConfig::default()
    }
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

pub fn planner(store: MemoryStore) -> Planner {
    Planner::new(store, seeded_config())
}

// ============== Assertions ==============

pub fn roster_ids<S: AssignmentStore + ?Sized>(store: &S, match_id: i64) -> Vec<PlayerId> {
    let mut ids: Vec<PlayerId> = store
        .roster(MatchId(match_id))
        .unwrap()
        .iter()
        .map(|a| a.player_id)
        .collect();
    ids.sort();
    ids
}

pub fn assert_no_double_booking<S: AssignmentStore + Calendar + ?Sized>(store: &S) {
    let matches = store.list_matches().unwrap();
    let mut seen = HashSet::new();
    for a in store.list_assignments().unwrap() {
        let date = matches.iter().find(|m| m.id == a.match_id).unwrap().date;
        assert!(
            seen.insert((a.player_id, date)),
            "{} booked twice on {date}",
            a.player_id
        );
    }
}

// ============== Failure-injecting store ==============

/// Delegates to a [`MemoryStore`]; the insert after `fail_after` more successful ones fails once.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub fail_after: Option<usize>,
}

impl FailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_after: None,
        }
    }
}

impl Directory for FailingStore {
    fn list_active_players(&self) -> StoreResult<Vec<Player>> {
        self.inner.list_active_players()
    }
}

impl Calendar for FailingStore {
    fn list_matches(&self) -> StoreResult<Vec<Match>> {
        self.inner.list_matches()
    }

    fn set_match_played(&mut self, match_id: MatchId, played: bool) -> StoreResult<bool> {
        self.inner.set_match_played(match_id, played)
    }
}

impl AvailabilitySource for FailingStore {
    fn availability(&self, player_id: PlayerId, match_id: MatchId) -> StoreResult<Option<Availability>> {
        self.inner.availability(player_id, match_id)
    }

    fn list_availability(&self) -> StoreResult<Vec<Availability>> {
        self.inner.list_availability()
    }
}

impl AssignmentStore for FailingStore {
    fn list_assignments(&self) -> StoreResult<Vec<Assignment>> {
        self.inner.list_assignments()
    }

    fn roster(&self, match_id: MatchId) -> StoreResult<Vec<Assignment>> {
        self.inner.roster(match_id)
    }

    fn insert(&mut self, assignment: Assignment) -> StoreResult<()> {
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                Err(StoreError::Backend("injected insert failure".into()))
            }
            Some(n) => {
                self.fail_after = Some(n - 1);
                self.inner.insert(assignment)
            }
            None => self.inner.insert(assignment),
        }
    }

    fn delete(&mut self, match_id: MatchId, player_id: PlayerId) -> StoreResult<bool> {
        self.inner.delete(match_id, player_id)
    }

    fn delete_for_match(&mut self, match_id: MatchId, only_unpinned: bool) -> StoreResult<usize> {
        self.inner.delete_for_match(match_id, only_unpinned)
    }

    fn set_pinned(&mut self, match_id: MatchId, player_id: PlayerId, pinned: bool) -> StoreResult<bool> {
        self.inner.set_pinned(match_id, player_id, pinned)
    }

    fn set_match_pinned(&mut self, match_id: MatchId, pinned: bool) -> StoreResult<usize> {
        self.inner.set_match_pinned(match_id, pinned)
    }

    fn set_actually_played(
        &mut self,
        match_id: MatchId,
        player_id: PlayerId,
        played: bool,
    ) -> StoreResult<bool> {
        self.inner.set_actually_played(match_id, player_id, played)
    }

    fn replace_all(&mut self, rows: Vec<Assignment>) -> StoreResult<()> {
        self.inner.replace_all(rows)
    }
}

impl SnapshotStore for FailingStore {
    fn push_snapshot(&mut self, snapshot: Snapshot) -> StoreResult<()> {
        self.inner.push_snapshot(snapshot)
    }

    fn pop_snapshot(&mut self) -> StoreResult<Option<Snapshot>> {
        self.inner.pop_snapshot()
    }

    fn snapshot_count(&self) -> StoreResult<usize> {
        self.inner.snapshot_count()
    }

    fn list_snapshots(&self) -> StoreResult<Vec<Snapshot>> {
        self.inner.list_snapshots()
    }
}
