//! # store
//!
//! Ports to the relational store and the in-memory implementation behind the CLI.
//!
//! The planner reads the directory, calendar and availability collaborators and owns the
//! assignment table and the snapshot stack. Each concern is its own trait so a database
//! backend can implement them over its own tables; [`PlanStore`] bundles them for the engine.

use std::collections::{BTreeMap, HashMap};

use roster_types::{Assignment, Availability, Match, MatchId, Player, PlayerId, Snapshot};
use thiserror::Error;

use crate::state::PlanState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("assignment ({0}, {1}) already exists")]
    DuplicateAssignment(MatchId, PlayerId),

    #[error("unknown match {0}")]
    UnknownMatch(MatchId),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ── Collaborator ports ────────────────────────────────────────────────────────

pub trait Directory {
    /// Active players ordered by name, then id.
    fn list_active_players(&self) -> StoreResult<Vec<Player>>;
}

pub trait Calendar {
    /// All matches ordered by date, then id.
    fn list_matches(&self) -> StoreResult<Vec<Match>>;

    /// Returns false when the match does not exist.
    fn set_match_played(&mut self, match_id: MatchId, played: bool) -> StoreResult<bool>;
}

pub trait AvailabilitySource {
    /// `None` means no record, which callers treat as available.
    fn availability(&self, player_id: PlayerId, match_id: MatchId) -> StoreResult<Option<Availability>>;

    fn list_availability(&self) -> StoreResult<Vec<Availability>>;
}

pub trait AssignmentStore {
    /// All rows ordered by (match, player).
    fn list_assignments(&self) -> StoreResult<Vec<Assignment>>;

    fn roster(&self, match_id: MatchId) -> StoreResult<Vec<Assignment>>;

    /// Fails on a duplicate (match, player) key or an unknown match.
    fn insert(&mut self, assignment: Assignment) -> StoreResult<()>;

    fn delete(&mut self, match_id: MatchId, player_id: PlayerId) -> StoreResult<bool>;

    /// Deletes the rows of one match, or only its unpinned rows. Returns the number removed.
    fn delete_for_match(&mut self, match_id: MatchId, only_unpinned: bool) -> StoreResult<usize>;

    fn set_pinned(&mut self, match_id: MatchId, player_id: PlayerId, pinned: bool) -> StoreResult<bool>;

    fn set_match_pinned(&mut self, match_id: MatchId, pinned: bool) -> StoreResult<usize>;

    fn set_actually_played(
        &mut self,
        match_id: MatchId,
        player_id: PlayerId,
        played: bool,
    ) -> StoreResult<bool>;

    /// Swap the whole table for `rows` in one step.
    fn replace_all(&mut self, rows: Vec<Assignment>) -> StoreResult<()>;
}

pub trait SnapshotStore {
    fn push_snapshot(&mut self, snapshot: Snapshot) -> StoreResult<()>;

    fn pop_snapshot(&mut self) -> StoreResult<Option<Snapshot>>;

    fn snapshot_count(&self) -> StoreResult<usize>;

    /// Most recent first.
    fn list_snapshots(&self) -> StoreResult<Vec<Snapshot>>;
}

/// Everything the regeneration engine touches.
pub trait PlanStore: Directory + Calendar + AvailabilitySource + AssignmentStore + SnapshotStore {}

impl<T> PlanStore for T where T: Directory + Calendar + AvailabilitySource + AssignmentStore + SnapshotStore {}

// ── In-memory store ───────────────────────────────────────────────────────────

/// Indexed, in-memory plan store. Round-trips through [`PlanState`] for persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    players: Vec<Player>,
    matches: BTreeMap<MatchId, Match>,
    availability: HashMap<(PlayerId, MatchId), Availability>,
    assignments: BTreeMap<(MatchId, PlayerId), Assignment>,
    snapshots: Vec<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: PlanState) -> Self {
        Self {
            players: state.players,
            matches: state.matches.into_iter().map(|m| (m.id, m)).collect(),
            availability: state
                .availability
                .into_iter()
                .map(|a| ((a.player_id, a.match_id), a))
                .collect(),
            assignments: state.assignments.into_iter().map(|a| (a.key(), a)).collect(),
            snapshots: state.snapshots,
        }
    }

    pub fn to_state(&self) -> PlanState {
        let mut availability: Vec<Availability> = self.availability.values().cloned().collect();
        availability.sort_by_key(|a| (a.match_id, a.player_id));
        PlanState {
            players: self.players.clone(),
            matches: self.matches.values().cloned().collect(),
            availability,
            assignments: self.assignments.values().copied().collect(),
            snapshots: self.snapshots.clone(),
        }
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.retain(|p| p.id != player.id);
        self.players.push(player);
    }

    pub fn add_match(&mut self, m: Match) {
        self.matches.insert(m.id, m);
    }

    pub fn set_availability(&mut self, player_id: PlayerId, match_id: MatchId, is_available: bool) {
        self.availability.insert(
            (player_id, match_id),
            Availability {
                player_id,
                match_id,
                is_available,
                notes: None,
            },
        );
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn match_by_id(&self, match_id: MatchId) -> Option<&Match> {
        self.matches.get(&match_id)
    }
}

impl Directory for MemoryStore {
    fn list_active_players(&self) -> StoreResult<Vec<Player>> {
        let mut players: Vec<Player> = self.players.iter().filter(|p| p.active).cloned().collect();
        players.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(players)
    }
}

impl Calendar for MemoryStore {
    fn list_matches(&self) -> StoreResult<Vec<Match>> {
        let mut matches: Vec<Match> = self.matches.values().cloned().collect();
        matches.sort_by_key(|m| (m.date, m.id));
        Ok(matches)
    }

    fn set_match_played(&mut self, match_id: MatchId, played: bool) -> StoreResult<bool> {
        match self.matches.get_mut(&match_id) {
            Some(m) => {
                m.played = played;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl AvailabilitySource for MemoryStore {
    fn availability(&self, player_id: PlayerId, match_id: MatchId) -> StoreResult<Option<Availability>> {
        Ok(self.availability.get(&(player_id, match_id)).cloned())
    }

    fn list_availability(&self) -> StoreResult<Vec<Availability>> {
        Ok(self.availability.values().cloned().collect())
    }
}

impl AssignmentStore for MemoryStore {
    fn list_assignments(&self) -> StoreResult<Vec<Assignment>> {
        Ok(self.assignments.values().copied().collect())
    }

    fn roster(&self, match_id: MatchId) -> StoreResult<Vec<Assignment>> {
        Ok(self
            .assignments
            .range((match_id, PlayerId(i64::MIN))..=(match_id, PlayerId(i64::MAX)))
            .map(|(_, a)| *a)
            .collect())
    }

    fn insert(&mut self, assignment: Assignment) -> StoreResult<()> {
        if !self.matches.contains_key(&assignment.match_id) {
            return Err(StoreError::UnknownMatch(assignment.match_id));
        }
        if self.assignments.contains_key(&assignment.key()) {
            return Err(StoreError::DuplicateAssignment(assignment.match_id, assignment.player_id));
        }
        self.assignments.insert(assignment.key(), assignment);
        Ok(())
    }

    fn delete(&mut self, match_id: MatchId, player_id: PlayerId) -> StoreResult<bool> {
        Ok(self.assignments.remove(&(match_id, player_id)).is_some())
    }

    fn delete_for_match(&mut self, match_id: MatchId, only_unpinned: bool) -> StoreResult<usize> {
        let before = self.assignments.len();
        self.assignments
            .retain(|(m, _), a| *m != match_id || (only_unpinned && a.pinned));
        Ok(before - self.assignments.len())
    }

    fn set_pinned(&mut self, match_id: MatchId, player_id: PlayerId, pinned: bool) -> StoreResult<bool> {
        match self.assignments.get_mut(&(match_id, player_id)) {
            Some(a) => {
                a.pinned = pinned;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn set_match_pinned(&mut self, match_id: MatchId, pinned: bool) -> StoreResult<usize> {
        let mut touched = 0;
        for ((m, _), a) in self.assignments.iter_mut() {
            if *m == match_id {
                a.pinned = pinned;
                touched += 1;
            }
        }
        Ok(touched)
    }

    fn set_actually_played(
        &mut self,
        match_id: MatchId,
        player_id: PlayerId,
        played: bool,
    ) -> StoreResult<bool> {
        match self.assignments.get_mut(&(match_id, player_id)) {
            Some(a) => {
                a.actually_played = played;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn replace_all(&mut self, rows: Vec<Assignment>) -> StoreResult<()> {
        self.assignments = rows.into_iter().map(|a| (a.key(), a)).collect();
        Ok(())
    }
}

impl SnapshotStore for MemoryStore {
    fn push_snapshot(&mut self, snapshot: Snapshot) -> StoreResult<()> {
        self.snapshots.push(snapshot);
        Ok(())
    }

    fn pop_snapshot(&mut self) -> StoreResult<Option<Snapshot>> {
        Ok(self.snapshots.pop())
    }

    fn snapshot_count(&self) -> StoreResult<usize> {
        Ok(self.snapshots.len())
    }

    fn list_snapshots(&self) -> StoreResult<Vec<Snapshot>> {
        Ok(self.snapshots.iter().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store_with_match() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_match(Match {
            id: MatchId(1),
            date: NaiveDate::from_ymd_opt(2025, 9, 6).unwrap(),
            home_team: "Home".into(),
            away_team: "Away".into(),
            is_home: true,
            played: false,
        });
        store
    }

    #[test]
    fn insert_rejects_duplicates_and_unknown_matches() {
        let mut store = store_with_match();
        let row = Assignment::planned(MatchId(1), PlayerId(1));
        store.insert(row).unwrap();
        assert_eq!(
            store.insert(row),
            Err(StoreError::DuplicateAssignment(MatchId(1), PlayerId(1)))
        );
        assert_eq!(
            store.insert(Assignment::planned(MatchId(9), PlayerId(1))),
            Err(StoreError::UnknownMatch(MatchId(9)))
        );
    }

    #[test]
    fn delete_for_match_can_spare_pins() {
        let mut store = store_with_match();
        store.insert(Assignment::planned(MatchId(1), PlayerId(1))).unwrap();
        store.insert(Assignment::planned(MatchId(1), PlayerId(2))).unwrap();
        store.set_pinned(MatchId(1), PlayerId(2), true).unwrap();

        assert_eq!(store.delete_for_match(MatchId(1), true).unwrap(), 1);
        let roster = store.roster(MatchId(1)).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].player_id, PlayerId(2));

        assert_eq!(store.delete_for_match(MatchId(1), false).unwrap(), 1);
        assert!(store.roster(MatchId(1)).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_a_single_row() {
        let mut store = store_with_match();
        store.insert(Assignment::planned(MatchId(1), PlayerId(1))).unwrap();
        store.insert(Assignment::planned(MatchId(1), PlayerId(2))).unwrap();

        assert!(store.delete(MatchId(1), PlayerId(1)).unwrap());
        assert!(!store.delete(MatchId(1), PlayerId(1)).unwrap());
        let roster = store.roster(MatchId(1)).unwrap();
        assert_eq!(roster, vec![Assignment::planned(MatchId(1), PlayerId(2))]);
    }

    #[test]
    fn active_players_sorted_by_name() {
        let mut store = MemoryStore::new();
        store.add_player(Player::new(1, "Zoe"));
        store.add_player(Player::new(2, "Anna"));
        let mut gone = Player::new(3, "Bob");
        gone.active = false;
        store.add_player(gone);

        let names: Vec<String> = store
            .list_active_players()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Anna".to_string(), "Zoe".to_string()]);
    }

    #[test]
    fn state_round_trip_keeps_rows() {
        let mut store = store_with_match();
        store.insert(Assignment::planned(MatchId(1), PlayerId(4))).unwrap();
        store.set_availability(PlayerId(4), MatchId(1), false);

        let restored = MemoryStore::from_state(store.to_state());
        assert_eq!(restored.list_assignments().unwrap(), store.list_assignments().unwrap());
        assert_eq!(
            restored.availability(PlayerId(4), MatchId(1)).unwrap().map(|a| a.is_available),
            Some(false)
        );
    }
}
