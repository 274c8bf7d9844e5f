use roster_types::{Assignment, Availability, Match, Player, Snapshot};
use serde::{Deserialize, Serialize};

// ─── Persisted Plan State ─────────────────────────────────────────────────────

/// Everything the planner persists between runs.
///
/// Players, matches and availability mirror the directory/calendar collaborators;
/// assignments and snapshots are owned by the planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanState {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub availability: Vec<Availability>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    /// Oldest first; the last entry is the next one undo pops.
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

// ─── Seed File ────────────────────────────────────────────────────────────────

/// Directory and calendar data loaded by `roster-planner import`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonSeed {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub availability: Vec<Availability>,
}

impl PlanState {
    /// Merge directory/calendar data into the state, replacing entries with the same id.
    /// Existing assignments and snapshots are kept.
    pub fn import(&mut self, seed: SeasonSeed) -> (usize, usize, usize) {
        let counts = (seed.players.len(), seed.matches.len(), seed.availability.len());

        for player in seed.players {
            match self.players.iter_mut().find(|p| p.id == player.id) {
                Some(existing) => *existing = player,
                None => self.players.push(player),
            }
        }
        for m in seed.matches {
            match self.matches.iter_mut().find(|x| x.id == m.id) {
                Some(existing) => *existing = m,
                None => self.matches.push(m),
            }
        }
        for a in seed.availability {
            match self
                .availability
                .iter_mut()
                .find(|x| x.player_id == a.player_id && x.match_id == a.match_id)
            {
                Some(existing) => *existing = a,
                None => self.availability.push(a),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use roster_types::{MatchId, PlayerId};

    #[test]
    fn import_replaces_by_id_and_keeps_plan() {
        let mut state = PlanState {
            players: vec![Player::new(1, "Anna")],
            assignments: vec![Assignment::planned(MatchId(1), PlayerId(1))],
            ..Default::default()
        };
        let seed: SeasonSeed = serde_json::from_str(
            r#"{
                "players": [{"id": 1, "name": "Anna B."}, {"id": 2, "name": "Bram"}],
                "matches": [{"id": 1, "date": "2025-09-06", "isHome": true}]
            }"#,
        )
        .unwrap();

        let counts = state.import(seed);

        assert_eq!(counts, (2, 1, 0));
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.players[0].name, "Anna B.");
        assert_eq!(state.matches[0].date, NaiveDate::from_ymd_opt(2025, 9, 6).unwrap());
        assert_eq!(state.assignments.len(), 1);
    }
}
