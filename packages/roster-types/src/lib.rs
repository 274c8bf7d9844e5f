//! # roster-types
//!
//! Shared data model for the season roster planner.
//!
//! These types are used by:
//! - `backend-rust`: the store, the regeneration engine and the CLI
//! - `packages/season-sim`: synthetic seasons for weight tuning
//!
//! ## Conventions
//!
//! - A match roster holds exactly [`ROSTER_SIZE`] players once planning succeeds
//! - Availability defaults to "available" when no record exists
//! - Partner links are symmetric: if A names B, B names A

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Players per match roster.
pub const ROSTER_SIZE: usize = 4;

// ── Identifiers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

// ── Directory ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<PlayerId>,
    /// Mirrored to the partner by the directory, never by the planner.
    #[serde(default = "default_true")]
    pub prefer_partner_together: bool,
}

impl Player {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: PlayerId(id),
            name: name.into(),
            active: true,
            partner_id: None,
            prefer_partner_together: true,
        }
    }

    /// True when both players name each other as partner and both want to play together.
    pub fn is_preferred_partner_of(&self, other: &Player) -> bool {
        self.partner_id == Some(other.id)
            && other.partner_id == Some(self.id)
            && self.prefer_partner_together
            && other.prefer_partner_together
    }
}

fn default_true() -> bool {
    true
}

// ── Calendar ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub date: NaiveDate,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    pub is_home: bool,
    #[serde(default)]
    pub played: bool,
}

impl Match {
    pub fn label(&self) -> String {
        if self.home_team.is_empty() && self.away_team.is_empty() {
            self.id.to_string()
        } else {
            format!("{} vs {}", self.home_team, self.away_team)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub player_id: PlayerId,
    pub match_id: MatchId,
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ── Plan ──────────────────────────────────────────────────────────────────────

/// One (match, player) row of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub actually_played: bool,
}

impl Assignment {
    /// A fresh, unpinned row as written by regeneration.
    pub fn planned(match_id: MatchId, player_id: PlayerId) -> Self {
        Self {
            match_id,
            player_id,
            pinned: false,
            actually_played: false,
        }
    }

    pub fn key(&self) -> (MatchId, PlayerId) {
        (self.match_id, self.player_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub player_id: PlayerId,
    pub pinned: bool,
    pub actually_played: bool,
}

impl From<&Assignment> for RosterEntry {
    fn from(a: &Assignment) -> Self {
        Self {
            player_id: a.player_id,
            pinned: a.pinned,
            actually_played: a.actually_played,
        }
    }
}

/// A match with its current roster, as shown in the plan overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedMatch {
    #[serde(rename = "match")]
    pub match_info: Match,
    pub roster: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLoad {
    pub total_assigned: u32,
    pub home: u32,
    pub away: u32,
    pub actually_played: u32,
    pub completed_matches: u32,
}

// ── Scope ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeMode {
    #[default]
    All,
    UntilDate,
    FromDate,
}

impl FromStr for ScopeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "until" | "until_date" => Ok(Self::UntilDate),
            "from" | "from_date" | "rest" => Ok(Self::FromDate),
            other => Err(format!("unknown scope mode '{other}'")),
        }
    }
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "all",
            Self::UntilDate => "until_date",
            Self::FromDate => "from_date",
        };
        f.write_str(s)
    }
}

/// A resolved scope: the mode plus a parsed cutoff (both bounds inclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub mode: ScopeMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<NaiveDate>,
}

impl Scope {
    pub const ALL: Scope = Scope {
        mode: ScopeMode::All,
        cutoff: None,
    };

    pub fn until(cutoff: NaiveDate) -> Self {
        Self {
            mode: ScopeMode::UntilDate,
            cutoff: Some(cutoff),
        }
    }

    pub fn from(cutoff: NaiveDate) -> Self {
        Self {
            mode: ScopeMode::FromDate,
            cutoff: Some(cutoff),
        }
    }

    /// Date filter only; played matches are excluded by the caller.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        match (self.mode, self.cutoff) {
            (ScopeMode::UntilDate, Some(cutoff)) => date <= cutoff,
            (ScopeMode::FromDate, Some(cutoff)) => date >= cutoff,
            _ => true,
        }
    }
}

// ── Snapshots & reports ───────────────────────────────────────────────────────

/// Full copy of the assignment table taken right before a regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub exclude_pinned: bool,
    pub scope: Scope,
    pub assignments: Vec<Assignment>,
}

/// A match that could not reach a full roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub match_id: MatchId,
    pub date: NaiveDate,
    pub assigned: usize,
    pub required: usize,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {}: {} of {} players",
            self.match_id, self.date, self.assigned, self.required
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLoadSummary {
    pub player_id: PlayerId,
    pub name: String,
    pub total: u32,
    pub home: u32,
    pub away: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationReport {
    pub snapshot_id: Uuid,
    pub scope: Scope,
    /// Set when an unparsable cutoff fell back to the whole season.
    pub scope_widened: bool,
    pub processed: usize,
    pub new_assignments: usize,
    pub backfilled: usize,
    pub diversity_swaps: usize,
    pub violations: Vec<Violation>,
    pub per_player_load: Vec<PlayerLoadSummary>,
}

impl RegenerationReport {
    pub fn violation_for(&self, match_id: MatchId) -> Option<&Violation> {
        self.violations.iter().find(|v| v.match_id == match_id)
    }

    pub fn load_of(&self, player_id: PlayerId) -> Option<&PlayerLoadSummary> {
        self.per_player_load.iter().find(|l| l.player_id == player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoOutcome {
    pub restored_count: usize,
    pub snapshot_id: Uuid,
    pub taken_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    #[test]
    fn scope_mode_accepts_legacy_spellings() {
        assert_eq!("rest".parse::<ScopeMode>().unwrap(), ScopeMode::FromDate);
        assert_eq!("until".parse::<ScopeMode>().unwrap(), ScopeMode::UntilDate);
        assert_eq!(" ALL ".parse::<ScopeMode>().unwrap(), ScopeMode::All);
        assert!("sometimes".parse::<ScopeMode>().is_err());
    }

    #[test]
    fn cutoff_bounds_are_inclusive() {
        let until = Scope::until(day(10));
        assert!(until.contains_date(day(10)));
        assert!(!until.contains_date(day(11)));

        let from = Scope::from(day(10));
        assert!(from.contains_date(day(10)));
        assert!(!from.contains_date(day(9)));

        assert!(Scope::ALL.contains_date(day(1)));
    }

    #[test]
    fn partner_preference_needs_both_sides() {
        let mut a = Player::new(1, "Anna");
        let mut b = Player::new(2, "Bram");
        a.partner_id = Some(b.id);
        b.partner_id = Some(a.id);
        assert!(a.is_preferred_partner_of(&b));

        b.prefer_partner_together = false;
        assert!(!a.is_preferred_partner_of(&b));

        b.prefer_partner_together = true;
        b.partner_id = None;
        assert!(!a.is_preferred_partner_of(&b));
    }

    #[test]
    fn player_defaults_when_fields_missing() {
        let p: Player = serde_json::from_str(r#"{"id": 7, "name": "Kees"}"#).unwrap();
        assert!(p.active);
        assert!(p.prefer_partner_together);
        assert_eq!(p.partner_id, None);
    }
}
