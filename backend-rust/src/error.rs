use roster_types::{MatchId, PlayerId};
use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced by the planner API.
///
/// `EmptyScope`, `UndoUnavailable`, `UnknownMatch` and `AlreadyAssigned` never mutate the plan.
/// `Persistence` and `Aborted` report whether the pre-run state was restored.
/// Shortfalls are not errors: they travel as violations inside the report.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("nothing to plan: {matches} eligible matches, {players} active players")]
    EmptyScope { matches: usize, players: usize },

    #[error("no snapshot to undo")]
    UndoUnavailable,

    #[error("invalid cutoff date '{0}' (expected YYYY-MM-DD)")]
    InvalidCutoff(String),

    #[error("store write failed (rolled back: {rolled_back}): {source}")]
    Persistence {
        #[source]
        source: StoreError,
        rolled_back: bool,
    },

    #[error("regeneration aborted (rolled back: {rolled_back}): {reason}")]
    Aborted { reason: String, rolled_back: bool },

    #[error("unknown match {0}")]
    UnknownMatch(MatchId),

    #[error("player {player_id} is already on the roster of {match_id}")]
    AlreadyAssigned { match_id: MatchId, player_id: PlayerId },
}

impl From<StoreError> for PlannerError {
    /// Plain store failure outside a regeneration run; nothing needed restoring.
    fn from(source: StoreError) -> Self {
        PlannerError::Persistence {
            source,
            rolled_back: false,
        }
    }
}
