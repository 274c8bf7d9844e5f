//! # overrides
//!
//! Manual corrections to the plan: pins, hand-set rosters, played flags and late
//! substitutes, plus the read side (rosters, player loads, plan overview).
//!
//! None of these touch the snapshot stack; only regeneration snapshots.

use roster_types::{
    Assignment, MatchId, PlannedMatch, PlayerId, PlayerLoad, RosterEntry,
};
use tracing::{info, warn};

use crate::error::PlannerError;
use crate::store::{PlanStore, StoreResult};

/// Toggle the pin on one row. `false` when the row does not exist.
pub fn pin<S: PlanStore + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    player_id: PlayerId,
    pinned: bool,
) -> Result<bool, PlannerError> {
    let found = store.set_pinned(match_id, player_id, pinned)?;
    if found {
        info!("{} {player_id} on {match_id}", if pinned { "Pinned" } else { "Unpinned" });
    }
    Ok(found)
}

/// Toggle the pin on every row of a match. Returns the rows touched.
pub fn pin_match<S: PlanStore + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    pinned: bool,
) -> Result<usize, PlannerError> {
    let touched = store.set_match_pinned(match_id, pinned)?;
    info!("Set pinned={pinned} on {touched} rows of {match_id}");
    Ok(touched)
}

/// Replace a match's roster by hand.
///
/// With `preserve_pinned`, pinned rows stay and only the unpinned ones are replaced; ids
/// already pinned are skipped. New rows are unpinned. Returns the number of rows written.
/// Fails with `UnknownMatch` before touching anything when the match does not exist.
/// On a store failure the match's previous rows are put back.
pub fn set_roster<S: PlanStore + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    player_ids: &[PlayerId],
    preserve_pinned: bool,
) -> Result<usize, PlannerError> {
    ensure_match(store, match_id)?;
    let previous = store.roster(match_id)?;
    match write_roster(store, match_id, player_ids, preserve_pinned, &previous) {
        Ok(written) => {
            info!("Roster of {match_id} set by hand: {written} rows written (preserve pins: {preserve_pinned})");
            Ok(written)
        }
        Err(source) => {
            let restored = store
                .delete_for_match(match_id, false)
                .and_then(|_| previous.iter().try_for_each(|a| store.insert(*a)));
            if let Err(e) = &restored {
                warn!("Could not restore roster of {match_id}: {e}");
            }
            Err(PlannerError::Persistence {
                source,
                rolled_back: restored.is_ok(),
            })
        }
    }
}

fn write_roster<S: PlanStore + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    player_ids: &[PlayerId],
    preserve_pinned: bool,
    previous: &[Assignment],
) -> StoreResult<usize> {
    let mut keep: Vec<PlayerId> = Vec::new();
    for a in previous {
        if preserve_pinned && a.pinned {
            keep.push(a.player_id);
        } else {
            store.delete(match_id, a.player_id)?;
        }
    }

    let mut written: Vec<PlayerId> = Vec::with_capacity(player_ids.len());
    for &player_id in player_ids {
        if keep.contains(&player_id) || written.contains(&player_id) {
            continue;
        }
        store.insert(Assignment::planned(match_id, player_id))?;
        written.push(player_id);
    }
    Ok(written.len())
}

fn ensure_match<S: PlanStore + ?Sized>(store: &S, match_id: MatchId) -> Result<(), PlannerError> {
    if store.list_matches()?.iter().any(|m| m.id == match_id) {
        Ok(())
    } else {
        Err(PlannerError::UnknownMatch(match_id))
    }
}

/// Post-hoc correction on one row. `false` when the row does not exist.
pub fn set_actually_played<S: PlanStore + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    player_id: PlayerId,
    played: bool,
) -> Result<bool, PlannerError> {
    Ok(store.set_actually_played(match_id, player_id, played)?)
}

/// Marking a match played takes it out of every future regeneration scope.
pub fn set_match_played<S: PlanStore + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    played: bool,
) -> Result<bool, PlannerError> {
    let found = store.set_match_played(match_id, played)?;
    if found {
        info!("{match_id} marked played={played}");
    }
    Ok(found)
}

/// Late substitute: add a player on top of the current roster, pinned and marked played.
pub fn add_player_to_match<S: PlanStore + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    player_id: PlayerId,
) -> Result<(), PlannerError> {
    ensure_match(store, match_id)?;
    if store.roster(match_id)?.iter().any(|a| a.player_id == player_id) {
        return Err(PlannerError::AlreadyAssigned { match_id, player_id });
    }
    store.insert(Assignment {
        match_id,
        player_id,
        pinned: true,
        actually_played: true,
    })?;
    info!("Added {player_id} to {match_id} as a played substitute");
    Ok(())
}

/// Rows of one match ordered by player id.
pub fn roster<S: PlanStore + ?Sized>(
    store: &S,
    match_id: MatchId,
) -> Result<Vec<RosterEntry>, PlannerError> {
    let mut entries: Vec<RosterEntry> = store.roster(match_id)?.iter().map(RosterEntry::from).collect();
    entries.sort_by_key(|e| e.player_id);
    Ok(entries)
}

/// Counts over every row of the player, across the whole season.
pub fn player_load<S: PlanStore + ?Sized>(
    store: &S,
    player_id: PlayerId,
) -> Result<PlayerLoad, PlannerError> {
    let matches = store.list_matches()?;
    let mut load = PlayerLoad::default();
    for a in store.list_assignments()?.iter().filter(|a| a.player_id == player_id) {
        let Some(m) = matches.iter().find(|m| m.id == a.match_id) else {
            continue;
        };
        load.total_assigned += 1;
        if m.is_home {
            load.home += 1;
        } else {
            load.away += 1;
        }
        if a.actually_played {
            load.actually_played += 1;
        }
        if m.played {
            load.completed_matches += 1;
        }
    }
    Ok(load)
}

/// Every match in date order with its roster.
pub fn plan_overview<S: PlanStore + ?Sized>(store: &S) -> Result<Vec<PlannedMatch>, PlannerError> {
    let mut plan = Vec::new();
    for m in store.list_matches()? {
        let roster = roster(store, m.id)?;
        plan.push(PlannedMatch { match_info: m, roster });
    }
    Ok(plan)
}
