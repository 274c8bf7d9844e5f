//! # regeneration
//!
//! Recomputes the roster of every unplayed match in scope, chronologically, in one pass.
//!
//! ## Run outline
//! 1. Snapshot the assignment table (the undo and rollback target)
//! 2. Drop stale rows past an until-cutoff, collect pins, clear unpinned rows in scope
//! 3. Per match: pinned-partner pass, partner-pair pass, banded individual fill,
//!    cap-relaxing backfill, one diversity swap, then persist and update counters
//!
//! Any store failure or abort after step 1 restores the snapshot before returning,
//! so a run is either fully applied or not applied at all.
//!
//! ## Caps
//! - global: ceil(4 × matches in scope ÷ active players)
//! - progressive: ceil(4 × matches processed so far, inclusive ÷ active players)
//!
//! Backfill may exceed the progressive cap and then the global cap by one, never more.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use roster_types::{
    Assignment, Availability, Match, MatchId, Player, PlayerId, PlayerLoadSummary,
    RegenerationReport, Scope, ScopeMode, Snapshot, Violation, ROSTER_SIZE,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::scoring::{band_of, pair_score, score, PairCounts, ScoreInputs};
use crate::store::{PlanStore, StoreError};

// ── Request & scope ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerationRequest {
    pub exclude_pinned: bool,
    pub scope: Scope,
    pub scope_widened: bool,
}

/// Parse the caller's cutoff for `UntilDate`/`FromDate`.
///
/// Returns the scope and whether it was widened to the whole season because the cutoff
/// was missing or unparsable (lenient mode). Strict mode rejects it instead.
pub fn resolve_scope(
    mode: ScopeMode,
    cutoff: Option<&str>,
    strict: bool,
) -> Result<(Scope, bool), PlannerError> {
    if mode == ScopeMode::All {
        return Ok((Scope::ALL, false));
    }
    let raw = cutoff.map(str::trim).unwrap_or_default();
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Ok((Scope { mode, cutoff: Some(date) }, false)),
        Err(_) if strict => Err(PlannerError::InvalidCutoff(raw.to_string())),
        Err(_) => {
            warn!("Cutoff '{raw}' is not a YYYY-MM-DD date; planning the whole season instead of {mode}");
            Ok((Scope::ALL, true))
        }
    }
}

// ── Abort guard ───────────────────────────────────────────────────────────────

/// Cooperative cancellation flag for one run; clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Checked before every match; tripping it rolls the run back.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelHandle>,
}

impl RunGuard {
    fn check(&self) -> Result<(), String> {
        if self.cancel.as_ref().is_some_and(CancelHandle::is_cancelled) {
            return Err("cancelled by caller".to_string());
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err("deadline exceeded".to_string());
        }
        Ok(())
    }
}

enum RunFailure {
    Store(StoreError),
    Aborted(String),
}

impl From<StoreError> for RunFailure {
    fn from(e: StoreError) -> Self {
        RunFailure::Store(e)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

pub fn regenerate<S, R>(
    store: &mut S,
    rng: &mut R,
    config: &PlannerConfig,
    request: &RegenerationRequest,
    guard: &RunGuard,
) -> Result<RegenerationReport, PlannerError>
where
    S: PlanStore + ?Sized,
    R: Rng + ?Sized,
{
    let players = store.list_active_players()?;
    let matches = store.list_matches()?;
    let scope_matches: Vec<&Match> = matches
        .iter()
        .filter(|m| !m.played && request.scope.contains_date(m.date))
        .collect();

    if scope_matches.is_empty() || players.is_empty() {
        info!(
            "Nothing to regenerate: {} matches in scope, {} active players",
            scope_matches.len(),
            players.len()
        );
        return Err(PlannerError::EmptyScope {
            matches: scope_matches.len(),
            players: players.len(),
        });
    }

    let before = store.list_assignments()?;
    let snapshot = Snapshot {
        id: Uuid::new_v4(),
        taken_at: Utc::now(),
        exclude_pinned: request.exclude_pinned,
        scope: request.scope,
        assignments: before.clone(),
    };
    let snapshot_id = snapshot.id;
    store.push_snapshot(snapshot)?;
    info!(
        "Regenerating {} matches for {} players (scope {}, snapshot {snapshot_id}, {} rows saved)",
        scope_matches.len(),
        players.len(),
        request.scope.mode,
        before.len()
    );

    let run = Run {
        config,
        request,
        players: &players,
        matches: &matches,
        scope_matches: &scope_matches,
        snapshot_id,
    };
    match run.execute(store, rng, guard) {
        Ok(report) => Ok(report),
        Err(failure) => {
            let rolled_back = rollback(store, before);
            Err(match failure {
                RunFailure::Store(source) => PlannerError::Persistence { source, rolled_back },
                RunFailure::Aborted(reason) => PlannerError::Aborted { reason, rolled_back },
            })
        }
    }
}

/// Put the pre-run rows back and drop the run's own snapshot.
fn rollback<S: PlanStore + ?Sized>(store: &mut S, before: Vec<Assignment>) -> bool {
    let restored = store
        .replace_all(before)
        .and_then(|_| store.pop_snapshot().map(|_| ()));
    match restored {
        Ok(()) => {
            warn!("Regeneration failed; plan restored to its pre-run state");
            true
        }
        Err(e) => {
            error!("Rollback after failed regeneration also failed: {e}");
            false
        }
    }
}

struct Run<'a> {
    config: &'a PlannerConfig,
    request: &'a RegenerationRequest,
    players: &'a [Player],
    matches: &'a [Match],
    scope_matches: &'a [&'a Match],
    snapshot_id: Uuid,
}

impl<'a> Run<'a> {
    fn execute<S, R>(
        &self,
        store: &mut S,
        rng: &mut R,
        guard: &RunGuard,
    ) -> Result<RegenerationReport, RunFailure>
    where
        S: PlanStore + ?Sized,
        R: Rng + ?Sized,
    {
        let scope = self.request.scope;
        let exclude_pinned = self.request.exclude_pinned;

        if let (ScopeMode::UntilDate, Some(cutoff)) = (scope.mode, scope.cutoff) {
            let mut stale = 0;
            for m in self.matches.iter().filter(|m| !m.played && m.date > cutoff) {
                stale += store.delete_for_match(m.id, false)?;
            }
            if stale > 0 {
                info!("Removed {stale} assignments dated after {cutoff}");
            }
        }

        // Seeds: pins of active players inside the scope.
        let in_scope: HashSet<MatchId> = self.scope_matches.iter().map(|m| m.id).collect();
        let active: HashSet<PlayerId> = self.players.iter().map(|p| p.id).collect();
        let mut pinned: HashMap<MatchId, Vec<PlayerId>> = HashMap::new();
        if exclude_pinned {
            for a in store.list_assignments()? {
                if a.pinned && in_scope.contains(&a.match_id) && active.contains(&a.player_id) {
                    pinned.entry(a.match_id).or_default().push(a.player_id);
                }
            }
        }
        let availability = AvailabilityIndex::new(store.list_availability()?);

        let mut cleared = 0;
        for m in self.scope_matches {
            cleared += store.delete_for_match(m.id, exclude_pinned)?;
        }
        info!(
            "Cleared {cleared} assignments, keeping {} pins",
            pinned.values().map(Vec::len).sum::<usize>()
        );

        let mut ctx = RegenerationContext::new(self.config, self.players, self.scope_matches.len());
        let dates: HashMap<MatchId, NaiveDate> = self.matches.iter().map(|m| (m.id, m.date)).collect();
        for a in store.list_assignments()? {
            if let Some(&date) = dates.get(&a.match_id) {
                ctx.booked.insert((a.player_id, date));
            }
        }
        for m in self.scope_matches {
            for &player_id in pinned.get(&m.id).into_iter().flatten() {
                ctx.load_mut(player_id).add(m.is_home);
            }
        }

        let mut new_assignments = 0;
        let mut backfilled = 0;
        let mut diversity_swaps = 0;
        let mut violations = Vec::new();

        for (idx, m) in self.scope_matches.iter().enumerate() {
            guard.check().map_err(RunFailure::Aborted)?;

            let pinned_here = pinned.get(&m.id).map(Vec::as_slice).unwrap_or(&[]);
            let outcome = ctx.plan_match(m, idx, pinned_here, &availability, rng);

            for &player_id in &outcome.selected {
                store.insert(Assignment::planned(m.id, player_id))?;
            }

            let mut roster = pinned_here.to_vec();
            roster.extend_from_slice(&outcome.selected);
            if roster.len() < ROSTER_SIZE {
                let violation = Violation {
                    match_id: m.id,
                    date: m.date,
                    assigned: roster.len(),
                    required: ROSTER_SIZE,
                };
                warn!("Roster shortfall: {violation}");
                violations.push(violation);
            }
            debug!(
                "{} {} ({}): pinned {:?}, selected {:?}, backfilled {}",
                m.id,
                m.date,
                m.label(),
                pinned_here,
                outcome.selected,
                outcome.backfilled
            );

            ctx.record(m, idx, &roster, &outcome.selected);
            new_assignments += outcome.selected.len();
            backfilled += outcome.backfilled;
            diversity_swaps += usize::from(outcome.swapped);
        }

        let per_player_load: Vec<PlayerLoadSummary> = self
            .players
            .iter()
            .map(|p| {
                let load = ctx.load(p.id);
                PlayerLoadSummary {
                    player_id: p.id,
                    name: p.name.clone(),
                    total: load.total,
                    home: load.home,
                    away: load.away,
                }
            })
            .collect();

        info!(
            "Regeneration complete: {} matches, {new_assignments} new assignments, {} violations, global cap {}",
            self.scope_matches.len(),
            violations.len(),
            ctx.global_cap
        );

        Ok(RegenerationReport {
            snapshot_id: self.snapshot_id,
            scope,
            scope_widened: self.request.scope_widened,
            processed: self.scope_matches.len(),
            new_assignments,
            backfilled,
            diversity_swaps,
            violations,
            per_player_load,
        })
    }
}

// ── Availability lookup ───────────────────────────────────────────────────────

struct AvailabilityIndex {
    flags: HashMap<(PlayerId, MatchId), bool>,
}

impl AvailabilityIndex {
    fn new(records: Vec<Availability>) -> Self {
        Self {
            flags: records
                .into_iter()
                .map(|a| ((a.player_id, a.match_id), a.is_available))
                .collect(),
        }
    }

    fn is_available(&self, player_id: PlayerId, match_id: MatchId) -> bool {
        self.flags.get(&(player_id, match_id)).copied().unwrap_or(true)
    }
}

// ── Regeneration context ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct Load {
    total: u32,
    home: u32,
    away: u32,
}

impl Load {
    fn add(&mut self, is_home: bool) {
        self.total += 1;
        if is_home {
            self.home += 1;
        } else {
            self.away += 1;
        }
    }
}

#[derive(Debug, Default)]
struct MatchOutcome {
    selected: Vec<PlayerId>,
    backfilled: usize,
    swapped: bool,
}

#[derive(Clone, Copy)]
pub(crate) struct Scored<'a> {
    pub(crate) player: &'a Player,
    pub(crate) score: f64,
}

/// Counters of one run; dropped when the run ends.
pub(crate) struct RegenerationContext<'a> {
    config: &'a PlannerConfig,
    ordered: Vec<&'a Player>,
    by_id: HashMap<PlayerId, &'a Player>,
    loads: HashMap<PlayerId, Load>,
    last_index: HashMap<PlayerId, usize>,
    pairs: PairCounts,
    /// Sorted rosters of the latest processed matches, newest last.
    recent: VecDeque<Vec<PlayerId>>,
    booked: HashSet<(PlayerId, NaiveDate)>,
    global_cap: u32,
    player_count: usize,
}

fn ceil_div(a: usize, b: usize) -> u32 {
    a.div_ceil(b) as u32
}

impl<'a> RegenerationContext<'a> {
    pub(crate) fn new(config: &'a PlannerConfig, players: &'a [Player], scope_len: usize) -> Self {
        let player_count = players.len().max(1);
        Self {
            config,
            ordered: players.iter().collect(),
            by_id: players.iter().map(|p| (p.id, p)).collect(),
            loads: HashMap::new(),
            last_index: HashMap::new(),
            pairs: PairCounts::default(),
            recent: VecDeque::new(),
            booked: HashSet::new(),
            global_cap: ceil_div(ROSTER_SIZE * scope_len, player_count),
            player_count,
        }
    }

    fn progressive_cap(&self, idx: usize) -> u32 {
        ceil_div(ROSTER_SIZE * (idx + 1), self.player_count)
    }

    fn load(&self, player_id: PlayerId) -> Load {
        self.loads.get(&player_id).copied().unwrap_or_default()
    }

    fn load_mut(&mut self, player_id: PlayerId) -> &mut Load {
        self.loads.entry(player_id).or_default()
    }

    fn under_caps(&self, player_id: PlayerId, idx: usize) -> bool {
        let total = self.load(player_id).total;
        total < self.progressive_cap(idx) && total < self.global_cap
    }

    fn matches_ago(&self, player_id: PlayerId, idx: usize) -> Option<usize> {
        self.last_index.get(&player_id).map(|&last| idx - last - 1)
    }

    fn has_partner_gap(&self, player_id: PlayerId, idx: usize) -> bool {
        self.matches_ago(player_id, idx)
            .map_or(true, |ago| ago >= self.config.fill.partner_min_gap)
    }

    fn is_booked(&self, player_id: PlayerId, date: NaiveDate) -> bool {
        self.booked.contains(&(player_id, date))
    }

    fn partner_on_roster(&self, player: &Player, roster: &[PlayerId]) -> bool {
        roster
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .any(|other| player.is_preferred_partner_of(other))
    }

    fn inputs(&self, player: &Player, idx: usize, roster: &[PlayerId]) -> ScoreInputs {
        let recent_appearances = self
            .recent
            .iter()
            .rev()
            .take(self.config.fill.recency_window)
            .filter(|r| r.contains(&player.id))
            .count() as u32;
        ScoreInputs {
            load: self.load(player.id).total,
            recent_appearances,
            matches_ago: self.matches_ago(player.id, idx),
            synergy: self.pairs.synergy(
                player.id,
                player.partner_id,
                roster,
                self.config.weights.partner_synergy_factor,
            ),
            partner_on_roster: self.partner_on_roster(player, roster),
        }
    }

    fn scored(&self, player: &'a Player, idx: usize, roster: &[PlayerId]) -> Scored<'a> {
        Scored {
            player,
            score: score(&self.inputs(player, idx, roster), &self.config.weights),
        }
    }

    /// Lower when the player is short on matches of this venue type.
    fn balance_key(&self, player_id: PlayerId, is_home: bool) -> i64 {
        let load = self.load(player_id);
        if is_home {
            i64::from(load.home) - i64::from(load.away)
        } else {
            i64::from(load.away) - i64::from(load.home)
        }
    }

    fn repeats_recent(&self, sorted_roster: &[PlayerId]) -> bool {
        self.recent
            .iter()
            .rev()
            .take(self.config.fill.diversity_window)
            .any(|r| r.as_slice() == sorted_roster)
    }

    fn plan_match<R: Rng + ?Sized>(
        &self,
        m: &Match,
        idx: usize,
        pinned_here: &[PlayerId],
        availability: &AvailabilityIndex,
        rng: &mut R,
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let needed = ROSTER_SIZE.saturating_sub(pinned_here.len());
        if needed == 0 {
            return outcome;
        }

        let candidates: Vec<&'a Player> = self
            .ordered
            .iter()
            .copied()
            .filter(|p| {
                !pinned_here.contains(&p.id)
                    && !self.is_booked(p.id, m.date)
                    && availability.is_available(p.id, m.id)
            })
            .collect();

        let mut roster: Vec<PlayerId> = pinned_here.to_vec();
        let mut selected: Vec<PlayerId> = Vec::with_capacity(needed);

        // A pinned player pulls in their partner.
        for pin in pinned_here {
            if selected.len() >= needed {
                break;
            }
            let Some(pinned_player) = self.by_id.get(pin) else {
                continue;
            };
            let partner = candidates
                .iter()
                .find(|c| pinned_player.is_preferred_partner_of(c) && !selected.contains(&c.id));
            if let Some(partner) = partner {
                if self.under_caps(partner.id, idx) && self.has_partner_gap(partner.id, idx) {
                    debug!("{}: adding {} next to pinned partner {}", m.id, partner.name, pinned_player.name);
                    selected.push(partner.id);
                    roster.push(partner.id);
                }
            }
        }

        // Partner pairs enter together.
        if needed - selected.len() >= 2 {
            let free: Vec<&'a Player> = candidates
                .iter()
                .copied()
                .filter(|c| !selected.contains(&c.id) && self.under_caps(c.id, idx))
                .collect();
            let mut pairs: Vec<(f64, &'a Player, &'a Player)> = Vec::new();
            for (i, &a) in free.iter().enumerate() {
                for &b in &free[i + 1..] {
                    if a.is_preferred_partner_of(b) {
                        let s = pair_score(
                            &self.inputs(a, idx, &roster),
                            &self.inputs(b, idx, &roster),
                            &self.config.weights,
                        );
                        pairs.push((s, a, b));
                    }
                }
            }
            pairs.sort_by(|x, y| x.0.total_cmp(&y.0));
            for (_, a, b) in pairs {
                if needed - selected.len() < 2 {
                    break;
                }
                if selected.contains(&a.id) || selected.contains(&b.id) {
                    continue;
                }
                debug!("{}: pairing partners {} and {}", m.id, a.name, b.name);
                selected.extend([a.id, b.id]);
                roster.extend([a.id, b.id]);
            }
        }

        let open = needed - selected.len();
        if open > 0 {
            let pool: Vec<Scored<'a>> = candidates
                .iter()
                .copied()
                .filter(|c| !selected.contains(&c.id) && self.under_caps(c.id, idx))
                .map(|c| self.scored(c, idx, &roster))
                .collect();
            for player_id in self.fill_by_bands(pool, open, m.is_home, rng) {
                selected.push(player_id);
                roster.push(player_id);
            }
        }

        // Backfill: drop the progressive cap, then allow one over the global cap.
        if selected.len() < needed {
            for limit in [self.global_cap, self.global_cap + 1] {
                let open = needed - selected.len();
                if open == 0 {
                    break;
                }
                let pool: Vec<&'a Player> = candidates
                    .iter()
                    .copied()
                    .filter(|c| !selected.contains(&c.id) && self.load(c.id).total < limit)
                    .collect();
                for player_id in self.lowest_scores(pool, idx, &roster, open) {
                    selected.push(player_id);
                    roster.push(player_id);
                    outcome.backfilled += 1;
                }
            }
        }
        if selected.len() < needed && self.config.backfill_unavailable {
            let pool: Vec<&'a Player> = self
                .ordered
                .iter()
                .copied()
                .filter(|p| {
                    !pinned_here.contains(&p.id)
                        && !selected.contains(&p.id)
                        && !self.is_booked(p.id, m.date)
                        && !availability.is_available(p.id, m.id)
                        && self.load(p.id).total <= self.global_cap
                })
                .collect();
            let open = needed - selected.len();
            for player_id in self.lowest_scores(pool, idx, &roster, open) {
                warn!("{}: backfilling {player_id} despite unavailability", m.id);
                selected.push(player_id);
                roster.push(player_id);
                outcome.backfilled += 1;
            }
        }

        if roster.len() == ROSTER_SIZE {
            let mut key = roster.clone();
            key.sort();
            if self.repeats_recent(&key) {
                if let Some((out, inc)) = self.diversity_swap(idx, &roster, &selected, &candidates) {
                    debug!("{}: swapping {out} for {inc} to avoid a repeated roster", m.id);
                    for id in selected.iter_mut().chain(roster.iter_mut()) {
                        if *id == out {
                            *id = inc;
                        }
                    }
                    outcome.swapped = true;
                }
            }
        }

        outcome.selected = selected;
        outcome
    }

    /// Best bands first; random order inside a band, then home/away balance.
    pub(crate) fn fill_by_bands<R: Rng + ?Sized>(
        &self,
        pool: Vec<Scored<'a>>,
        slots: usize,
        is_home: bool,
        rng: &mut R,
    ) -> Vec<PlayerId> {
        let fill = &self.config.fill;
        let mut bands: BTreeMap<i64, Vec<Scored<'a>>> = BTreeMap::new();
        for s in pool {
            bands.entry(band_of(s.score, fill.band_width)).or_default().push(s);
        }

        let keys: Vec<i64> = bands.keys().copied().collect();
        let mut picked: Vec<PlayerId> = Vec::with_capacity(slots);
        let mut held_back: Vec<PlayerId> = Vec::new();

        for (i, key) in keys.iter().enumerate() {
            let open = slots - picked.len();
            if open == 0 {
                break;
            }
            let Some(mut band) = bands.remove(key) else {
                continue;
            };
            band.shuffle(rng);
            band.sort_by_key(|s| self.balance_key(s.player.id, is_home));

            let next_adjacent = keys.get(i + 1).is_some_and(|next| next - key <= 1);
            let quota = if next_adjacent && open > 1 && band.len() >= open {
                ((open as f64) * fill.band_take_ratio).ceil() as usize
            } else {
                open
            };
            let take = quota.clamp(1, open).min(band.len());
            let rest = band.split_off(take);
            picked.extend(band.iter().map(|s| s.player.id));
            held_back.extend(rest.iter().map(|s| s.player.id));
        }

        // Slots the ratio left open go to the best held-back candidates.
        for player_id in held_back {
            if picked.len() >= slots {
                break;
            }
            picked.push(player_id);
        }
        picked
    }

    fn lowest_scores(
        &self,
        pool: Vec<&'a Player>,
        idx: usize,
        roster: &[PlayerId],
        take: usize,
    ) -> Vec<PlayerId> {
        let mut scored: Vec<Scored<'a>> = pool.into_iter().map(|p| self.scored(p, idx, roster)).collect();
        scored.sort_by(|a, b| a.score.total_cmp(&b.score));
        scored.into_iter().take(take).map(|s| s.player.id).collect()
    }

    /// One non-pinned member out, one unused candidate in, so the roster is not a recent repeat.
    fn diversity_swap(
        &self,
        idx: usize,
        roster: &[PlayerId],
        selected: &[PlayerId],
        candidates: &[&'a Player],
    ) -> Option<(PlayerId, PlayerId)> {
        let mut outgoing: Vec<PlayerId> = selected.iter().rev().copied().collect();
        outgoing.sort_by_key(|id| {
            self.by_id
                .get(id)
                .is_some_and(|p| self.partner_on_roster(p, roster))
        });

        let mut incoming: Vec<Scored<'a>> = candidates
            .iter()
            .copied()
            .filter(|c| !roster.contains(&c.id) && self.under_caps(c.id, idx))
            .map(|c| self.scored(c, idx, roster))
            .collect();
        incoming.sort_by(|a, b| a.score.total_cmp(&b.score));

        for out in outgoing {
            for inc in &incoming {
                let mut next: Vec<PlayerId> = roster
                    .iter()
                    .map(|&id| if id == out { inc.player.id } else { id })
                    .collect();
                next.sort();
                if !self.repeats_recent(&next) {
                    return Some((out, inc.player.id));
                }
            }
        }
        None
    }

    fn record(&mut self, m: &Match, idx: usize, roster: &[PlayerId], selected: &[PlayerId]) {
        for &player_id in selected {
            self.load_mut(player_id).add(m.is_home);
            self.booked.insert((player_id, m.date));
        }
        for &player_id in roster {
            self.last_index.insert(player_id, idx);
        }
        self.pairs.record_roster(roster);

        let mut key = roster.to_vec();
        key.sort();
        self.recent.push_back(key);
        let window = self.config.fill.recency_window.max(self.config.fill.diversity_window);
        while self.recent.len() > window {
            self.recent.pop_front();
        }
    }
}
