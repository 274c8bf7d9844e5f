//! # scoring
//!
//! Candidate desirability for one roster slot. Lower is better.
//!
//! score = load·w_load + recency·w_recency + spacing·w_spacing + synergy·w_synergy − partner bonus
//!
//! - **load**: matches assigned so far in this run, pins included
//! - **recency**: appearances in the last few processed matches
//! - **spacing**: 2 if the player played the previous match or the one before, 1 if two
//!   matches ago, 0 otherwise
//! - **synergy**: how often the player already shared a roster with each current roster
//!   member this run; a genuine partner counts at `partner_synergy_factor`
//! - **partner bonus**: subtracted when a mutually-preferring partner is already on the roster

use std::collections::HashMap;

use roster_types::PlayerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub load: f64,
    pub recency: f64,
    pub spacing: f64,
    pub synergy: f64,
    /// Multiplier on co-occurrence with one's own partner.
    pub partner_synergy_factor: f64,
    /// Individual fill: subtracted when the partner is already on the roster.
    pub partner_bonus: f64,
    /// Pairing pass: subtracted from a genuine partner pair's combined score.
    pub pair_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            load: 1.0,
            recency: 1.5,
            spacing: 1.0,
            synergy: 0.5,
            partner_synergy_factor: 0.25,
            partner_bonus: 0.5,
            pair_bonus: 1.0,
        }
    }
}

/// Per-candidate inputs, gathered by the regeneration context.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub load: u32,
    pub recent_appearances: u32,
    /// Matches in between the last appearance and this one; `None` if not played this run.
    pub matches_ago: Option<usize>,
    pub synergy: f64,
    pub partner_on_roster: bool,
}

pub fn spacing_penalty(matches_ago: Option<usize>) -> u32 {
    match matches_ago {
        Some(0) | Some(1) => 2,
        Some(2) => 1,
        _ => 0,
    }
}

pub fn score(inputs: &ScoreInputs, weights: &ScoringWeights) -> f64 {
    let mut s = f64::from(inputs.load) * weights.load
        + f64::from(inputs.recent_appearances) * weights.recency
        + f64::from(spacing_penalty(inputs.matches_ago)) * weights.spacing
        + inputs.synergy * weights.synergy;
    if inputs.partner_on_roster {
        s -= weights.partner_bonus;
    }
    s
}

/// Combined score of a genuine partner pair entering together.
pub fn pair_score(a: &ScoreInputs, b: &ScoreInputs, weights: &ScoringWeights) -> f64 {
    score(a, weights) + score(b, weights) - weights.pair_bonus
}

/// Score band used for tie grouping during individual fill.
pub fn band_of(score: f64, band_width: f64) -> i64 {
    (score / band_width).round() as i64
}

// ── Co-occurrence ─────────────────────────────────────────────────────────────

/// How often two players shared a roster during the current run.
#[derive(Debug, Clone, Default)]
pub struct PairCounts {
    counts: HashMap<(PlayerId, PlayerId), u32>,
}

impl PairCounts {
    fn key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn get(&self, a: PlayerId, b: PlayerId) -> u32 {
        self.counts.get(&Self::key(a, b)).copied().unwrap_or(0)
    }

    /// Count every unordered pair of a finished roster once.
    pub fn record_roster(&mut self, roster: &[PlayerId]) {
        for (i, &a) in roster.iter().enumerate() {
            for &b in &roster[i + 1..] {
                if a != b {
                    *self.counts.entry(Self::key(a, b)).or_insert(0) += 1;
                }
            }
        }
    }

    /// Synergy penalty of `player` against the current roster.
    pub fn synergy(
        &self,
        player: PlayerId,
        partner: Option<PlayerId>,
        roster: &[PlayerId],
        partner_factor: f64,
    ) -> f64 {
        roster
            .iter()
            .filter(|&&other| other != player)
            .map(|&other| {
                let together = f64::from(self.get(player, other));
                if Some(other) == partner {
                    together * partner_factor
                } else {
                    together
                }
            })
            .sum()
    }
}
