use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scoring::ScoringWeights;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Plan state file (default plan_state.json)
    pub state_path: PathBuf,
    /// Audit chain file; in-memory only when unset
    pub audit_path: Option<PathBuf>,
    /// Fixed seed for tie-breaking; entropy when unset
    pub rng_seed: Option<u64>,
    /// Reject unparsable cutoffs instead of widening to the whole season
    pub strict_cutoff: bool,
    /// Last-resort backfill from players who marked themselves unavailable
    pub backfill_unavailable: bool,
    pub weights: ScoringWeights,
    pub fill: FillConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("plan_state.json"),
            audit_path: None,
            rng_seed: None,
            strict_cutoff: false,
            backfill_unavailable: false,
            weights: ScoringWeights::default(),
            fill: FillConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Processed matches looked back on for the recency penalty (default 3)
    pub recency_window: usize,
    /// Recent rosters a new roster must not repeat (default 3)
    pub diversity_window: usize,
    /// Width of a score band during individual fill (default 1.0)
    pub band_width: f64,
    /// Share of the open slots taken from a band when the next band is adjacent (default 0.7)
    pub band_take_ratio: f64,
    /// Matches a partner must sit out before the pinned-partner pass adds them (default 1)
    pub partner_min_gap: usize,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            recency_window: 3,
            diversity_window: 3,
            band_width: 1.0,
            band_take_ratio: 0.7,
            partner_min_gap: 1,
        }
    }
}

impl PlannerConfig {
    /// Read a TOML file (defaults when it does not exist), then apply env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                let cfg: PlannerConfig = toml::from_str(&raw)
                    .with_context(|| format!("parsing config {}", p.display()))?;
                info!("Loaded planner config from {}", p.display());
                cfg
            }
            _ => PlannerConfig::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// ROSTER_STATE_PATH, ROSTER_AUDIT_PATH, ROSTER_RNG_SEED, ROSTER_STRICT_CUTOFF
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(p) = var("ROSTER_STATE_PATH") {
            self.state_path = PathBuf::from(p);
        }
        if let Some(p) = var("ROSTER_AUDIT_PATH") {
            self.audit_path = Some(PathBuf::from(p));
        }
        if let Some(seed) = var("ROSTER_RNG_SEED").and_then(|v| v.parse().ok()) {
            self.rng_seed = Some(seed);
        }
        if let Some(strict) = var("ROSTER_STRICT_CUTOFF").and_then(|v| v.parse().ok()) {
            self.strict_cutoff = strict;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fill = &self.fill;
        if !(fill.band_width > 0.0) {
            bail!("fill.band_width must be positive, got {}", fill.band_width);
        }
        if !(fill.band_take_ratio > 0.0 && fill.band_take_ratio <= 1.0) {
            bail!("fill.band_take_ratio must be in (0, 1], got {}", fill.band_take_ratio);
        }
        if fill.recency_window == 0 || fill.diversity_window == 0 {
            bail!("fill windows must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: PlannerConfig = toml::from_str(
            r#"
            rng_seed = 42

            [weights]
            recency = 3.0

            [fill]
            band_take_ratio = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(cfg.rng_seed, Some(42));
        assert_eq!(cfg.weights.recency, 3.0);
        assert_eq!(cfg.weights.load, ScoringWeights::default().load);
        assert_eq!(cfg.fill.band_take_ratio, 0.5);
        assert_eq!(cfg.fill.diversity_window, 3);
        assert!(!cfg.strict_cutoff);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = PlannerConfig::default();
        cfg.apply_env(|key| match key {
            "ROSTER_RNG_SEED" => Some("7".into()),
            "ROSTER_STRICT_CUTOFF" => Some("true".into()),
            "ROSTER_AUDIT_PATH" => Some("/tmp/audit.jsonl".into()),
            _ => None,
        });
        assert_eq!(cfg.rng_seed, Some(7));
        assert!(cfg.strict_cutoff);
        assert_eq!(cfg.audit_path, Some(PathBuf::from("/tmp/audit.jsonl")));
        assert_eq!(cfg.state_path, PathBuf::from("plan_state.json"));
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        let mut cfg = PlannerConfig::default();
        cfg.fill.band_take_ratio = 1.5;
        assert!(cfg.validate().is_err());
        cfg.fill.band_take_ratio = 0.7;
        cfg.fill.band_width = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PlannerConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(cfg.fill, FillConfig::default());
    }
}
