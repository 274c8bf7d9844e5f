//! # planner
//!
//! Caller-facing API over one global plan.
//!
//! All mutations (regenerate, undo and every manual override) take the same write lock,
//! so a regeneration never interleaves with another run, an undo, or a pin change.
//! Reads share the lock. Successful mutations and rolled-back runs are written to the
//! audit chain after the lock is released.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roster_types::{
    MatchId, PlannedMatch, PlayerId, PlayerLoad, RegenerationReport, RosterEntry, ScopeMode,
    Snapshot, UndoOutcome,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::audit::AuditLogger;
use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::overrides;
use crate::regeneration::{self, resolve_scope, CancelHandle, RegenerationRequest, RunGuard};
use crate::store::{MemoryStore, PlanStore};
use crate::undo;

/// Arguments of one regeneration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerateRequest {
    pub exclude_pinned: bool,
    pub scope: ScopeMode,
    /// `YYYY-MM-DD`; required by `UntilDate` and `FromDate`
    pub cutoff: Option<String>,
    /// Abort and roll back when the run takes longer than this
    pub deadline: Option<Duration>,
}

impl Default for RegenerateRequest {
    fn default() -> Self {
        Self {
            exclude_pinned: true,
            scope: ScopeMode::All,
            cutoff: None,
            deadline: None,
        }
    }
}

impl RegenerateRequest {
    pub fn until(cutoff: impl Into<String>) -> Self {
        Self {
            scope: ScopeMode::UntilDate,
            cutoff: Some(cutoff.into()),
            ..Self::default()
        }
    }

    pub fn from_date(cutoff: impl Into<String>) -> Self {
        Self {
            scope: ScopeMode::FromDate,
            cutoff: Some(cutoff.into()),
            ..Self::default()
        }
    }
}

struct PlanCell<S, R> {
    store: S,
    rng: R,
}

pub struct Planner<S = MemoryStore, R = StdRng> {
    inner: RwLock<PlanCell<S, R>>,
    config: PlannerConfig,
    audit: AuditLogger,
}

impl<S: PlanStore> Planner<S, StdRng> {
    /// Seeded from `config.rng_seed` when set, from OS entropy otherwise.
    pub fn new(store: S, config: PlannerConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(store, rng, config)
    }
}

impl<S: PlanStore, R: Rng> Planner<S, R> {
    pub fn with_rng(store: S, rng: R, config: PlannerConfig) -> Self {
        Self {
            inner: RwLock::new(PlanCell { store, rng }),
            config,
            audit: AuditLogger::default(),
        }
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = audit;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    // ── Regeneration & undo ──────────────────────────────────────────────────

    pub async fn regenerate(
        &self,
        request: RegenerateRequest,
    ) -> Result<RegenerationReport, PlannerError> {
        self.regenerate_cancellable(request, CancelHandle::default()).await
    }

    /// Like [`regenerate`](Self::regenerate), but aborted and rolled back before its next
    /// match once `cancel` fires, including while still waiting for the write lock.
    /// The handle belongs to this call only.
    pub async fn regenerate_cancellable(
        &self,
        request: RegenerateRequest,
        cancel: CancelHandle,
    ) -> Result<RegenerationReport, PlannerError> {
        let (scope, scope_widened) =
            resolve_scope(request.scope, request.cutoff.as_deref(), self.config.strict_cutoff)?;
        let guard = RunGuard {
            deadline: request.deadline.map(|d| Instant::now() + d),
            cancel: Some(cancel),
        };
        let engine_request = RegenerationRequest {
            exclude_pinned: request.exclude_pinned,
            scope,
            scope_widened,
        };

        let result = {
            let mut cell = self.inner.write().await;
            let PlanCell { store, rng } = &mut *cell;
            regeneration::regenerate(store, rng, &self.config, &engine_request, &guard)
        };

        match &result {
            Ok(report) => self.audit.log_regenerated(report).await,
            Err(PlannerError::Persistence { source, rolled_back }) => {
                self.audit.log_rolled_back(&source.to_string(), *rolled_back).await
            }
            Err(PlannerError::Aborted { reason, rolled_back }) => {
                self.audit.log_rolled_back(reason, *rolled_back).await
            }
            Err(_) => {}
        }
        result
    }

    /// First plan of a season: the whole calendar, pins included in the reset.
    pub async fn generate_initial_plan(&self) -> Result<RegenerationReport, PlannerError> {
        info!("Generating the initial season plan");
        self.regenerate(RegenerateRequest {
            exclude_pinned: false,
            ..RegenerateRequest::default()
        })
        .await
    }

    pub async fn undo(&self) -> Result<UndoOutcome, PlannerError> {
        let outcome = {
            let mut cell = self.inner.write().await;
            undo::undo(&mut cell.store)?
        };
        self.audit.log_undo(&outcome).await;
        Ok(outcome)
    }

    // ── Manual overrides ─────────────────────────────────────────────────────

    pub async fn pin(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
        pinned: bool,
    ) -> Result<bool, PlannerError> {
        let found = overrides::pin(&mut self.inner.write().await.store, match_id, player_id, pinned)?;
        if found {
            self.audit.log_pin(match_id, Some(player_id), pinned).await;
        }
        Ok(found)
    }

    pub async fn pin_match(&self, match_id: MatchId, pinned: bool) -> Result<usize, PlannerError> {
        let touched = overrides::pin_match(&mut self.inner.write().await.store, match_id, pinned)?;
        self.audit.log_pin(match_id, None, pinned).await;
        Ok(touched)
    }

    pub async fn set_roster(
        &self,
        match_id: MatchId,
        player_ids: &[PlayerId],
        preserve_pinned: bool,
    ) -> Result<usize, PlannerError> {
        let written = overrides::set_roster(
            &mut self.inner.write().await.store,
            match_id,
            player_ids,
            preserve_pinned,
        )?;
        self.audit.log_roster(match_id, player_ids, preserve_pinned).await;
        Ok(written)
    }

    pub async fn set_actually_played(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
        played: bool,
    ) -> Result<bool, PlannerError> {
        let found = overrides::set_actually_played(
            &mut self.inner.write().await.store,
            match_id,
            player_id,
            played,
        )?;
        if found {
            self.audit.log_played(match_id, Some(player_id), played).await;
        }
        Ok(found)
    }

    pub async fn set_match_played(&self, match_id: MatchId, played: bool) -> Result<bool, PlannerError> {
        let found = overrides::set_match_played(&mut self.inner.write().await.store, match_id, played)?;
        if found {
            self.audit.log_played(match_id, None, played).await;
        }
        Ok(found)
    }

    pub async fn add_player_to_match(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
    ) -> Result<(), PlannerError> {
        overrides::add_player_to_match(&mut self.inner.write().await.store, match_id, player_id)?;
        self.audit.log_player_added(match_id, player_id).await;
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub async fn roster(&self, match_id: MatchId) -> Result<Vec<RosterEntry>, PlannerError> {
        overrides::roster(&self.inner.read().await.store, match_id)
    }

    pub async fn player_load(&self, player_id: PlayerId) -> Result<PlayerLoad, PlannerError> {
        overrides::player_load(&self.inner.read().await.store, player_id)
    }

    pub async fn plan(&self) -> Result<Vec<PlannedMatch>, PlannerError> {
        overrides::plan_overview(&self.inner.read().await.store)
    }

    pub async fn snapshot_count(&self) -> Result<usize, PlannerError> {
        Ok(self.inner.read().await.store.snapshot_count()?)
    }

    /// Undo stack, most recent first.
    pub async fn snapshots(&self) -> Result<Vec<Snapshot>, PlannerError> {
        Ok(self.inner.read().await.store.list_snapshots()?)
    }

    /// Run `f` against the store under the read lock.
    pub async fn with_store<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.inner.read().await.store)
    }

    /// Run `f` against the store under the write lock, e.g. to load directory data.
    pub async fn with_store_mut<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        f(&mut self.inner.write().await.store)
    }

    pub fn into_store(self) -> S {
        self.inner.into_inner().store
    }
}
