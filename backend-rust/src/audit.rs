//! # audit
//!
//! SHA-256 chained audit log of plan mutations.
//!
//! Every regeneration, rollback, undo and manual override is appended as a block whose
//! hash covers the previous block's hash. Editing or dropping a line of the log breaks
//! the chain, which [`verify_chain`] detects.
//!
//! Blocks are kept in memory and, when a path is configured, appended to a JSON-lines
//! file. A write failure is logged and never fails the plan operation itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use roster_types::{MatchId, PlayerId, RegenerationReport, UndoOutcome};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

// ── Audit Event Types ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    /// Regeneration committed
    Regenerated,
    /// Regeneration failed and the pre-run plan was restored
    RegenerationRolledBack,
    /// Latest snapshot restored
    UndoApplied,
    /// Pin toggled on a row or a whole match
    PinChanged,
    /// Roster set by hand
    RosterChanged,
    /// Actually-played or match-played correction
    PlayedChanged,
    /// Late substitute added
    PlayerAdded,
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

// ── Audit Block ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditBlock {
    /// Monotonically increasing sequence number, continued across process restarts
    pub block_seq: u64,
    /// Wall-clock timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Hash of the previous block (hex). Genesis: 64 zeros
    pub prev_hash: String,
    pub event_type: AuditEventType,
    pub payload_json: String,
    /// SHA-256 of (prev_hash || block_seq || timestamp_ms || event_type || payload_json)
    pub block_hash: String,
}

impl AuditBlock {
    fn compute_hash(
        prev_hash: &str,
        block_seq: u64,
        timestamp_ms: u64,
        event_type: AuditEventType,
        payload_json: &str,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prev_hash.as_bytes());
        hasher.update(block_seq.to_le_bytes());
        hasher.update(timestamp_ms.to_le_bytes());
        hasher.update(event_type.to_string().as_bytes());
        hasher.update(payload_json.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn new(
        block_seq: u64,
        timestamp_ms: u64,
        prev_hash: String,
        event_type: AuditEventType,
        payload_json: String,
    ) -> Self {
        let block_hash =
            Self::compute_hash(&prev_hash, block_seq, timestamp_ms, event_type, &payload_json);
        Self {
            block_seq,
            timestamp_ms,
            prev_hash,
            event_type,
            payload_json,
            block_hash,
        }
    }

    /// Verify this block's hash is internally consistent
    pub fn verify(&self) -> bool {
        Self::compute_hash(
            &self.prev_hash,
            self.block_seq,
            self.timestamp_ms,
            self.event_type,
            &self.payload_json,
        ) == self.block_hash
    }
}

pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Index of the first block that fails its own hash or does not link to its predecessor.
pub fn verify_chain(blocks: &[AuditBlock]) -> Result<(), usize> {
    let mut prev = GENESIS_HASH;
    for (i, block) in blocks.iter().enumerate() {
        if block.prev_hash != prev || !block.verify() {
            return Err(i);
        }
        prev = &block.block_hash;
    }
    Ok(())
}

// ── Audit Logger ──────────────────────────────────────────────────────────────

struct AuditState {
    block_seq: u64,
    last_hash: String,
    blocks: Vec<AuditBlock>,
}

impl Default for AuditState {
    fn default() -> Self {
        Self {
            block_seq: 0,
            last_hash: GENESIS_HASH.to_string(),
            blocks: Vec::new(),
        }
    }
}

/// Thread-safe, append-only chained audit logger.
#[derive(Clone, Default)]
pub struct AuditLogger {
    state: Arc<RwLock<AuditState>>,
    path: Option<PathBuf>,
}

impl AuditLogger {
    /// Fresh chain; nothing is read from `path`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            state: Arc::new(RwLock::new(AuditState::default())),
            path,
        }
    }

    /// Continue the chain stored at `path`, or start a new one if the file is missing.
    pub async fn open(path: Option<PathBuf>) -> Self {
        let logger = Self::new(path);
        if let Some(p) = logger.path.as_deref() {
            let blocks = read_blocks(p).await;
            if let Err(i) = verify_chain(&blocks) {
                warn!("Audit: chain in {} is broken at block {i}", p.display());
            }
            let mut state = logger.state.write().await;
            if let Some(last) = blocks.last() {
                state.block_seq = last.block_seq + 1;
                state.last_hash = last.block_hash.clone();
                info!("Audit: continuing chain at block {}", state.block_seq);
            }
            state.blocks = blocks;
        }
        logger
    }

    /// Append one block. This is the single write path.
    pub async fn append(&self, event_type: AuditEventType, payload: serde_json::Value) {
        let timestamp_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let block = {
            let mut state = self.state.write().await;
            let block = AuditBlock::new(
                state.block_seq,
                timestamp_ms,
                state.last_hash.clone(),
                event_type,
                payload.to_string(),
            );
            state.last_hash = block.block_hash.clone();
            state.block_seq += 1;
            state.blocks.push(block.clone());
            block
        };
        debug!("Audit[{}]: {} {}", block.block_seq, block.event_type, block.block_hash);

        let Some(path) = self.path.as_deref() else {
            return;
        };
        let line = match serde_json::to_string(&block) {
            Ok(l) => format!("{l}\n"),
            Err(e) => {
                warn!("Audit: failed to serialize block: {e}");
                return;
            }
        };
        match OpenOptions::new().create(true).append(true).open(path).await {
            Ok(mut f) => {
                if let Err(e) = f.write_all(line.as_bytes()).await {
                    warn!("Audit: write failed: {e}");
                }
            }
            Err(e) => warn!("Audit: could not open {}: {e}", path.display()),
        }
    }

    pub async fn blocks(&self) -> Vec<AuditBlock> {
        self.state.read().await.blocks.clone()
    }

    pub async fn log_regenerated(&self, report: &RegenerationReport) {
        self.append(
            AuditEventType::Regenerated,
            serde_json::json!({
                "snapshotId": report.snapshot_id,
                "scope": report.scope,
                "scopeWidened": report.scope_widened,
                "processed": report.processed,
                "newAssignments": report.new_assignments,
                "violations": report.violations.len(),
            }),
        )
        .await;
    }

    pub async fn log_rolled_back(&self, reason: &str, rolled_back: bool) {
        self.append(
            AuditEventType::RegenerationRolledBack,
            serde_json::json!({ "reason": reason, "rolledBack": rolled_back }),
        )
        .await;
    }

    pub async fn log_undo(&self, outcome: &UndoOutcome) {
        self.append(
            AuditEventType::UndoApplied,
            serde_json::json!({
                "snapshotId": outcome.snapshot_id,
                "restoredCount": outcome.restored_count,
            }),
        )
        .await;
    }

    pub async fn log_pin(&self, match_id: MatchId, player_id: Option<PlayerId>, pinned: bool) {
        self.append(
            AuditEventType::PinChanged,
            serde_json::json!({ "matchId": match_id, "playerId": player_id, "pinned": pinned }),
        )
        .await;
    }

    pub async fn log_roster(&self, match_id: MatchId, player_ids: &[PlayerId], preserve_pinned: bool) {
        self.append(
            AuditEventType::RosterChanged,
            serde_json::json!({
                "matchId": match_id,
                "playerIds": player_ids,
                "preservePinned": preserve_pinned,
            }),
        )
        .await;
    }

    pub async fn log_played(&self, match_id: MatchId, player_id: Option<PlayerId>, played: bool) {
        self.append(
            AuditEventType::PlayedChanged,
            serde_json::json!({ "matchId": match_id, "playerId": player_id, "played": played }),
        )
        .await;
    }

    pub async fn log_player_added(&self, match_id: MatchId, player_id: PlayerId) {
        self.append(
            AuditEventType::PlayerAdded,
            serde_json::json!({ "matchId": match_id, "playerId": player_id }),
        )
        .await;
    }
}

async fn read_blocks(path: &Path) -> Vec<AuditBlock> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Audit: could not read {}: {e}", path.display());
            }
            return Vec::new();
        }
    };
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| match serde_json::from_str::<AuditBlock>(l) {
            Ok(block) => Some(block),
            Err(e) => {
                warn!("Audit: skipping unreadable line: {e}");
                None
            }
        })
        .collect()
}
