use roster_types::{MatchId, PlayerId};
use tempfile::tempdir;

use crate::audit::{verify_chain, AuditBlock, AuditEventType, AuditLogger, GENESIS_HASH};

#[tokio::test]
async fn chain_links_blocks_in_memory() {
    let audit = AuditLogger::new(None);
    audit.log_pin(MatchId(1), Some(PlayerId(2)), true).await;
    audit.log_played(MatchId(1), None, true).await;

    let blocks = audit.blocks().await;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].prev_hash, GENESIS_HASH);
    assert_eq!(blocks[1].prev_hash, blocks[0].block_hash);
    assert_eq!(blocks[1].block_seq, 1);
    assert!(blocks.iter().all(AuditBlock::verify));
    assert_eq!(verify_chain(&blocks), Ok(()));
}

#[tokio::test]
async fn reopened_log_continues_the_chain() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");

    let first = AuditLogger::open(Some(path.clone())).await;
    first.log_player_added(MatchId(3), PlayerId(7)).await;
    first.log_pin(MatchId(3), Some(PlayerId(7)), false).await;

    let second = AuditLogger::open(Some(path.clone())).await;
    second.log_roster(MatchId(3), &[PlayerId(1), PlayerId(2)], true).await;

    let raw = tokio::fs::read_to_string(&path).await.unwrap();
    let blocks: Vec<AuditBlock> = raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[2].block_seq, 2);
    assert_eq!(blocks[2].event_type, AuditEventType::RosterChanged);
    assert_eq!(verify_chain(&blocks), Ok(()));
}

#[tokio::test]
async fn tampering_is_detected() {
    let audit = AuditLogger::new(None);
    for pinned in [true, false, true] {
        audit.log_pin(MatchId(1), None, pinned).await;
    }
    let mut blocks = audit.blocks().await;

    blocks[1].payload_json = r#"{"matchId":1,"playerId":null,"pinned":true}"#.to_string();
    assert_eq!(verify_chain(&blocks), Err(1));

    let mut dropped = audit.blocks().await;
    dropped.remove(1);
    assert_eq!(verify_chain(&dropped), Err(1));
}
