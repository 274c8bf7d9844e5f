use std::sync::Arc;
use std::time::Duration;

use roster_types::{MatchId, PlayerId, Scope, ROSTER_SIZE};

use crate::audit::{verify_chain, AuditEventType};
use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::planner::{Planner, RegenerateRequest};
use crate::regeneration::CancelHandle;
use crate::store::{AssignmentStore, MemoryStore};
use crate::tests::support::{assert_no_double_booking, day, iso, planner, roster_ids, season};

#[tokio::test]
async fn undo_on_empty_stack_changes_nothing() {
    let planner = planner(season(8, 4));
    planner.set_roster(MatchId(1), &[PlayerId(1), PlayerId(2)], true).await.unwrap();
    let before = planner.with_store(MemoryStore::to_state).await;

    let err = planner.undo().await.unwrap_err();

    assert!(matches!(err, PlannerError::UndoUnavailable));
    assert_eq!(planner.with_store(MemoryStore::to_state).await, before);
}

#[tokio::test]
async fn undo_restores_each_run_in_reverse() {
    let planner = planner(season(8, 6));
    planner.pin(MatchId(1), PlayerId(1), true).await.unwrap();
    let initial = planner.with_store(|s| s.list_assignments().unwrap()).await;

    planner.regenerate(RegenerateRequest::default()).await.unwrap();
    planner.pin(MatchId(2), roster_ids_of(&planner, 2).await[0], true).await.unwrap();
    let after_first = planner.with_store(|s| s.list_assignments().unwrap()).await;
    planner.regenerate(RegenerateRequest::default()).await.unwrap();
    let history = planner.snapshots().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].assignments, after_first);
    assert_eq!(history[1].assignments, initial);

    let outcome = planner.undo().await.unwrap();
    assert_eq!(outcome.restored_count, after_first.len());
    assert_eq!(planner.with_store(|s| s.list_assignments().unwrap()).await, after_first);

    planner.undo().await.unwrap();
    assert_eq!(planner.with_store(|s| s.list_assignments().unwrap()).await, initial);
    assert!(matches!(planner.undo().await, Err(PlannerError::UndoUnavailable)));
}

async fn roster_ids_of(planner: &Planner, match_id: i64) -> Vec<PlayerId> {
    planner.with_store(|s| roster_ids(s, match_id)).await
}

#[tokio::test]
async fn pin_then_regenerate_keeps_the_row() {
    let planner = planner(season(8, 6));
    planner.regenerate(RegenerateRequest::default()).await.unwrap();
    let p = roster_ids_of(&planner, 4).await[2];

    assert!(planner.pin(MatchId(4), p, true).await.unwrap());
    for _ in 0..3 {
        planner.regenerate(RegenerateRequest::default()).await.unwrap();
        let roster = planner.roster(MatchId(4)).await.unwrap();
        let row = roster.iter().find(|e| e.player_id == p).unwrap();
        assert!(row.pinned);
        assert_eq!(roster.len(), ROSTER_SIZE);
    }
}

#[tokio::test]
async fn initial_plan_resets_pins() {
    let planner = planner(season(8, 4));
    planner.regenerate(RegenerateRequest::default()).await.unwrap();
    planner.pin_match(MatchId(3), true).await.unwrap();

    let report = planner.generate_initial_plan().await.unwrap();

    assert_eq!(report.processed, 4);
    let plan = planner.plan().await.unwrap();
    assert!(plan.iter().flat_map(|m| &m.roster).all(|e| !e.pinned));
}

#[tokio::test]
async fn concurrent_regenerations_are_serialized() {
    let planner = Arc::new(planner(season(9, 8)));

    let (a, b) = tokio::join!(
        planner.regenerate(RegenerateRequest::default()),
        planner.regenerate(RegenerateRequest::from_date(iso(day(21)))),
    );

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(planner.snapshot_count().await.unwrap(), 2);
    planner.with_store(|s| assert_no_double_booking(s)).await;
    for m in 1..=8 {
        assert_eq!(roster_ids_of(&planner, m).await.len(), ROSTER_SIZE);
    }
}

#[tokio::test]
async fn cancel_stays_with_its_own_run() {
    let planner = planner(season(8, 4));
    let cancel = CancelHandle::default();
    cancel.cancel();

    // The second run queues on the write lock behind the cancelled one.
    let (first, second) = tokio::join!(
        planner.regenerate_cancellable(RegenerateRequest::default(), cancel.clone()),
        planner.regenerate(RegenerateRequest::default()),
    );

    assert!(matches!(first, Err(PlannerError::Aborted { rolled_back: true, .. })));
    let report = second.unwrap();
    assert_eq!(report.processed, 4);
    assert_eq!(planner.snapshot_count().await.unwrap(), 1);
    assert!(cancel.is_cancelled());

    let again = planner.regenerate_cancellable(RegenerateRequest::default(), cancel).await;
    assert!(matches!(again, Err(PlannerError::Aborted { .. })));
    assert_eq!(planner.snapshot_count().await.unwrap(), 1);
}

#[tokio::test]
async fn zero_deadline_aborts() {
    let planner = planner(season(8, 4));
    let request = RegenerateRequest {
        deadline: Some(Duration::ZERO),
        ..RegenerateRequest::default()
    };

    let err = planner.regenerate(request).await.unwrap_err();

    assert!(matches!(err, PlannerError::Aborted { rolled_back: true, .. }));
    assert!(planner.with_store(|s| s.list_assignments().unwrap()).await.is_empty());
}

#[tokio::test]
async fn bad_cutoff_widens_or_fails() {
    let lenient = planner(season(8, 4));
    let report = lenient.regenerate(RegenerateRequest::until("next week")).await.unwrap();
    assert!(report.scope_widened);
    assert_eq!(report.scope, Scope::ALL);
    assert_eq!(report.processed, 4);

    let strict = Planner::new(
        season(8, 4),
        PlannerConfig {
            strict_cutoff: true,
            rng_seed: Some(1),
            ..PlannerConfig::default()
        },
    );
    let err = strict.regenerate(RegenerateRequest::until("next week")).await.unwrap_err();
    assert!(matches!(err, PlannerError::InvalidCutoff(_)));
    assert_eq!(strict.snapshot_count().await.unwrap(), 0);
}

#[tokio::test]
async fn match_played_leaves_scope() {
    let planner = planner(season(8, 4));
    planner.regenerate(RegenerateRequest::default()).await.unwrap();
    let first = roster_ids_of(&planner, 1).await;
    planner.set_match_played(MatchId(1), true).await.unwrap();
    planner.set_actually_played(MatchId(1), first[0], true).await.unwrap();

    let report = planner.regenerate(RegenerateRequest::default()).await.unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(roster_ids_of(&planner, 1).await, first);
    let load = planner.player_load(first[0]).await.unwrap();
    assert_eq!(load.actually_played, 1);
    assert_eq!(load.completed_matches, 1);
}

#[tokio::test]
async fn mutations_land_in_the_audit_chain() {
    let planner = planner(season(8, 4));
    planner.regenerate(RegenerateRequest::default()).await.unwrap();
    let p = roster_ids_of(&planner, 1).await[0];
    planner.pin(MatchId(1), p, true).await.unwrap();
    planner.add_player_to_match(MatchId(1), PlayerId(99)).await.unwrap();
    planner.undo().await.unwrap();
    // Misses are not logged.
    planner.pin(MatchId(1), PlayerId(42), true).await.unwrap();

    let blocks = planner.audit().blocks().await;
    let kinds: Vec<AuditEventType> = blocks.iter().map(|b| b.event_type).collect();
    assert_eq!(
        kinds,
        vec![
            AuditEventType::Regenerated,
            AuditEventType::PinChanged,
            AuditEventType::PlayerAdded,
            AuditEventType::UndoApplied,
        ]
    );
    assert_eq!(verify_chain(&blocks), Ok(()));
}
