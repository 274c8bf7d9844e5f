use roster_types::UndoOutcome;
use tracing::{error, info};

use crate::error::PlannerError;
use crate::store::PlanStore;

/// Pop the latest snapshot and put its rows back, flags included.
///
/// With an empty stack nothing changes. If the restore write fails the snapshot is
/// pushed back so the undo can be retried.
pub fn undo<S: PlanStore + ?Sized>(store: &mut S) -> Result<UndoOutcome, PlannerError> {
    let Some(snapshot) = store.pop_snapshot()? else {
        info!("Undo requested with an empty snapshot stack");
        return Err(PlannerError::UndoUnavailable);
    };

    let outcome = UndoOutcome {
        restored_count: snapshot.assignments.len(),
        snapshot_id: snapshot.id,
        taken_at: snapshot.taken_at,
    };

    if let Err(source) = store.replace_all(snapshot.assignments.clone()) {
        let rolled_back = store.push_snapshot(snapshot).is_ok();
        error!("Undo failed while restoring rows: {source}");
        return Err(PlannerError::Persistence { source, rolled_back });
    }

    info!(
        "Restored {} assignments from snapshot {} ({})",
        outcome.restored_count, outcome.snapshot_id, outcome.taken_at
    );
    Ok(outcome)
}
