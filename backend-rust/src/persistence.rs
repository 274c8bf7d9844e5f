use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::state::{PlanState, SeasonSeed};

/// Load persisted plan state from disk. Returns an empty state if the file is missing or corrupt.
pub async fn load_state(path: &Path) -> PlanState {
    if !path.exists() {
        info!("No {} found, starting with an empty plan", path.display());
        return PlanState::default();
    }

    match fs::read_to_string(path).await {
        Ok(data) => match serde_json::from_str::<PlanState>(&data) {
            Ok(state) => {
                info!(
                    "Loaded plan from disk ({} players, {} matches, {} assignments, {} snapshots)",
                    state.players.len(),
                    state.matches.len(),
                    state.assignments.len(),
                    state.snapshots.len()
                );
                state
            }
            Err(e) => {
                warn!("Failed to parse {}: {e}, starting with an empty plan", path.display());
                PlanState::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {e}, starting with an empty plan", path.display());
            PlanState::default()
        }
    }
}

/// Write the whole plan state. Goes through a temp file so a crash never leaves half a file.
pub async fn save_state(path: &Path, state: &PlanState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Read a directory/calendar seed file for `import`.
pub async fn load_seed(path: &Path) -> Result<SeasonSeed> {
    let data = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading seed {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing seed {}", path.display()))
}
