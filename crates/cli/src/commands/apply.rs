use std::fs;
use std::path::Path;

use cloudquote_core::SnapshotUpdate;
use cloudquote_db::SnapshotRepository;
use tracing::info;

use crate::commands::{
    build_runtime, load_config, open_store, persistence_failure, rejected_update, CommandResult,
    StepFailure,
};

/// Applies one JSON-encoded `SnapshotUpdate` to the latest snapshot and stores the result as a
/// new version. A rejected update leaves the stored history untouched.
pub fn run(update_path: &Path) -> CommandResult {
    let update = match read_update(update_path) {
        Ok(update) => update,
        Err(failure) => return CommandResult::from(("apply", failure)),
    };
    let config = match load_config("apply") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("apply") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let label = update.name();
    let result = runtime.block_on(async {
        let (pool, repo) = open_store(&config).await?;
        let outcome = async {
            let latest = repo
                .load_latest()
                .await
                .map_err(persistence_failure)?
                .ok_or_else(|| {
                    (
                        "no_snapshot",
                        "no pricing snapshot stored; run `cloudquote seed` first".to_string(),
                        7u8,
                    )
                })?;

            let next = latest.snapshot.apply(update).map_err(rejected_update)?;

            repo.save(&next, label).await.map_err(persistence_failure)
        }
        .await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(stored) => {
            info!(event_name = "cli.apply.saved", version = stored.version, label, "update applied");
            CommandResult::success("apply", format!("{label} saved as version {}", stored.version))
        }
        Err(failure) => CommandResult::from(("apply", failure)),
    }
}

fn read_update(path: &Path) -> Result<SnapshotUpdate, StepFailure> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ("update_read", format!("could not read `{}`: {error}", path.display()), 2u8)
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        ("update_parse", format!("`{}` is not a valid update: {error}", path.display()), 2u8)
    })
}
