use cloudquote_db::migrations;
use tracing::info;

use crate::commands::{build_runtime, load_config, open_store, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("migrate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let (pool, _) = open_store(&config).await?;
        pool.close().await;
        Ok::<(), StepFailure>(())
    });

    match result {
        Ok(()) => {
            info!(
                event_name = "cli.migrate.completed",
                migrations = migrations::known_migrations(),
                "migrations applied"
            );
            CommandResult::success(
                "migrate",
                format!("applied pending migrations ({} known)", migrations::known_migrations()),
            )
        }
        Err(failure) => CommandResult::from(("migrate", failure)),
    }
}
