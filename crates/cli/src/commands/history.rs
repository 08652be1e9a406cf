use cloudquote_db::SnapshotRepository;

use crate::commands::{build_runtime, load_config, open_store, persistence_failure, CommandResult};

pub fn run(limit: u32) -> CommandResult {
    let config = match load_config("history") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("history") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let (pool, repo) = open_store(&config).await?;
        let history =
            repo.history(limit).await.map_err(persistence_failure);
        pool.close().await;
        history
    });

    match result {
        Ok(history) if history.is_empty() => {
            CommandResult::report("no pricing snapshots stored")
        }
        Ok(history) => CommandResult::report(
            history
                .iter()
                .map(|entry| {
                    format!("v{} {} {}", entry.version, entry.saved_at.to_rfc3339(), entry.label)
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Err(failure) => CommandResult::from(("history", failure)),
    }
}
