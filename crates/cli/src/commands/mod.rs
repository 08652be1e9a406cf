pub mod apply;
pub mod config;
pub mod doctor;
pub mod history;
pub mod migrate;
pub mod quote;
pub mod seed;

use cloudquote_core::config::{AppConfig, LoadOptions};
use cloudquote_core::{ApplicationError, DomainError};
use cloudquote_db::{
    connect_with_config, migrations, DbPool, RepositoryError, SqlSnapshotRepository,
};
use serde::Serialize;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Raw output for commands that print their own report.
    pub fn report(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

/// `(error_class, message, exit_code)` carried out of an async block.
pub(crate) type StepFailure = (&'static str, String, u8);

impl From<(&str, StepFailure)> for CommandResult {
    fn from((command, (error_class, message, exit_code)): (&str, StepFailure)) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            ApplicationError::Configuration(error.to_string()).to_string(),
            2,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

pub(crate) fn persistence_failure(error: RepositoryError) -> StepFailure {
    ("persistence", ApplicationError::Persistence(error.to_string()).to_string(), 9)
}

pub(crate) fn rejected_update(error: DomainError) -> StepFailure {
    ("update_rejected", ApplicationError::from(error).to_string(), 8)
}

/// Connects, applies pending migrations, and hands back the snapshot store.
pub(crate) async fn open_store(
    config: &AppConfig,
) -> Result<(DbPool, SqlSnapshotRepository), StepFailure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok((pool.clone(), SqlSnapshotRepository::new(pool)))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
