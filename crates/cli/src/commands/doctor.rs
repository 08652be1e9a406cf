use cloudquote_core::config::{AppConfig, LoadOptions};
use cloudquote_core::{consistency_report, ConfigDiagnostic};
use cloudquote_db::{SnapshotRepository, StoredSnapshot};
use serde::Serialize;
use tracing::warn;

use crate::commands::{build_runtime, open_store, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
    diagnostics: Vec<ConfigDiagnostic>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();
    let mut diagnostics = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match load_latest_snapshot(&config) {
                Ok(latest) => {
                    checks.push(DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Pass,
                        details: format!("connected using `{}`", config.database.url),
                    });
                    checks.extend(snapshot_checks(latest.as_ref(), &mut diagnostics));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: error,
                    });
                    checks.push(DoctorCheck::skipped("snapshot_present", "database is unreachable"));
                    checks.push(DoctorCheck::skipped(
                        "snapshot_consistency",
                        "database is unreachable",
                    ));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["database_connectivity", "snapshot_present", "snapshot_consistency"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks, diagnostics }
}

fn load_latest_snapshot(config: &AppConfig) -> Result<Option<StoredSnapshot>, String> {
    let runtime = build_runtime("doctor").map_err(|failure| failure.output)?;

    runtime.block_on(async {
        let (pool, repo) = open_store(config)
            .await
            .map_err(|(_, message, _)| format!("failed to open database: {message}"))?;
        let latest = repo
            .load_latest()
            .await
            .map_err(|error| format!("failed to read latest snapshot: {error}"));
        pool.close().await;
        latest
    })
}

fn snapshot_checks(
    latest: Option<&StoredSnapshot>,
    diagnostics: &mut Vec<ConfigDiagnostic>,
) -> Vec<DoctorCheck> {
    let Some(latest) = latest else {
        return vec![
            DoctorCheck {
                name: "snapshot_present",
                status: CheckStatus::Fail,
                details: "no pricing snapshot stored; run `cloudquote seed`".to_string(),
            },
            DoctorCheck::skipped("snapshot_consistency", "no snapshot is stored"),
        ];
    };

    let found = consistency_report(&latest.snapshot);
    for diagnostic in &found {
        warn!(
            event_name = "cli.doctor.diagnostic",
            code = diagnostic.code(),
            version = latest.version,
            "{diagnostic}"
        );
    }

    let consistency = if found.is_empty() {
        DoctorCheck {
            name: "snapshot_consistency",
            status: CheckStatus::Pass,
            details: "no configuration inconsistencies found".to_string(),
        }
    } else {
        DoctorCheck {
            name: "snapshot_consistency",
            status: CheckStatus::Fail,
            details: found.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
        }
    };
    diagnostics.extend(found);

    vec![
        DoctorCheck {
            name: "snapshot_present",
            status: CheckStatus::Pass,
            details: format!(
                "version {} ({}) saved at {}",
                latest.version,
                latest.label,
                latest.saved_at.to_rfc3339()
            ),
        },
        consistency,
    ]
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
