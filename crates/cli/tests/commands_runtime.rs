use std::env;
use std::fs;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use cloudquote_cli::commands::quote::{BaasArgs, VpsArgs};
use cloudquote_cli::commands::{apply, history, migrate, quote, seed};
use cloudquote_core::{DeviceType, VpsForm};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("CLOUDQUOTE_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_unsupported_database() {
    with_env(&[("CLOUDQUOTE_DATABASE_URL", "postgres://localhost/cloudquote")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);

    with_env(&[("CLOUDQUOTE_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["command"], "seed");
        let message = first_payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("saved as version 1"), "{message}");
        assert!(message.contains("4 categories, 3 discount tiers, 5 accounts"), "{message}");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let message = parse_payload(&second.output)["message"].as_str().unwrap_or_default().to_string();
        assert!(message.contains("already current at version 1"), "{message}");
    });
}

#[test]
fn quote_without_snapshot_reports_no_snapshot() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);

    with_env(&[("CLOUDQUOTE_DATABASE_URL", url.as_str())], || {
        let result = quote::run_vps(vps_args("1", "1"));
        assert_eq!(result.exit_code, 7);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote vps");
        assert_eq!(payload["error_class"], "no_snapshot");
    });
}

#[test]
fn quote_vps_prices_seeded_snapshot() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);

    with_env(&[("CLOUDQUOTE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let admin = quote::run_vps(vps_args("1", "1"));
        assert_eq!(admin.exit_code, 0, "{}", admin.output);
        let payload = parse_payload(&admin.output);
        assert_eq!(decimal_at(&payload["breakdown"]["total_cost"]), dec("13687.5"));
        assert_eq!(decimal_at(&payload["breakdown"]["final_cost"]), dec("13687.5"));
        assert_eq!(payload["display_final"], "₹13,687.50");

        let sub_reseller = quote::run_vps(vps_args("4", "12"));
        assert_eq!(sub_reseller.exit_code, 0, "{}", sub_reseller.output);
        let payload = parse_payload(&sub_reseller.output);
        assert_eq!(decimal_at(&payload["margin"]["percent"]), dec("170"));
        assert_eq!(decimal_at(&payload["discount"]["percent"]), dec("10"));
    });
}

#[test]
fn quote_for_unknown_user_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);

    with_env(&[("CLOUDQUOTE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let result = quote::run_baas(BaasArgs {
            user: "404".to_string(),
            gigabytes: None,
            device: Some(DeviceType::Server),
            count: Some("2".to_string()),
            json: true,
        });
        assert_eq!(result.exit_code, 8);
        assert_eq!(parse_payload(&result.output)["error_class"], "unknown_user");
    });
}

#[test]
fn apply_appends_version_and_history_lists_it() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    let update_path = dir.path().join("margin.json");
    fs::write(
        &update_path,
        r#"{"op":"set_margin","resellerId":"4","vpsMarginPercent":"15","baasMarginPercent":"5"}"#,
    )
    .expect("write update");

    with_env(&[("CLOUDQUOTE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let applied = apply::run(&update_path);
        assert_eq!(applied.exit_code, 0, "{}", applied.output);
        assert_eq!(
            parse_payload(&applied.output)["message"],
            "set_margin saved as version 2"
        );

        let listed = history::run(10);
        assert_eq!(listed.exit_code, 0);
        let lines = listed.output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("v2 ") && lines[0].ends_with("set_margin"));
        assert!(lines[1].starts_with("v1 ") && lines[1].ends_with("seed"));
    });
}

#[test]
fn apply_rejects_update_for_unknown_reseller() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    let update_path = dir.path().join("margin.json");
    fs::write(
        &update_path,
        r#"{"op":"set_margin","resellerId":"99","vpsMarginPercent":"15","baasMarginPercent":"5"}"#,
    )
    .expect("write update");

    with_env(&[("CLOUDQUOTE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let rejected = apply::run(&update_path);
        assert_eq!(rejected.exit_code, 8);
        assert_eq!(parse_payload(&rejected.output)["error_class"], "update_rejected");

        let listed = history::run(10);
        assert_eq!(listed.output.lines().count(), 1, "rejected update must not be stored");
    });
}

fn vps_args(user: &str, vms: &str) -> VpsArgs {
    VpsArgs {
        user: user.to_string(),
        category: "V3".to_string(),
        form: VpsForm {
            cpu_count: "1".to_string(),
            ram_gb: "4".to_string(),
            storage_gb: "50".to_string(),
            vm_count: vms.to_string(),
            baas_backup_gb: "0".to_string(),
        },
        json: true,
    }
}

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("cloudquote.db").display())
}

fn dec(raw: &str) -> Decimal {
    Decimal::from_str(raw).expect("decimal literal")
}

fn decimal_at(value: &Value) -> Decimal {
    match value {
        Value::String(raw) => dec(raw),
        other => dec(&other.to_string()),
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CLOUDQUOTE_DATABASE_URL",
        "CLOUDQUOTE_DATABASE_MAX_CONNECTIONS",
        "CLOUDQUOTE_DATABASE_TIMEOUT_SECS",
        "CLOUDQUOTE_CALCULATOR_CURRENCY",
        "CLOUDQUOTE_CALCULATOR_APPLY_VOLUME_DISCOUNTS",
        "CLOUDQUOTE_LOGGING_LEVEL",
        "CLOUDQUOTE_LOGGING_FORMAT",
        "CLOUDQUOTE_LOG_LEVEL",
        "CLOUDQUOTE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
