use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cloudquote_core::config::AppConfig;
use toml::Value;

use crate::commands::{load_config, CommandResult};

struct ConfigField {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    CommandResult::report(render(&config, detect_config_path().as_deref()))
}

fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);

    let fields = [
        ConfigField {
            key_path: "database.url",
            env_keys: &["CLOUDQUOTE_DATABASE_URL"],
            value: config.database.url.clone(),
        },
        ConfigField {
            key_path: "database.max_connections",
            env_keys: &["CLOUDQUOTE_DATABASE_MAX_CONNECTIONS"],
            value: config.database.max_connections.to_string(),
        },
        ConfigField {
            key_path: "database.timeout_secs",
            env_keys: &["CLOUDQUOTE_DATABASE_TIMEOUT_SECS"],
            value: config.database.timeout_secs.to_string(),
        },
        ConfigField {
            key_path: "calculator.currency",
            env_keys: &["CLOUDQUOTE_CALCULATOR_CURRENCY"],
            value: config.calculator.currency.to_string(),
        },
        ConfigField {
            key_path: "calculator.apply_volume_discounts",
            env_keys: &["CLOUDQUOTE_CALCULATOR_APPLY_VOLUME_DISCOUNTS"],
            value: config.calculator.apply_volume_discounts.to_string(),
        },
        ConfigField {
            key_path: "logging.level",
            env_keys: &["CLOUDQUOTE_LOGGING_LEVEL", "CLOUDQUOTE_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        ConfigField {
            key_path: "logging.format",
            env_keys: &["CLOUDQUOTE_LOGGING_FORMAT", "CLOUDQUOTE_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| {
        let source =
            field_source(field.key_path, field.env_keys, config_file_doc.as_ref(), config_file_path);
        format!("- {} = {} (source: {source})", field.key_path, field.value)
    }));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("cloudquote.toml"), PathBuf::from("config/cloudquote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, field_source};

    #[test]
    fn nested_keys_are_found_in_file_document() {
        let doc: Value = "[calculator]\ncurrency = \"USD\"\n".parse().expect("valid toml");
        assert!(contains_path(&doc, "calculator.currency"));
        assert!(!contains_path(&doc, "calculator.apply_volume_discounts"));
        assert!(!contains_path(&doc, "database.url"));
    }

    #[test]
    fn unset_keys_report_default_source() {
        let doc: Value = "[logging]\nlevel = \"warn\"\n".parse().expect("valid toml");
        assert_eq!(
            field_source("database.url", &["CLOUDQUOTE_TEST_NEVER_SET"], Some(&doc), None),
            "default"
        );
        assert_eq!(
            field_source("logging.level", &["CLOUDQUOTE_TEST_NEVER_SET"], Some(&doc), None),
            "file (config file)"
        );
    }
}
