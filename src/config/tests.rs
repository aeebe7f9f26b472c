use super::*;
use super::source::read_env_file;
use std::fs;

fn valid_settings() -> Settings {
    [
        ("LOCATION", "eastus2"),
        ("RESOURCE_GROUP", "rg-foundry-dev"),
        ("KEYVAULT_NAME", "kv-foundry-dev"),
        ("AI_SERVICES_NAME", "ai-foundry-dev"),
        ("CONTAINER_REGISTRY_NAME", "acrfoundrydev"),
        ("STORAGE_ACCOUNT_NAME", "stfoundrydev"),
        ("LOG_WORKSPACE_NAME", "log-foundry-dev"),
        ("APPLICATION_INSIGHTS_NAME", "appi-foundry-dev"),
    ]
    .into_iter()
    .collect()
}

fn issues_of(settings: &Settings) -> Vec<ConfigIssue> {
    let err = load_config(settings).expect_err("config should be rejected");
    config_error(&err).expect("config error").issues.clone()
}

#[test]
fn loads_valid_settings() {
    let config = load_config(&valid_settings()).expect("load config");
    assert_eq!(config.location, "eastus2");
    assert_eq!(config.resource_group, "rg-foundry-dev");
    assert_eq!(config.name(ResourceKind::KeyVault), Some("kv-foundry-dev"));
    assert_eq!(config.names.len(), 7);
    assert!(!config.has_search());
    assert_eq!(config.principal_object_id, None);
}

#[test]
fn region_is_normalized() {
    let mut settings = valid_settings();
    settings.insert("LOCATION", "East US 2");
    let config = load_config(&settings).expect("load config");
    assert_eq!(config.location, "eastus2");
}

#[test]
fn optional_search_name_is_validated_when_present() {
    let mut settings = valid_settings();
    settings.insert("COGNITIVE_SEARCH_NAME", "srch-foundry-dev");
    let config = load_config(&settings).expect("load config");
    assert!(config.has_search());

    settings.insert("COGNITIVE_SEARCH_NAME", "Search--Bad");
    let issues = issues_of(&settings);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].key(), "COGNITIVE_SEARCH_NAME");
}

#[test]
fn reports_every_missing_setting_together() {
    let settings: Settings = valid_settings();
    let mut settings_without = Settings::default();
    for key in known_keys() {
        if key == "LOCATION" || key == "STORAGE_ACCOUNT_NAME" {
            continue;
        }
        if let Some(value) = settings.get(key) {
            settings_without.insert(key, value);
        }
    }
    let issues = issues_of(&settings_without);
    assert_eq!(
        issues,
        vec![
            ConfigIssue::MissingSetting {
                key: "LOCATION".to_string()
            },
            ConfigIssue::MissingSetting {
                key: "STORAGE_ACCOUNT_NAME".to_string()
            },
        ]
    );
}

#[test]
fn whitespace_only_value_counts_as_missing() {
    let mut settings = valid_settings();
    settings.insert("KEYVAULT_NAME", "   ");
    let issues = issues_of(&settings);
    assert_eq!(
        issues,
        vec![ConfigIssue::MissingSetting {
            key: "KEYVAULT_NAME".to_string()
        }]
    );
}

#[test]
fn short_vault_name_only_flags_that_key() {
    let mut settings = valid_settings();
    settings.insert("KEYVAULT_NAME", "ab");
    let issues = issues_of(&settings);
    assert_eq!(issues.len(), 1);
    match &issues[0] {
        ConfigIssue::InvalidName { key, value, reason } => {
            assert_eq!(key, "KEYVAULT_NAME");
            assert_eq!(value, "ab");
            assert!(reason.contains("3-24"), "reason: {reason}");
        }
        other => panic!("unexpected issue {other:?}"),
    }
}

#[test]
fn principal_override_must_be_a_guid() {
    let mut settings = valid_settings();
    settings.insert("PRINCIPAL_OBJECT_ID", "not-a-guid");
    assert_eq!(issues_of(&settings)[0].key(), "PRINCIPAL_OBJECT_ID");

    settings.insert(
        "PRINCIPAL_OBJECT_ID",
        "0A1B2C3D-0000-4000-8000-00000000ABCD",
    );
    let config = load_config(&settings).expect("load config");
    assert_eq!(
        config.principal_object_id.as_deref(),
        Some("0a1b2c3d-0000-4000-8000-00000000abcd")
    );
}

#[test]
fn config_error_lists_each_issue_on_its_own_line() {
    let err = ConfigError {
        issues: vec![
            ConfigIssue::MissingSetting {
                key: "LOCATION".to_string(),
            },
            ConfigIssue::InvalidName {
                key: "KEYVAULT_NAME".to_string(),
                value: "ab".to_string(),
                reason: "too short".to_string(),
            },
        ],
    };
    let text = err.to_string();
    assert!(text.starts_with("invalid configuration (2 issues)"));
    assert!(text.contains("\n  - LOCATION: missing required setting"));
    assert!(text.contains("\n  - KEYVAULT_NAME: invalid value \"ab\" (too short)"));
}

fn env_file(dir: &tempfile::TempDir, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(".env");
    fs::write(&path, text).expect("write env file");
    path
}

#[test]
fn reads_dotenv_syntax() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = env_file(
        &temp,
        "\
# comment
LOCATION=eastus2
export RESOURCE_GROUP=rg-foundry
KEYVAULT_NAME=\"kv-foundry\"
AI_SERVICES_NAME='ai # not a comment'

",
    );
    let pairs = read_env_file(&path).expect("read");
    assert_eq!(
        pairs,
        vec![
            ("LOCATION".to_string(), "eastus2".to_string()),
            ("RESOURCE_GROUP".to_string(), "rg-foundry".to_string()),
            ("KEYVAULT_NAME".to_string(), "kv-foundry".to_string()),
            ("AI_SERVICES_NAME".to_string(), "ai # not a comment".to_string()),
        ]
    );
}

#[test]
fn env_file_values_interpolate_earlier_keys() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = env_file(
        &temp,
        "AI_SERVICES_NAME=ai-foundry\nRESOURCE_GROUP=rg-${AI_SERVICES_NAME}\n",
    );
    let settings = collect_settings(None, Some(&path), true, |_| None).expect("collect");
    assert_eq!(settings.get("AI_SERVICES_NAME"), Some("ai-foundry"));
    assert_eq!(settings.get("RESOURCE_GROUP"), Some("rg-ai-foundry"));
}

#[test]
fn malformed_env_file_names_the_path() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = env_file(&temp, "LOCATION=eastus\nnot a pair\n");
    let err = collect_settings(None, Some(&path), true, |_| None).expect_err("reject");
    let text = format!("{err:#}");
    assert!(text.contains(&path.display().to_string()), "{text}");
}

#[test]
fn env_file_overrides_process_env_which_overrides_user_file() {
    let temp = tempfile::tempdir().expect("temp dir");
    let user_file = temp.path().join("foundry.env");
    fs::write(&user_file, "LOCATION=westus\nRESOURCE_GROUP=rg-user\nKEYVAULT_NAME=kv-user\n")
        .expect("write user file");
    let env_file = temp.path().join(".env");
    fs::write(&env_file, "KEYVAULT_NAME=kv-env-file\n").expect("write env file");

    let settings = collect_settings(Some(&user_file), Some(&env_file), true, |key| {
        match key {
            "RESOURCE_GROUP" | "KEYVAULT_NAME" => Some("from-process".to_string()),
            _ => None,
        }
    })
    .expect("collect settings");

    assert_eq!(settings.get("LOCATION"), Some("westus"));
    assert_eq!(settings.get("RESOURCE_GROUP"), Some("from-process"));
    assert_eq!(settings.get("KEYVAULT_NAME"), Some("kv-env-file"));
}

#[test]
fn missing_env_file_is_only_an_error_when_required() {
    let temp = tempfile::tempdir().expect("temp dir");
    let missing = temp.path().join("absent.env");
    let settings = collect_settings(None, Some(&missing), false, |_| None).expect("optional");
    assert_eq!(settings, Settings::default());
    let err = collect_settings(None, Some(&missing), true, |_| None).expect_err("required");
    assert!(err.to_string().contains("not found"));
}
