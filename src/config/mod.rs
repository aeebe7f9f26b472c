//! Deployment configuration: settings in, validated `DeploymentConfig` out.
//!
//! Validation is batch-oriented. Every missing or malformed setting is
//! collected into one `ConfigError` so a single run surfaces all problems.
mod naming;
mod source;

use naming::check_name;
pub use naming::rule_for;
pub use source::{collect_settings, default_user_settings_path, Settings};

use crate::resource::ResourceKind;
use crate::util::normalize_region;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingCheck {
    Region,
    Name(ResourceKind),
    Guid,
}

#[derive(Debug, Clone, Copy)]
struct SettingSpec {
    key: &'static str,
    required: bool,
    check: SettingCheck,
}

pub const LOCATION: &str = "LOCATION";
pub const SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const TENANT_ID: &str = "AZURE_TENANT_ID";
pub const PRINCIPAL_OBJECT_ID: &str = "PRINCIPAL_OBJECT_ID";

const LOCATION_SETTING: SettingSpec = SettingSpec {
    key: LOCATION,
    required: true,
    check: SettingCheck::Region,
};

const IDENTITY_SETTINGS: [SettingSpec; 3] = [
    SettingSpec {
        key: SUBSCRIPTION_ID,
        required: false,
        check: SettingCheck::Guid,
    },
    SettingSpec {
        key: TENANT_ID,
        required: false,
        check: SettingCheck::Guid,
    },
    SettingSpec {
        key: PRINCIPAL_OBJECT_ID,
        required: false,
        check: SettingCheck::Guid,
    },
];

/// Location first, then one name per resource kind, then identity overrides.
fn setting_specs() -> impl Iterator<Item = SettingSpec> {
    let names = ResourceKind::ALL.into_iter().map(|kind| SettingSpec {
        key: kind.setting(),
        required: !kind.spec().optional,
        check: SettingCheck::Name(kind),
    });
    std::iter::once(LOCATION_SETTING)
        .chain(names)
        .chain(IDENTITY_SETTINGS)
}

/// Every key the loader reads, in declaration order.
pub fn known_keys() -> impl Iterator<Item = &'static str> {
    setting_specs().map(|spec| spec.key)
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentConfig {
    pub location: String,
    pub resource_group: String,
    /// One name per configured kind; the resource group is included.
    pub names: BTreeMap<ResourceKind, String>,
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    pub principal_object_id: Option<String>,
}

impl DeploymentConfig {
    pub fn name(&self, kind: ResourceKind) -> Option<&str> {
        self.names.get(&kind).map(String::as_str)
    }

    pub fn has_search(&self) -> bool {
        self.names.contains_key(&ResourceKind::SearchService)
    }
}

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ConfigIssue {
    MissingSetting {
        key: String,
    },
    InvalidName {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigIssue {
    pub fn key(&self) -> &str {
        match self {
            ConfigIssue::MissingSetting { key } => key,
            ConfigIssue::InvalidName { key, .. } => key,
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.key())?;
        match self {
            ConfigIssue::MissingSetting { .. } => f.write_str("missing required setting"),
            ConfigIssue::InvalidName { value, reason, .. } => {
                write!(f, "invalid value {value:?} ({reason})")
            }
        }
    }
}

/// All configuration problems found in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.issues.len();
        let noun = if count == 1 { "issue" } else { "issues" };
        write!(f, "invalid configuration ({count} {noun})")?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

/// Build a `DeploymentConfig` from settings, reporting every issue at once.
///
/// Returns an `anyhow::Error` wrapping [`ConfigError`] when any setting is
/// missing or violates its naming rule.
pub fn load_config(settings: &Settings) -> Result<DeploymentConfig> {
    let mut issues = Vec::new();
    let mut values: BTreeMap<&'static str, String> = BTreeMap::new();

    for spec in setting_specs() {
        let Some(raw) = settings.get(spec.key).map(str::trim).filter(|v| !v.is_empty()) else {
            if spec.required {
                issues.push(ConfigIssue::MissingSetting {
                    key: spec.key.to_string(),
                });
            }
            continue;
        };
        let (value, rule) = match spec.check {
            SettingCheck::Region => (normalize_region(raw), &naming::REGION_RULE),
            SettingCheck::Name(kind) => (raw.to_string(), rule_for(kind)),
            SettingCheck::Guid => (raw.to_ascii_lowercase(), &naming::GUID_RULE),
        };
        let violations = check_name(rule, &value)?;
        if violations.is_empty() {
            values.insert(spec.key, value);
        } else {
            issues.push(ConfigIssue::InvalidName {
                key: spec.key.to_string(),
                value: raw.to_string(),
                reason: violations.join("; "),
            });
        }
    }

    if !issues.is_empty() {
        return Err(ConfigError { issues }.into());
    }

    let names: BTreeMap<ResourceKind, String> = ResourceKind::ALL
        .into_iter()
        .filter_map(|kind| Some((kind, values.get(kind.setting())?.clone())))
        .collect();
    let resource_group = names
        .get(&ResourceKind::ResourceGroup)
        .cloned()
        .unwrap_or_default();

    Ok(DeploymentConfig {
        location: values.remove(LOCATION).unwrap_or_default(),
        resource_group,
        names,
        subscription_id: values.remove(SUBSCRIPTION_ID),
        tenant_id: values.remove(TENANT_ID),
        principal_object_id: values.remove(PRINCIPAL_OBJECT_ID),
    })
}

/// Extract the batch of issues when `err` carries a [`ConfigError`].
pub fn config_error(err: &anyhow::Error) -> Option<&ConfigError> {
    err.chain().find_map(|cause| cause.downcast_ref::<ConfigError>())
}

#[cfg(test)]
mod tests;
