//! Table-driven naming rules for settings.
//!
//! Each managed resource kind maps to exactly one rule; region and identity
//! settings have their own rules. Adding a kind means adding a row here.
use crate::resource::ResourceKind;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

/// Compiled patterns, keyed by their source text.
static COMPILED: LazyLock<Mutex<HashMap<&'static str, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Naming grammar for a single setting.
#[derive(Debug, Clone, Copy)]
pub struct NamingRule {
    pub min_len: usize,
    pub max_len: usize,
    /// Full-match character-class pattern.
    pub pattern: &'static str,
    /// Human description of `pattern` used in error messages.
    pub allowed: &'static str,
    pub no_double_hyphen: bool,
    /// The name becomes part of a public DNS label and must be unique across Azure.
    pub globally_unique: bool,
}

pub const REGION_RULE: NamingRule = NamingRule {
    min_len: 2,
    max_len: 40,
    pattern: r"^[a-z][a-z0-9]*$",
    allowed: "lowercase letters and digits, starting with a letter (e.g. eastus2)",
    no_double_hyphen: false,
    globally_unique: false,
};

pub const GUID_RULE: NamingRule = NamingRule {
    min_len: 36,
    max_len: 36,
    pattern: r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    allowed: "a GUID (xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx)",
    no_double_hyphen: false,
    globally_unique: false,
};

const RESOURCE_GROUP_RULE: NamingRule = NamingRule {
    min_len: 1,
    max_len: 90,
    pattern: r"^[-\w.()]*[-\w()]$",
    allowed: "letters, digits, underscores, hyphens, periods and parentheses, not ending in a period",
    no_double_hyphen: false,
    globally_unique: false,
};

const KEY_VAULT_RULE: NamingRule = NamingRule {
    min_len: 3,
    max_len: 24,
    pattern: r"^[A-Za-z][A-Za-z0-9-]*[A-Za-z0-9]$",
    allowed: "alphanumerics and hyphens, starting with a letter and ending with a letter or digit",
    no_double_hyphen: true,
    globally_unique: true,
};

const AI_SERVICES_RULE: NamingRule = NamingRule {
    min_len: 2,
    max_len: 64,
    pattern: r"^[A-Za-z0-9][A-Za-z0-9-]*[A-Za-z0-9]$",
    allowed: "alphanumerics and hyphens, starting and ending with an alphanumeric",
    no_double_hyphen: false,
    globally_unique: true,
};

const CONTAINER_REGISTRY_RULE: NamingRule = NamingRule {
    min_len: 5,
    max_len: 50,
    pattern: r"^[A-Za-z0-9]+$",
    allowed: "alphanumerics only",
    no_double_hyphen: false,
    globally_unique: true,
};

const STORAGE_ACCOUNT_RULE: NamingRule = NamingRule {
    min_len: 3,
    max_len: 24,
    pattern: r"^[a-z0-9]+$",
    allowed: "lowercase letters and digits only",
    no_double_hyphen: false,
    globally_unique: true,
};

const LOG_WORKSPACE_RULE: NamingRule = NamingRule {
    min_len: 4,
    max_len: 63,
    pattern: r"^[A-Za-z0-9][A-Za-z0-9-]*[A-Za-z0-9]$",
    allowed: "alphanumerics and hyphens, starting and ending with an alphanumeric",
    no_double_hyphen: false,
    globally_unique: false,
};

const APP_INSIGHTS_RULE: NamingRule = NamingRule {
    min_len: 1,
    max_len: 255,
    pattern: r"^[^%&\\?/\x00-\x1f]*[^%&\\?/\x00-\x1f .]$",
    allowed: "any characters except %&\\?/ and control characters, not ending in a space or period",
    no_double_hyphen: false,
    globally_unique: false,
};

const SEARCH_SERVICE_RULE: NamingRule = NamingRule {
    min_len: 2,
    max_len: 60,
    pattern: r"^[a-z0-9][a-z0-9-]*[a-z0-9]$",
    allowed: "lowercase letters, digits and hyphens, starting and ending with a letter or digit",
    no_double_hyphen: true,
    globally_unique: true,
};

/// Return the naming rule for a managed resource kind.
pub fn rule_for(kind: ResourceKind) -> &'static NamingRule {
    match kind {
        ResourceKind::ResourceGroup => &RESOURCE_GROUP_RULE,
        ResourceKind::KeyVault => &KEY_VAULT_RULE,
        ResourceKind::AiServices => &AI_SERVICES_RULE,
        ResourceKind::ContainerRegistry => &CONTAINER_REGISTRY_RULE,
        ResourceKind::StorageAccount => &STORAGE_ACCOUNT_RULE,
        ResourceKind::LogWorkspace => &LOG_WORKSPACE_RULE,
        ResourceKind::AppInsights => &APP_INSIGHTS_RULE,
        ResourceKind::SearchService => &SEARCH_SERVICE_RULE,
    }
}

/// Check `value` against `rule`, returning every violated constraint.
///
/// An empty result means the value conforms.
pub fn check_name(rule: &NamingRule, value: &str) -> Result<Vec<String>> {
    let mut violations = Vec::new();
    let len = value.chars().count();
    if len < rule.min_len || len > rule.max_len {
        violations.push(format!(
            "length {len} outside {}-{} characters",
            rule.min_len, rule.max_len
        ));
    }
    let regex = compiled(rule.pattern)?;
    if !regex.is_match(value) {
        violations.push(format!("allowed characters: {}", rule.allowed));
    }
    if rule.no_double_hyphen && value.contains("--") {
        violations.push("consecutive hyphens are not allowed".to_string());
    }
    Ok(violations)
}

fn compiled(pattern: &'static str) -> Result<Regex> {
    let mut cache = COMPILED
        .lock()
        .map_err(|_| anyhow!("naming pattern cache poisoned"))?;
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }
    let regex =
        Regex::new(pattern).with_context(|| format!("compile naming pattern {pattern}"))?;
    cache.insert(pattern, regex.clone());
    Ok(regex)
}
