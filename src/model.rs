//! Outcome, report, and validation types shared by every command.
//!
//! These are the persisted artifact shapes; field names are part of the JSON
//! contract of `foundry_deployment_summary.json` and
//! `foundry_validation_report.json`.
use crate::plan::DeploymentPlan;
use crate::provider::{ProviderError, ProvisioningErrorKind};
use crate::resource::ResourceKind;
use crate::util::truncate_string;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Provider messages can embed whole request payloads; keep reports readable.
const MAX_ERROR_MESSAGE_BYTES: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Created,
    AlreadyExists,
    ConfigurationMismatch,
    Failed,
}

impl OutcomeStatus {
    /// Dependents may proceed only on these two states.
    pub fn is_available(self) -> bool {
        matches!(self, OutcomeStatus::Created | OutcomeStatus::AlreadyExists)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub kind: ProvisioningErrorKind,
    pub message: String,
}

impl OutcomeError {
    pub fn new(kind: ProvisioningErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_provider(err: &ProviderError) -> Self {
        Self::new(
            err.kind(),
            truncate_string(&err.to_string(), MAX_ERROR_MESSAGE_BYTES),
        )
    }
}

/// One field where an existing resource differs from the desired config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub field: String,
    pub desired: String,
    pub observed: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningOutcome {
    pub kind: ResourceKind,
    pub name: String,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub identifiers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<Mismatch>,
}

impl ProvisioningOutcome {
    pub fn new(kind: ResourceKind, name: &str, status: OutcomeStatus) -> Self {
        Self {
            kind,
            name: name.to_string(),
            status,
            identifiers: BTreeMap::new(),
            error: None,
            mismatches: Vec::new(),
        }
    }

    pub fn failed(kind: ResourceKind, name: &str, error: OutcomeError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(kind, name, OutcomeStatus::Failed)
        }
    }

    pub fn identifier(&self, key: &str) -> Option<&str> {
        self.identifiers.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretStatus {
    Published,
    /// The vault already held the same value; nothing was written.
    Unchanged,
    Failed,
}

/// Result of publishing one secret. Never carries the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretOutcome {
    pub name: String,
    pub source: ResourceKind,
    pub status: SecretStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleStatus {
    Assigned,
    AlreadyAssigned,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOutcome {
    pub role_name: String,
    pub role_definition_id: String,
    pub principal_id: String,
    pub scope: String,
    pub status: RoleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

/// Everything one provisioning run attempted, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub schema_version: u32,
    pub started_at_epoch_ms: u128,
    pub finished_at_epoch_ms: u128,
    pub dry_run: bool,
    pub cancelled: bool,
    pub location: String,
    pub resource_group: String,
    pub names: BTreeMap<ResourceKind, String>,
    pub resources: Vec<ProvisioningOutcome>,
    pub secrets: Vec<SecretOutcome>,
    pub roles: Vec<RoleOutcome>,
    pub warnings: Vec<String>,
    pub success: bool,
}

impl DeploymentReport {
    /// An empty report for `plan`, before any entity is ensured.
    pub fn begin(plan: &DeploymentPlan, started_at_epoch_ms: u128) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            started_at_epoch_ms,
            finished_at_epoch_ms: started_at_epoch_ms,
            dry_run: false,
            cancelled: false,
            location: plan.location.clone(),
            resource_group: plan.resource_group.clone(),
            names: plan
                .resources
                .iter()
                .map(|desc| (desc.kind, desc.name.clone()))
                .collect(),
            resources: Vec::new(),
            secrets: Vec::new(),
            roles: Vec::new(),
            warnings: Vec::new(),
            success: false,
        }
    }

    /// The report a dry run persists: planned names, no outcomes.
    pub fn planned(plan: &DeploymentPlan, at_epoch_ms: u128) -> Self {
        Self {
            dry_run: true,
            success: true,
            ..Self::begin(plan, at_epoch_ms)
        }
    }

    pub fn outcome(&self, kind: ResourceKind) -> Option<&ProvisioningOutcome> {
        self.resources.iter().find(|outcome| outcome.kind == kind)
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.resources
            .iter()
            .filter(|outcome| outcome.status == status)
            .count()
    }

    /// Every entity reached its desired state and the run was not cut short.
    pub fn compute_success(&self) -> bool {
        !self.cancelled
            && self
                .resources
                .iter()
                .all(|outcome| outcome.status.is_available())
            && self
                .secrets
                .iter()
                .all(|secret| secret.status != SecretStatus::Failed)
            && self
                .roles
                .iter()
                .all(|role| role.status != RoleStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub category: String,
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl ValidationCheck {
    pub fn new(
        category: &str,
        name: &str,
        status: CheckStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            status,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub schema_version: u32,
    pub generated_at_epoch_ms: u128,
    pub checks: Vec<ValidationCheck>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    /// Percentage of checks that passed, 0-100.
    pub success_rate: f64,
    pub success: bool,
}

impl ValidationSummary {
    pub fn from_checks(checks: Vec<ValidationCheck>, generated_at_epoch_ms: u128) -> Self {
        let count = |status| checks.iter().filter(|c| c.status == status).count();
        let total = checks.len();
        let passed = count(CheckStatus::Pass);
        let failed = count(CheckStatus::Fail);
        let warnings = count(CheckStatus::Warning);
        let success_rate = if total == 0 {
            0.0
        } else {
            passed as f64 * 100.0 / total as f64
        };
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at_epoch_ms,
            checks,
            total,
            passed,
            failed,
            warnings,
            success_rate,
            success: failed == 0,
        }
    }
}

/// One line of `foundry_history.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub command: String,
    pub started_at_epoch_ms: u128,
    pub finished_at_epoch_ms: u128,
    pub success: bool,
    pub dry_run: bool,
    pub message: String,
}
