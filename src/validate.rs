//! Post-deployment validation.
//!
//! The validator re-queries every expected entity through the providers and
//! never consults a deployment report, so it reports what actually exists.
//! Every check always runs; provider errors become failing checks.
use crate::model::{CheckStatus, ValidationCheck, ValidationSummary};
use crate::plan::DeploymentPlan;
use crate::provider::{ControlPlane, Identity, SecretStore};
use crate::resource::{ProbeSeverity, ResourceDescriptor};
use crate::util::{normalize_region, now_epoch_ms};
use anyhow::Result;
use tracing::{debug, info};

const RESOURCE: &str = "resource";
const CREDENTIALS: &str = "credentials";
const SECRET: &str = "secret";
const ACCESS: &str = "access";

pub struct Validator<'a> {
    control_plane: &'a dyn ControlPlane,
    secrets: &'a dyn SecretStore,
    identity: &'a Identity,
}

impl<'a> Validator<'a> {
    pub fn new(
        control_plane: &'a dyn ControlPlane,
        secrets: &'a dyn SecretStore,
        identity: &'a Identity,
    ) -> Self {
        Self {
            control_plane,
            secrets,
            identity,
        }
    }

    pub fn run(&self, plan: &DeploymentPlan) -> Result<ValidationSummary> {
        let mut checks = Vec::new();
        for desc in &plan.resources {
            checks.push(self.check_resource(desc));
        }
        for desc in &plan.resources {
            if let Some(check) = self.check_credentials(desc) {
                checks.push(check);
            }
        }
        checks.extend(self.check_secrets(plan));
        checks.extend(self.check_roles(plan));

        for check in &checks {
            debug!(
                category = %check.category,
                name = %check.name,
                status = ?check.status,
                "{}",
                check.message
            );
        }
        let summary = ValidationSummary::from_checks(checks, now_epoch_ms()?);
        info!(
            passed = summary.passed,
            failed = summary.failed,
            warnings = summary.warnings,
            "validation finished"
        );
        Ok(summary)
    }

    fn check_resource(&self, desc: &ResourceDescriptor) -> ValidationCheck {
        let label = desc.kind.label();
        match self.control_plane.get_resource(desc) {
            Ok(Some(state)) => {
                let observed = state.location.clone().unwrap_or_default();
                let check = if !observed.is_empty()
                    && normalize_region(&observed) != normalize_region(&desc.region)
                {
                    ValidationCheck::new(
                        RESOURCE,
                        label,
                        CheckStatus::Warning,
                        format!("{} exists in {observed}, expected {}", desc.name, desc.region),
                    )
                } else {
                    let message = format!("{} exists", desc.name);
                    ValidationCheck::new(RESOURCE, label, CheckStatus::Pass, message)
                };
                let check = check
                    .with_detail("name", desc.name.clone())
                    .with_detail("resource_id", state.id);
                match state.sku {
                    Some(sku) => check.with_detail("sku", sku),
                    None => check,
                }
            }
            Ok(None) => ValidationCheck::new(
                RESOURCE,
                label,
                CheckStatus::Fail,
                format!("{} not found", desc.name),
            )
            .with_detail("name", desc.name.clone()),
            Err(err) => ValidationCheck::new(
                RESOURCE,
                label,
                CheckStatus::Fail,
                format!("could not read {}: {err}", desc.name),
            )
            .with_detail("error_kind", err.kind().to_string()),
        }
    }

    fn check_credentials(&self, desc: &ResourceDescriptor) -> Option<ValidationCheck> {
        let probe = desc.kind.spec().credential_probe?;
        let failure_status = match probe.severity {
            ProbeSeverity::Fail => CheckStatus::Fail,
            ProbeSeverity::Warning => CheckStatus::Warning,
        };
        let check = match self.control_plane.invoke_action(desc, probe.action) {
            Ok(response) => {
                let present = response
                    .pointer(probe.pointer)
                    .and_then(|v| v.as_str())
                    .is_some_and(|v| !v.is_empty());
                if present {
                    ValidationCheck::new(CREDENTIALS, probe.label, CheckStatus::Pass, "retrievable")
                } else {
                    ValidationCheck::new(
                        CREDENTIALS,
                        probe.label,
                        failure_status,
                        format!("{} returned no credential", probe.action),
                    )
                }
            }
            Err(err) => ValidationCheck::new(
                CREDENTIALS,
                probe.label,
                failure_status,
                format!("{} failed: {err}", probe.action),
            ),
        };
        Some(check.with_detail("action", probe.action))
    }

    fn check_secrets(&self, plan: &DeploymentPlan) -> Vec<ValidationCheck> {
        let vault = plan
            .name_of(crate::resource::ResourceKind::KeyVault)
            .unwrap_or_default();
        plan.secrets
            .iter()
            .map(|spec| match self.secrets.get_secret(vault, &spec.name) {
                Ok(Some(value)) if !value.expose().is_empty() => {
                    let message = "present and retrievable";
                    ValidationCheck::new(SECRET, &spec.name, CheckStatus::Pass, message)
                }
                Ok(_) => {
                    let message = "missing from vault";
                    ValidationCheck::new(SECRET, &spec.name, CheckStatus::Fail, message)
                }
                Err(err) => ValidationCheck::new(
                    SECRET,
                    &spec.name,
                    CheckStatus::Fail,
                    format!("could not read secret: {err}"),
                ),
            })
            .collect()
    }

    fn check_roles(&self, plan: &DeploymentPlan) -> Vec<ValidationCheck> {
        let scope = self.identity.resource_group_scope(&plan.resource_group);
        let principal = self.identity.principal_id.as_str();
        let assignments = match self.control_plane.list_role_assignments(&scope, principal) {
            Ok(assignments) => assignments,
            Err(err) => {
                return plan
                    .roles
                    .iter()
                    .map(|role| {
                        ValidationCheck::new(
                            ACCESS,
                            &role.role_name,
                            CheckStatus::Fail,
                            format!("could not list role assignments: {err}"),
                        )
                    })
                    .collect();
            }
        };

        let mut checks: Vec<ValidationCheck> = plan
            .roles
            .iter()
            .map(|role| {
                let status = if assignments.iter().any(|ra| ra.grants(&role.role_definition_id)) {
                    CheckStatus::Pass
                } else {
                    CheckStatus::Fail
                };
                let message = match status {
                    CheckStatus::Pass => "assigned at resource group scope".to_string(),
                    _ => format!("not assigned to {principal}"),
                };
                ValidationCheck::new(ACCESS, &role.role_name, status, message)
                    .with_detail("role_definition_id", role.role_definition_id.clone())
            })
            .collect();
        checks.push(ValidationCheck::new(
            ACCESS,
            "Role assignments",
            CheckStatus::Pass,
            format!("{} assignment(s) for the principal", assignments.len()),
        ));
        checks
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
