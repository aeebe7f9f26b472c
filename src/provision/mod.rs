//! Provisioning orchestration.
//!
//! Resources are ensured strictly in plan order. Each step is gated on its
//! dependencies' outcomes, so a failure only blocks what depends on it and
//! nothing already created is ever rolled back.
mod access;
mod ensure;
mod kinds;
mod secrets;

use kinds::RESOURCE_ID;

use crate::interrupt::CancelFlag;
use crate::model::{DeploymentReport, OutcomeError, ProvisioningOutcome, RoleStatus};
use crate::plan::DeploymentPlan;
use crate::provider::{ControlPlane, Identity, ProvisioningErrorKind, SecretStore};
use crate::resource::{ResourceDescriptor, ResourceKind};
use crate::util::now_epoch_ms;
use anyhow::Result;
use secrets::SecretPublisher;
use tracing::{info, warn};

/// Runs one provisioning pass over a plan.
pub struct Orchestrator<'a> {
    control_plane: &'a dyn ControlPlane,
    secrets: &'a dyn SecretStore,
    identity: &'a Identity,
    cancel: CancelFlag,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        control_plane: &'a dyn ControlPlane,
        secrets: &'a dyn SecretStore,
        identity: &'a Identity,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            control_plane,
            secrets,
            identity,
            cancel,
        }
    }

    pub fn run(&self, plan: &DeploymentPlan) -> Result<DeploymentReport> {
        let started = now_epoch_ms()?;
        let mut report = DeploymentReport::begin(plan, started);

        self.register_providers(plan, &mut report);

        for desc in &plan.resources {
            if self.cancelled(&mut report, desc.kind.label()) {
                break;
            }
            let outcome = self.ensure_resource(plan, desc, &report.resources);
            log_outcome(&outcome);
            report.resources.push(outcome);
        }

        let publisher = SecretPublisher {
            control_plane: self.control_plane,
            store: self.secrets,
            plan,
        };
        for spec in &plan.secrets {
            if self.cancelled(&mut report, &spec.name) {
                break;
            }
            let outcome = publisher.publish_spec(spec, &report.resources);
            if let Some(err) = &outcome.error {
                report.warnings.push(format!(
                    "secret {} was not published ({}): {}",
                    spec.name, err.kind, err.message
                ));
            }
            report.secrets.push(outcome);
        }

        let scope = self.identity.resource_group_scope(&plan.resource_group);
        for role in &plan.roles {
            if self.cancelled(&mut report, &role.role_name) {
                break;
            }
            let group_ready = report
                .outcome(ResourceKind::ResourceGroup)
                .is_some_and(|o| o.status.is_available());
            let outcome = if group_ready {
                access::assign_role(self.control_plane, self.identity, role, &scope)
            } else {
                access::outcome(
                    self.identity,
                    role,
                    &scope,
                    RoleStatus::Failed,
                    Some(OutcomeError::new(
                        ProvisioningErrorKind::DependencyUnavailable,
                        "Resource Group is not available",
                    )),
                )
            };
            report.roles.push(outcome);
        }

        report.finished_at_epoch_ms = now_epoch_ms()?;
        report.success = report.compute_success();
        info!(
            success = report.success,
            created = report.count(crate::model::OutcomeStatus::Created),
            existing = report.count(crate::model::OutcomeStatus::AlreadyExists),
            "provisioning finished"
        );
        Ok(report)
    }

    fn cancelled(&self, report: &mut DeploymentReport, next: &str) -> bool {
        if !report.cancelled && self.cancel.is_cancelled() {
            warn!(next = %next, "interrupted; remaining steps skipped");
            report.cancelled = true;
            report
                .warnings
                .push(format!("run interrupted before {next}; remaining steps were not attempted"));
        }
        report.cancelled
    }

    fn register_providers(&self, plan: &DeploymentPlan, report: &mut DeploymentReport) {
        for namespace in &plan.provider_namespaces {
            if let Err(err) = self.control_plane.register_provider(namespace) {
                warn!(namespace = %namespace, error = %err, "provider registration failed");
                report
                    .warnings
                    .push(format!("could not register {namespace}: {err}"));
            }
        }
    }

    fn ensure_resource(
        &self,
        plan: &DeploymentPlan,
        desc: &ResourceDescriptor,
        done: &[ProvisioningOutcome],
    ) -> ProvisioningOutcome {
        let outcome_of = |kind: ResourceKind| done.iter().find(|o| o.kind == kind);
        for dep in &desc.depends_on {
            let blocked = match outcome_of(*dep) {
                Some(outcome) if outcome.status.is_available() => continue,
                Some(outcome) => format!("{dep} is {:?}", outcome.status),
                None => format!("{dep} was not attempted"),
            };
            return ProvisioningOutcome::failed(
                desc.kind,
                &desc.name,
                OutcomeError::new(ProvisioningErrorKind::DependencyUnavailable, blocked),
            );
        }
        let workspace_id = outcome_of(ResourceKind::LogWorkspace)
            .and_then(|o| o.identifier(RESOURCE_ID))
            .map(str::to_string);
        ensure::ensure(self.control_plane, desc, || {
            kinds::desired_body(
                desc,
                &kinds::BodyInputs {
                    tags: &plan.tags,
                    identity: self.identity,
                    workspace_id: workspace_id.as_deref(),
                },
            )
        })
    }
}

fn log_outcome(outcome: &ProvisioningOutcome) {
    match &outcome.error {
        Some(err) => warn!(
            kind = %outcome.kind,
            name = %outcome.name,
            error_kind = %err.kind,
            "{}",
            err.message
        ),
        None if !outcome.mismatches.is_empty() => warn!(
            kind = %outcome.kind,
            name = %outcome.name,
            fields = outcome.mismatches.len(),
            "existing resource differs from desired configuration"
        ),
        None => info!(
            kind = %outcome.kind,
            name = %outcome.name,
            status = ?outcome.status,
            "resource ensured"
        ),
    }
}

#[cfg(test)]
mod tests;
