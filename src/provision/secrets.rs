//! Publishing derived credentials into the vault.
use super::kinds::ENDPOINT;
use crate::model::{OutcomeError, ProvisioningOutcome, SecretOutcome, SecretStatus};
use crate::plan::{DeploymentPlan, SecretField, SecretSpec};
use crate::provider::{ControlPlane, ProvisioningErrorKind, SecretStore, SecretValue};
use crate::resource::ResourceKind;
use tracing::{info, warn};

/// Collaborators the publisher reads from and writes to.
pub(crate) struct SecretPublisher<'a> {
    pub control_plane: &'a dyn ControlPlane,
    pub store: &'a dyn SecretStore,
    pub plan: &'a DeploymentPlan,
}

impl SecretPublisher<'_> {
    /// Derive and publish one secret, gated on the vault and source outcomes.
    pub(crate) fn publish_spec(
        &self,
        spec: &SecretSpec,
        outcomes: &[ProvisioningOutcome],
    ) -> SecretOutcome {
        let outcome_of = |kind: ResourceKind| outcomes.iter().find(|o| o.kind == kind);
        for gate in [ResourceKind::KeyVault, spec.source] {
            let available = outcome_of(gate).is_some_and(|o| o.status.is_available());
            if !available {
                return failed(
                    spec,
                    OutcomeError::new(
                        ProvisioningErrorKind::DependencyUnavailable,
                        format!("{gate} is not available"),
                    ),
                );
            }
        }
        let Some(vault) = self.plan.name_of(ResourceKind::KeyVault) else {
            return failed(
                spec,
                OutcomeError::new(ProvisioningErrorKind::DependencyUnavailable, "no vault planned"),
            );
        };
        let value = match self.derive_value(spec, outcome_of(spec.source)) {
            Ok(value) => value,
            Err(err) => return failed(spec, err),
        };
        self.publish(vault, spec, &value)
    }

    /// Upsert `value`, skipping the write when the vault already holds it.
    pub(crate) fn publish(
        &self,
        vault: &str,
        spec: &SecretSpec,
        value: &SecretValue,
    ) -> SecretOutcome {
        match self.store.get_secret(vault, &spec.name) {
            Ok(Some(current)) if current == *value => {
                info!(secret = %spec.name, "secret unchanged");
                return outcome(spec, SecretStatus::Unchanged, None);
            }
            Ok(_) => {}
            Err(err) => warn!(secret = %spec.name, error = %err, "could not read current secret"),
        }
        match self.store.set_secret(vault, &spec.name, value) {
            Ok(()) => {
                info!(secret = %spec.name, "secret published");
                outcome(spec, SecretStatus::Published, None)
            }
            Err(err) => failed(spec, OutcomeError::from_provider(&err)),
        }
    }

    fn derive_value(
        &self,
        spec: &SecretSpec,
        source: Option<&ProvisioningOutcome>,
    ) -> Result<SecretValue, OutcomeError> {
        match spec.field {
            SecretField::Endpoint => source
                .and_then(|o| o.identifier(ENDPOINT))
                .map(SecretValue::new)
                .ok_or_else(|| {
                    OutcomeError::new(
                        ProvisioningErrorKind::Unknown,
                        format!("{} has no recorded endpoint", spec.source),
                    )
                }),
            SecretField::PrimaryKey => {
                let probe = spec.source.spec().credential_probe.ok_or_else(|| {
                    OutcomeError::new(
                        ProvisioningErrorKind::Unknown,
                        format!("{} exposes no key action", spec.source),
                    )
                })?;
                let desc = self.plan.descriptor(spec.source).ok_or_else(|| {
                    OutcomeError::new(
                        ProvisioningErrorKind::DependencyUnavailable,
                        format!("{} is not planned", spec.source),
                    )
                })?;
                let response = self
                    .control_plane
                    .invoke_action(desc, probe.action)
                    .map_err(|err| OutcomeError::from_provider(&err))?;
                response
                    .pointer(probe.pointer)
                    .and_then(|v| v.as_str())
                    .filter(|v| !v.is_empty())
                    .map(SecretValue::new)
                    .ok_or_else(|| {
                        OutcomeError::new(
                            ProvisioningErrorKind::Unknown,
                            format!("{} returned no key", probe.action),
                        )
                    })
            }
        }
    }
}

fn outcome(spec: &SecretSpec, status: SecretStatus, error: Option<OutcomeError>) -> SecretOutcome {
    SecretOutcome {
        name: spec.name.clone(),
        source: spec.source,
        status,
        error,
    }
}

fn failed(spec: &SecretSpec, error: OutcomeError) -> SecretOutcome {
    warn!(secret = %spec.name, kind = %error.kind, "secret not published");
    outcome(spec, SecretStatus::Failed, Some(error))
}
