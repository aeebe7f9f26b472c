//! The generic ensure-exists-else-create routine.
use super::kinds;
use crate::model::{OutcomeError, OutcomeStatus, ProvisioningOutcome};
use crate::provider::{ControlPlane, ProviderError, ProvisioningErrorKind, ResourceState};
use crate::resource::ResourceDescriptor;
use serde_json::Value;
use tracing::{debug, warn};

/// Bring one resource to its desired state without ever mutating an
/// existing resource.
pub(crate) fn ensure(
    control_plane: &dyn ControlPlane,
    desc: &ResourceDescriptor,
    body: impl FnOnce() -> Value,
) -> ProvisioningOutcome {
    match control_plane.get_resource(desc) {
        Ok(Some(state)) => existing_outcome(desc, &state),
        Ok(None) => create(control_plane, desc, &body()),
        Err(err) => failed(desc, &err),
    }
}

fn create(
    control_plane: &dyn ControlPlane,
    desc: &ResourceDescriptor,
    body: &Value,
) -> ProvisioningOutcome {
    debug!(kind = %desc.kind, name = %desc.name, "creating");
    match control_plane.create_resource(desc, body) {
        Ok(state) => {
            let mut outcome =
                ProvisioningOutcome::new(desc.kind, &desc.name, OutcomeStatus::Created);
            outcome.identifiers = kinds::identifiers(desc, &state);
            outcome
        }
        Err(err) if err.kind() == ProvisioningErrorKind::NameConflict => {
            recover_conflict(control_plane, desc, &err)
        }
        Err(err) => failed(desc, &err),
    }
}

/// A create lost a race or hit a name that is already ours: look again.
fn recover_conflict(
    control_plane: &dyn ControlPlane,
    desc: &ResourceDescriptor,
    err: &ProviderError,
) -> ProvisioningOutcome {
    match control_plane.get_resource(desc) {
        Ok(Some(state)) => {
            debug!(kind = %desc.kind, name = %desc.name, "conflict resolved by existing resource");
            existing_outcome(desc, &state)
        }
        Ok(None) => failed(desc, err),
        Err(get_err) => {
            warn!(kind = %desc.kind, error = %get_err, "follow-up read after conflict failed");
            failed(desc, err)
        }
    }
}

fn existing_outcome(desc: &ResourceDescriptor, state: &ResourceState) -> ProvisioningOutcome {
    let mismatches = kinds::mismatches(desc, state);
    let status = if mismatches.is_empty() {
        OutcomeStatus::AlreadyExists
    } else {
        OutcomeStatus::ConfigurationMismatch
    };
    let mut outcome = ProvisioningOutcome::new(desc.kind, &desc.name, status);
    outcome.identifiers = kinds::identifiers(desc, state);
    outcome.mismatches = mismatches;
    outcome
}

fn failed(desc: &ResourceDescriptor, err: &ProviderError) -> ProvisioningOutcome {
    ProvisioningOutcome::failed(desc.kind, &desc.name, OutcomeError::from_provider(err))
}
