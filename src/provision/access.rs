//! Idempotent RBAC role assignment for the deploying principal.
use crate::model::{OutcomeError, RoleOutcome, RoleStatus};
use crate::plan::RoleSpec;
use crate::provider::{is_role_assignment_exists, ControlPlane, Identity, RoleAssignmentRequest};
use crate::util::stable_guid;
use tracing::{info, warn};

/// Ensure `identity` holds `role` at `scope`.
pub(crate) fn assign_role(
    control_plane: &dyn ControlPlane,
    identity: &Identity,
    role: &RoleSpec,
    scope: &str,
) -> RoleOutcome {
    let principal = identity.principal_id.as_str();
    match control_plane.list_role_assignments(scope, principal) {
        Ok(existing) if existing.iter().any(|ra| ra.grants(&role.role_definition_id)) => {
            info!(role = %role.role_name, "role already assigned");
            return outcome(identity, role, scope, RoleStatus::AlreadyAssigned, None);
        }
        Ok(_) => {}
        Err(err) => warn!(role = %role.role_name, error = %err, "listing role assignments failed"),
    }

    let request = RoleAssignmentRequest {
        scope: scope.to_string(),
        assignment_name: stable_guid(&[scope, principal, role.role_definition_id.as_str()]),
        role_definition_path: identity.role_definition_path(&role.role_definition_id),
        principal_id: principal.to_string(),
        principal_type: identity.principal_type.clone(),
    };
    match control_plane.create_role_assignment(&request) {
        Ok(_) => {
            info!(role = %role.role_name, assignment = %request.assignment_name, "role assigned");
            outcome(identity, role, scope, RoleStatus::Assigned, None)
        }
        Err(err) if is_role_assignment_exists(&err) => {
            outcome(identity, role, scope, RoleStatus::AlreadyAssigned, None)
        }
        Err(err) => {
            warn!(role = %role.role_name, error = %err, "role assignment failed");
            outcome(
                identity,
                role,
                scope,
                RoleStatus::Failed,
                Some(OutcomeError::from_provider(&err)),
            )
        }
    }
}

pub(crate) fn outcome(
    identity: &Identity,
    role: &RoleSpec,
    scope: &str,
    status: RoleStatus,
    error: Option<OutcomeError>,
) -> RoleOutcome {
    RoleOutcome {
        role_name: role.role_name.clone(),
        role_definition_id: role.role_definition_id.clone(),
        principal_id: identity.principal_id.clone(),
        scope: scope.to_string(),
        status,
        error,
    }
}
