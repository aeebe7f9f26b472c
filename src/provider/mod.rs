//! Capabilities the workflow needs from the cloud, behind traits.
//!
//! The orchestrator and validator only ever see `&dyn ControlPlane` and
//! `&dyn SecretStore`; the Azure clients and the in-memory test double are
//! interchangeable implementations.
mod classify;
#[cfg(test)]
pub(crate) mod fake;

pub use classify::{classify, is_role_assignment_exists, ProvisioningErrorKind};

use crate::resource::ResourceDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Failure reported by a provider call: HTTP status plus ARM error payload.
///
/// `status` is `None` when the request never produced a response (DNS,
/// connect, timeout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub status: Option<u16>,
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn http(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ProvisioningErrorKind {
        classify(self)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.code.as_deref()) {
            (Some(status), Some(code)) => write!(f, "HTTP {status} {code}: {}", self.message),
            (Some(status), None) => write!(f, "HTTP {status}: {}", self.message),
            (None, _) => write!(f, "transport error: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Observed state of an ARM resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState {
    pub id: String,
    pub location: Option<String>,
    /// ARM `kind` (e.g. `AIServices`, `StorageV2`, `web`).
    pub kind: Option<String>,
    pub sku: Option<String>,
    pub properties: Value,
}

impl ResourceState {
    pub fn from_arm(value: &Value) -> Self {
        let text = |pointer: &str| {
            value
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            id: text("/id").unwrap_or_default(),
            location: text("/location"),
            kind: text("/kind"),
            sku: text("/sku/name"),
            properties: value.get("properties").cloned().unwrap_or(Value::Null),
        }
    }

    /// String property at a JSON pointer relative to `properties`.
    pub fn property(&self, pointer: &str) -> Option<&str> {
        self.properties.pointer(pointer).and_then(Value::as_str)
    }

    pub fn provisioning_state(&self) -> Option<&str> {
        self.property("/provisioningState")
    }
}

/// The signed-in caller and its subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subscription_id: String,
    pub tenant_id: String,
    pub principal_id: String,
    /// `User` or `ServicePrincipal`, as ARM expects in role assignments.
    pub principal_type: String,
}

impl Identity {
    pub fn resource_group_scope(&self, resource_group: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, resource_group
        )
    }

    pub fn role_definition_path(&self, role_definition_id: &str) -> String {
        format!(
            "/subscriptions/{}/providers/Microsoft.Authorization/roleDefinitions/{}",
            self.subscription_id, role_definition_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: String,
    pub principal_id: String,
    /// Full role definition path; compare by trailing GUID.
    pub role_definition_id: String,
    pub scope: String,
}

impl RoleAssignment {
    pub fn grants(&self, role_definition_id: &str) -> bool {
        self.role_definition_id
            .to_ascii_lowercase()
            .ends_with(&role_definition_id.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignmentRequest {
    pub scope: String,
    pub assignment_name: String,
    pub role_definition_path: String,
    pub principal_id: String,
    pub principal_type: String,
}

/// One entry from a resource-group listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub name: String,
    pub resource_type: String,
    pub location: Option<String>,
}

/// Secret material whose `Debug` output never reveals the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

/// ARM control-plane operations.
pub trait ControlPlane {
    /// `Ok(None)` when the resource does not exist.
    fn get_resource(&self, desc: &ResourceDescriptor) -> ProviderResult<Option<ResourceState>>;

    /// Create and wait for a terminal provisioning state.
    fn create_resource(&self, desc: &ResourceDescriptor, body: &Value)
        -> ProviderResult<ResourceState>;

    /// POST a resource action such as `listKeys`.
    fn invoke_action(&self, desc: &ResourceDescriptor, action: &str) -> ProviderResult<Value>;

    fn list_role_assignments(
        &self,
        scope: &str,
        principal_id: &str,
    ) -> ProviderResult<Vec<RoleAssignment>>;

    fn create_role_assignment(
        &self,
        request: &RoleAssignmentRequest,
    ) -> ProviderResult<RoleAssignment>;

    fn list_group_resources(&self, resource_group: &str) -> ProviderResult<Vec<ResourceSummary>>;

    fn register_provider(&self, namespace: &str) -> ProviderResult<()>;
}

/// Key Vault data-plane operations.
pub trait SecretStore {
    /// `Ok(None)` when the secret does not exist.
    fn get_secret(&self, vault: &str, name: &str) -> ProviderResult<Option<SecretValue>>;

    fn set_secret(&self, vault: &str, name: &str, value: &SecretValue) -> ProviderResult<()>;
}
