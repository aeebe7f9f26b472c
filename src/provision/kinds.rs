//! Per-kind strategy: desired ARM bodies, drift detection, identifiers.
use crate::model::Mismatch;
use crate::provider::{Identity, ResourceState};
use crate::resource::{ResourceDescriptor, ResourceKind};
use crate::util::normalize_region;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub(crate) const RESOURCE_ID: &str = "resource_id";
pub(crate) const ENDPOINT: &str = "endpoint";

/// Inputs a desired body may draw on beyond the descriptor itself.
pub(crate) struct BodyInputs<'a> {
    pub tags: &'a BTreeMap<String, String>,
    pub identity: &'a Identity,
    /// Resource id of the log workspace, for the telemetry component.
    pub workspace_id: Option<&'a str>,
}

/// ARM `kind` the resource must carry, when the kind is observable.
pub(crate) fn desired_arm_kind(kind: ResourceKind) -> Option<&'static str> {
    match kind {
        ResourceKind::AiServices => Some("AIServices"),
        ResourceKind::StorageAccount => Some("StorageV2"),
        ResourceKind::AppInsights => Some("web"),
        _ => None,
    }
}

pub(crate) fn desired_body(desc: &ResourceDescriptor, inputs: &BodyInputs<'_>) -> Value {
    let location = desc.region.as_str();
    let tags = inputs.tags;
    match desc.kind {
        ResourceKind::ResourceGroup => json!({ "location": location, "tags": tags }),
        ResourceKind::KeyVault => json!({
            "location": location,
            "tags": tags,
            "properties": {
                "tenantId": inputs.identity.tenant_id,
                "sku": { "family": "A", "name": "standard" },
                "accessPolicies": [{
                    "tenantId": inputs.identity.tenant_id,
                    "objectId": inputs.identity.principal_id,
                    "permissions": {
                        "keys": ["get", "list", "create", "update", "delete"],
                        "secrets": ["get", "list", "set", "delete"],
                        "certificates": ["get", "list", "create", "update", "delete"]
                    }
                }],
                "enabledForDeployment": true,
                "enabledForDiskEncryption": true,
                "enabledForTemplateDeployment": true,
                "enableRbacAuthorization": false,
                "enableSoftDelete": true,
                "softDeleteRetentionInDays": 90,
                "enablePurgeProtection": true
            }
        }),
        ResourceKind::AiServices => json!({
            "location": location,
            "tags": tags,
            "kind": "AIServices",
            "sku": { "name": "S0" },
            "properties": {
                "customSubDomainName": desc.name,
                "publicNetworkAccess": "Enabled"
            }
        }),
        ResourceKind::ContainerRegistry => json!({
            "location": location,
            "tags": tags,
            "sku": { "name": "Basic" },
            "properties": { "adminUserEnabled": true }
        }),
        ResourceKind::StorageAccount => json!({
            "location": location,
            "tags": tags,
            "kind": "StorageV2",
            "sku": { "name": "Standard_LRS" },
            "properties": {
                "supportsHttpsTrafficOnly": true,
                "minimumTlsVersion": "TLS1_2",
                "isHnsEnabled": true
            }
        }),
        ResourceKind::LogWorkspace => json!({
            "location": location,
            "tags": tags,
            "properties": {
                "sku": { "name": "PerGB2018" },
                "retentionInDays": 30
            }
        }),
        ResourceKind::AppInsights => json!({
            "location": location,
            "tags": tags,
            "kind": "web",
            "properties": {
                "Application_Type": "web",
                "WorkspaceResourceId": inputs.workspace_id.unwrap_or_default()
            }
        }),
        ResourceKind::SearchService => json!({
            "location": location,
            "tags": tags,
            "sku": { "name": "free" },
            "properties": { "replicaCount": 1, "partitionCount": 1 }
        }),
    }
}

/// Differences between the desired config and an existing resource.
///
/// Only region and ARM kind are compared; fields the caller cannot observe
/// reliably across API versions are ignored.
pub(crate) fn mismatches(desc: &ResourceDescriptor, state: &ResourceState) -> Vec<Mismatch> {
    let mut found = Vec::new();
    if let Some(observed) = state.location.as_deref() {
        if normalize_region(observed) != normalize_region(&desc.region) {
            found.push(Mismatch {
                field: "location".to_string(),
                desired: desc.region.clone(),
                observed: observed.to_string(),
            });
        }
    }
    if let (Some(desired), Some(observed)) = (desired_arm_kind(desc.kind), state.kind.as_deref()) {
        if !desired.eq_ignore_ascii_case(observed) {
            found.push(Mismatch {
                field: "kind".to_string(),
                desired: desired.to_string(),
                observed: observed.to_string(),
            });
        }
    }
    found
}

/// Non-secret identifiers worth recording for a resource.
pub(crate) fn identifiers(
    desc: &ResourceDescriptor,
    state: &ResourceState,
) -> BTreeMap<String, String> {
    let mut ids = BTreeMap::new();
    if !state.id.is_empty() {
        ids.insert(RESOURCE_ID.to_string(), state.id.clone());
    }
    let mut record = |key: &str, value: Option<&str>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            ids.insert(key.to_string(), value.to_string());
        }
    };
    match desc.kind {
        ResourceKind::ResourceGroup => {}
        ResourceKind::KeyVault => record("vault_uri", state.property("/vaultUri")),
        ResourceKind::AiServices => record(ENDPOINT, state.property("/endpoint")),
        ResourceKind::ContainerRegistry => record("login_server", state.property("/loginServer")),
        ResourceKind::StorageAccount => {
            record("blob_endpoint", state.property("/primaryEndpoints/blob"))
        }
        ResourceKind::LogWorkspace => record("customer_id", state.property("/customerId")),
        ResourceKind::AppInsights => record("app_id", state.property("/AppId")),
        ResourceKind::SearchService => {
            let endpoint = format!("https://{}.search.windows.net/", desc.name);
            record(ENDPOINT, Some(endpoint.as_str()));
        }
    }
    ids
}
