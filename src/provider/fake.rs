//! In-memory control plane and secret store for tests.
use super::{
    ControlPlane, ProviderError, ProviderResult, ResourceState, ResourceSummary, RoleAssignment,
    RoleAssignmentRequest, SecretStore, SecretValue,
};
use crate::resource::{ResourceDescriptor, ResourceKind};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

pub(crate) const SUBSCRIPTION: &str = "00000000-0000-4000-8000-000000000001";

#[derive(Default)]
struct State {
    resources: BTreeMap<ResourceKind, (String, Value)>,
    extra_resources: Vec<ResourceSummary>,
    secrets: BTreeMap<(String, String), String>,
    role_assignments: Vec<RoleAssignment>,
    calls: Vec<String>,
    fail_get: BTreeMap<ResourceKind, ProviderError>,
    fail_create: BTreeMap<ResourceKind, ProviderError>,
    fail_action: BTreeMap<ResourceKind, ProviderError>,
    conflict_on_create: BTreeSet<ResourceKind>,
    fail_role_create: Option<ProviderError>,
    fail_set_secret: BTreeSet<String>,
    fail_register: BTreeSet<String>,
}

/// Records every call and lets tests inject failures per kind.
#[derive(Default)]
pub(crate) struct FakeCloud {
    state: RefCell<State>,
}

impl FakeCloud {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn calls_starting_with(&self, prefix: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub(crate) fn create_count(&self) -> usize {
        self.calls_starting_with("create ")
    }

    pub(crate) fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub(crate) fn fail_get(&self, kind: ResourceKind, err: ProviderError) {
        self.state.borrow_mut().fail_get.insert(kind, err);
    }

    pub(crate) fn fail_create(&self, kind: ResourceKind, err: ProviderError) {
        self.state.borrow_mut().fail_create.insert(kind, err);
    }

    pub(crate) fn fail_action(&self, kind: ResourceKind, err: ProviderError) {
        self.state.borrow_mut().fail_action.insert(kind, err);
    }

    /// Simulate a concurrent creator: the create lands but reports 409.
    pub(crate) fn conflict_on_create(&self, kind: ResourceKind) {
        self.state.borrow_mut().conflict_on_create.insert(kind);
    }

    pub(crate) fn fail_role_create(&self, err: ProviderError) {
        self.state.borrow_mut().fail_role_create = Some(err);
    }

    pub(crate) fn fail_set_secret(&self, name: &str) {
        self.state.borrow_mut().fail_set_secret.insert(name.to_string());
    }

    pub(crate) fn fail_register(&self, namespace: &str) {
        self.state
            .borrow_mut()
            .fail_register
            .insert(namespace.to_string());
    }

    pub(crate) fn clear_failures(&self) {
        let mut state = self.state.borrow_mut();
        state.fail_get.clear();
        state.fail_create.clear();
        state.fail_action.clear();
        state.conflict_on_create.clear();
        state.fail_role_create = None;
        state.fail_set_secret.clear();
        state.fail_register.clear();
    }

    /// Place an existing resource, e.g. one created out of band.
    pub(crate) fn seed(
        &self,
        kind: ResourceKind,
        name: &str,
        location: &str,
        arm_kind: Option<&str>,
    ) {
        let mut body = json!({ "location": location, "properties": {} });
        if let Some(arm_kind) = arm_kind {
            body["kind"] = json!(arm_kind);
        }
        let value = materialize(kind, name, &body);
        self.state
            .borrow_mut()
            .resources
            .insert(kind, (name.to_string(), value));
    }

    pub(crate) fn delete(&self, kind: ResourceKind) {
        self.state.borrow_mut().resources.remove(&kind);
    }

    pub(crate) fn add_unlisted_resource(&self, name: &str, resource_type: &str) {
        self.state.borrow_mut().extra_resources.push(ResourceSummary {
            name: name.to_string(),
            resource_type: resource_type.to_string(),
            location: None,
        });
    }

    pub(crate) fn has(&self, kind: ResourceKind) -> bool {
        self.state.borrow().resources.contains_key(&kind)
    }

    pub(crate) fn secret(&self, vault: &str, name: &str) -> Option<String> {
        self.state
            .borrow()
            .secrets
            .get(&(vault.to_string(), name.to_string()))
            .cloned()
    }

    pub(crate) fn delete_secret(&self, vault: &str, name: &str) {
        self.state
            .borrow_mut()
            .secrets
            .remove(&(vault.to_string(), name.to_string()));
    }

    pub(crate) fn role_assignment_count(&self) -> usize {
        self.state.borrow().role_assignments.len()
    }

    pub(crate) fn remove_role_assignments(&self) {
        self.state.borrow_mut().role_assignments.clear();
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn lookup(&self, desc: &ResourceDescriptor) -> Option<Value> {
        self.state
            .borrow()
            .resources
            .get(&desc.kind)
            .filter(|(name, _)| name == &desc.name)
            .map(|(_, value)| value.clone())
    }
}

fn resource_id(kind: ResourceKind, name: &str) -> String {
    let group = format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/rg-foundry");
    if kind == ResourceKind::ResourceGroup {
        return format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/{name}");
    }
    format!("{group}/providers/{}/{name}", kind.spec().arm_type)
}

fn materialize(kind: ResourceKind, name: &str, body: &Value) -> Value {
    let mut value = body.clone();
    value["id"] = json!(resource_id(kind, name));
    value["name"] = json!(name);
    if !value["properties"].is_object() {
        value["properties"] = json!({});
    }
    let props = &mut value["properties"];
    props["provisioningState"] = json!("Succeeded");
    match kind {
        ResourceKind::KeyVault => {
            props["vaultUri"] = json!(format!("https://{name}.vault.azure.net/"));
        }
        ResourceKind::AiServices => {
            props["endpoint"] = json!(format!("https://{name}.cognitiveservices.azure.com/"));
        }
        ResourceKind::ContainerRegistry => {
            props["loginServer"] = json!(format!("{name}.azurecr.io"));
        }
        ResourceKind::StorageAccount => {
            props["primaryEndpoints"] =
                json!({ "blob": format!("https://{name}.blob.core.windows.net/") });
        }
        ResourceKind::LogWorkspace => {
            props["customerId"] = json!(format!("customer-{name}"));
        }
        ResourceKind::AppInsights => {
            props["AppId"] = json!(format!("app-{name}"));
            props["ConnectionString"] = json!(format!("InstrumentationKey=ikey-{name}"));
        }
        ResourceKind::ResourceGroup | ResourceKind::SearchService => {}
    }
    value
}

fn action_response(kind: ResourceKind, name: &str, action: &str) -> Option<Value> {
    match (kind, action) {
        (ResourceKind::AiServices, "listKeys") => {
            Some(json!({ "key1": format!("ai-key1-{name}"), "key2": format!("ai-key2-{name}") }))
        }
        (ResourceKind::StorageAccount, "listKeys") => {
            Some(json!({ "keys": [{ "keyName": "key1", "value": format!("st-key-{name}") }] }))
        }
        (ResourceKind::ContainerRegistry, "listCredentials") => Some(json!({
            "username": name,
            "passwords": [{ "name": "password", "value": format!("acr-pass-{name}") }]
        })),
        (ResourceKind::SearchService, "listAdminKeys") => Some(json!({
            "primaryKey": format!("search-key-{name}"),
            "secondaryKey": format!("search-key2-{name}")
        })),
        _ => None,
    }
}

impl ControlPlane for FakeCloud {
    fn get_resource(&self, desc: &ResourceDescriptor) -> ProviderResult<Option<ResourceState>> {
        self.record(format!("get {:?} {}", desc.kind, desc.name));
        if let Some(err) = self.state.borrow().fail_get.get(&desc.kind) {
            return Err(err.clone());
        }
        Ok(self.lookup(desc).as_ref().map(ResourceState::from_arm))
    }

    fn create_resource(
        &self,
        desc: &ResourceDescriptor,
        body: &Value,
    ) -> ProviderResult<ResourceState> {
        self.record(format!("create {:?} {}", desc.kind, desc.name));
        if let Some(err) = self.state.borrow().fail_create.get(&desc.kind) {
            return Err(err.clone());
        }
        let value = materialize(desc.kind, &desc.name, body);
        let conflict = self.state.borrow().conflict_on_create.contains(&desc.kind);
        self.state
            .borrow_mut()
            .resources
            .insert(desc.kind, (desc.name.clone(), value.clone()));
        if conflict {
            return Err(ProviderError::http(
                409,
                Some("Conflict".to_string()),
                "operation conflicted with a concurrent create",
            ));
        }
        Ok(ResourceState::from_arm(&value))
    }

    fn invoke_action(&self, desc: &ResourceDescriptor, action: &str) -> ProviderResult<Value> {
        self.record(format!("action {:?} {action}", desc.kind));
        if let Some(err) = self.state.borrow().fail_action.get(&desc.kind) {
            return Err(err.clone());
        }
        if self.lookup(desc).is_none() {
            return Err(ProviderError::http(
                404,
                Some("ResourceNotFound".to_string()),
                format!("{} not found", desc.name),
            ));
        }
        action_response(desc.kind, &desc.name, action).ok_or_else(|| {
            ProviderError::http(
                400,
                Some("InvalidAction".to_string()),
                format!("unsupported action {action}"),
            )
        })
    }

    fn list_role_assignments(
        &self,
        scope: &str,
        principal_id: &str,
    ) -> ProviderResult<Vec<RoleAssignment>> {
        self.record(format!("list_roles {principal_id}"));
        Ok(self
            .state
            .borrow()
            .role_assignments
            .iter()
            .filter(|ra| ra.scope == scope && ra.principal_id == principal_id)
            .cloned()
            .collect())
    }

    fn create_role_assignment(
        &self,
        request: &RoleAssignmentRequest,
    ) -> ProviderResult<RoleAssignment> {
        self.record(format!("create_role {}", request.assignment_name));
        if let Some(err) = self.state.borrow().fail_role_create.clone() {
            return Err(err);
        }
        let assignment = RoleAssignment {
            id: format!(
                "{}/providers/Microsoft.Authorization/roleAssignments/{}",
                request.scope, request.assignment_name
            ),
            principal_id: request.principal_id.clone(),
            role_definition_id: request.role_definition_path.clone(),
            scope: request.scope.clone(),
        };
        self.state
            .borrow_mut()
            .role_assignments
            .push(assignment.clone());
        Ok(assignment)
    }

    fn list_group_resources(&self, resource_group: &str) -> ProviderResult<Vec<ResourceSummary>> {
        self.record(format!("list_group {resource_group}"));
        let state = self.state.borrow();
        let mut listed: Vec<ResourceSummary> = state
            .resources
            .iter()
            .filter(|(kind, _)| **kind != ResourceKind::ResourceGroup)
            .map(|(kind, (name, value))| ResourceSummary {
                name: name.clone(),
                resource_type: kind.spec().arm_type.to_string(),
                location: value["location"].as_str().map(str::to_string),
            })
            .collect();
        listed.extend(state.extra_resources.iter().cloned());
        Ok(listed)
    }

    fn register_provider(&self, namespace: &str) -> ProviderResult<()> {
        self.record(format!("register {namespace}"));
        if self.state.borrow().fail_register.contains(namespace) {
            return Err(ProviderError::http(
                403,
                Some("AuthorizationFailed".to_string()),
                format!("cannot register {namespace}"),
            ));
        }
        Ok(())
    }
}

impl SecretStore for FakeCloud {
    fn get_secret(&self, vault: &str, name: &str) -> ProviderResult<Option<SecretValue>> {
        self.record(format!("get_secret {name}"));
        Ok(self.secret(vault, name).map(SecretValue::new))
    }

    fn set_secret(&self, vault: &str, name: &str, value: &SecretValue) -> ProviderResult<()> {
        self.record(format!("set_secret {name}"));
        if self.state.borrow().fail_set_secret.contains(name) {
            return Err(ProviderError::http(
                403,
                Some("Forbidden".to_string()),
                format!("no set permission for {name}"),
            ));
        }
        self.state
            .borrow_mut()
            .secrets
            .insert((vault.to_string(), name.to_string()), value.expose().to_string());
        Ok(())
    }
}
