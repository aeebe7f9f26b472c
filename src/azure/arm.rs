//! ARM control-plane client.
use super::http::{HttpClient, Reply};
use crate::provider::{
    ControlPlane, ProviderError, ProviderResult, ResourceState, ResourceSummary, RoleAssignment,
    RoleAssignmentRequest,
};
use crate::resource::{ResourceDescriptor, ResourceKind};
use serde_json::{json, Value};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
const RESOURCES_API_VERSION: &str = "2021-04-01";
const AUTHORIZATION_API_VERSION: &str = "2022-04-01";
const POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct ArmClient {
    http: HttpClient,
    subscription_id: String,
    operation_timeout: Duration,
}

impl ArmClient {
    pub fn new(http: HttpClient, subscription_id: &str, operation_timeout: Duration) -> Self {
        Self {
            http,
            subscription_id: subscription_id.to_string(),
            operation_timeout,
        }
    }

    fn resource_path(&self, desc: &ResourceDescriptor) -> String {
        let group = format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, desc.resource_group
        );
        match desc.kind {
            ResourceKind::ResourceGroup => group,
            kind => format!("{group}/providers/{}/{}", kind.spec().arm_type, desc.name),
        }
    }

    fn resource_url(&self, desc: &ResourceDescriptor) -> String {
        format!(
            "{MANAGEMENT_ENDPOINT}{}?api-version={}",
            self.resource_path(desc),
            desc.api_version()
        )
    }

    fn wait_for_terminal(
        &self,
        desc: &ResourceDescriptor,
        initial: Value,
    ) -> ProviderResult<ResourceState> {
        let url = self.resource_url(desc);
        poll_until_terminal(
            desc,
            initial,
            self.operation_timeout,
            POLL_INTERVAL,
            || self.http.get(&url),
        )
    }

    fn get_paged(&self, first_url: String) -> ProviderResult<Vec<Value>> {
        let mut items = Vec::new();
        let mut next = Some(first_url);
        while let Some(url) = next.take() {
            let body = self.http.get(&url)?.into_result()?;
            if let Some(values) = body.get("value").and_then(Value::as_array) {
                items.extend(values.iter().cloned());
            }
            next = body
                .get("nextLink")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        Ok(items)
    }
}

/// Poll until the resource reaches a terminal provisioning state.
///
/// A null body or a 404 means an accepted create is not readable yet; both
/// keep polling until `timeout`, which surfaces as a transport error.
fn poll_until_terminal(
    desc: &ResourceDescriptor,
    initial: Value,
    timeout: Duration,
    interval: Duration,
    mut fetch: impl FnMut() -> ProviderResult<Reply>,
) -> ProviderResult<ResourceState> {
    let deadline = Instant::now() + timeout;
    let mut current = (!initial.is_null()).then(|| ResourceState::from_arm(&initial));
    loop {
        match current.take() {
            Some(state) => {
                let phase = state.provisioning_state().map(str::to_string);
                match phase.as_deref() {
                    None => return Ok(state),
                    Some(s) if s.eq_ignore_ascii_case("Succeeded") => return Ok(state),
                    Some(s)
                        if s.eq_ignore_ascii_case("Failed") || s.eq_ignore_ascii_case("Canceled") =>
                    {
                        return Err(ProviderError::http(
                            200,
                            Some("ProvisioningFailed".to_string()),
                            format!("{} ended in provisioning state {s}", desc.name),
                        ));
                    }
                    Some(s) => debug!(kind = %desc.kind, state = %s, "waiting for provisioning"),
                }
            }
            None => debug!(kind = %desc.kind, name = %desc.name, "resource not readable yet"),
        }
        if Instant::now() >= deadline {
            return Err(ProviderError::transport(format!(
                "timed out after {}s waiting for {}",
                timeout.as_secs(),
                desc.name
            )));
        }
        thread::sleep(interval);
        let reply = fetch()?;
        current = if reply.status == 404 {
            None
        } else {
            Some(ResourceState::from_arm(&reply.into_result()?))
        };
    }
}

fn role_assignment_from(value: &Value) -> RoleAssignment {
    let text = |pointer: &str| {
        value
            .pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    RoleAssignment {
        id: text("/id"),
        principal_id: text("/properties/principalId"),
        role_definition_id: text("/properties/roleDefinitionId"),
        scope: text("/properties/scope"),
    }
}

impl ControlPlane for ArmClient {
    fn get_resource(&self, desc: &ResourceDescriptor) -> ProviderResult<Option<ResourceState>> {
        let reply = self.http.get(&self.resource_url(desc))?;
        if reply.status == 404 {
            return Ok(None);
        }
        reply
            .into_result()
            .map(|body| Some(ResourceState::from_arm(&body)))
    }

    fn create_resource(
        &self,
        desc: &ResourceDescriptor,
        body: &Value,
    ) -> ProviderResult<ResourceState> {
        info!(kind = %desc.kind, name = %desc.name, "submitting create");
        let reply = self.http.put_json(&self.resource_url(desc), body)?;
        let initial = reply.into_result()?;
        self.wait_for_terminal(desc, initial)
    }

    fn invoke_action(&self, desc: &ResourceDescriptor, action: &str) -> ProviderResult<Value> {
        let url = format!(
            "{MANAGEMENT_ENDPOINT}{}/{action}?api-version={}",
            self.resource_path(desc),
            desc.api_version()
        );
        self.http.post_empty(&url)?.into_result()
    }

    fn list_role_assignments(
        &self,
        scope: &str,
        principal_id: &str,
    ) -> ProviderResult<Vec<RoleAssignment>> {
        let url = format!(
            "{MANAGEMENT_ENDPOINT}{scope}/providers/Microsoft.Authorization/roleAssignments?api-version={AUTHORIZATION_API_VERSION}&$filter=assignedTo('{principal_id}')"
        );
        Ok(self
            .get_paged(url)?
            .iter()
            .map(role_assignment_from)
            .collect())
    }

    fn create_role_assignment(
        &self,
        request: &RoleAssignmentRequest,
    ) -> ProviderResult<RoleAssignment> {
        let url = format!(
            "{MANAGEMENT_ENDPOINT}{}/providers/Microsoft.Authorization/roleAssignments/{}?api-version={AUTHORIZATION_API_VERSION}",
            request.scope, request.assignment_name
        );
        let body = json!({
            "properties": {
                "roleDefinitionId": request.role_definition_path,
                "principalId": request.principal_id,
                "principalType": request.principal_type
            }
        });
        let created = self.http.put_json(&url, &body)?.into_result()?;
        Ok(role_assignment_from(&created))
    }

    fn list_group_resources(&self, resource_group: &str) -> ProviderResult<Vec<ResourceSummary>> {
        let url = format!(
            "{MANAGEMENT_ENDPOINT}/subscriptions/{}/resourceGroups/{resource_group}/resources?api-version={RESOURCES_API_VERSION}",
            self.subscription_id
        );
        Ok(self
            .get_paged(url)?
            .iter()
            .map(|value| ResourceSummary {
                name: value["name"].as_str().unwrap_or_default().to_string(),
                resource_type: value["type"].as_str().unwrap_or_default().to_string(),
                location: value["location"].as_str().map(str::to_string),
            })
            .collect())
    }

    fn register_provider(&self, namespace: &str) -> ProviderResult<()> {
        let url = format!(
            "{MANAGEMENT_ENDPOINT}/subscriptions/{}/providers/{namespace}/register?api-version={RESOURCES_API_VERSION}",
            self.subscription_id
        );
        self.http.post_empty(&url)?.into_result().map(|_| ())
    }
}
