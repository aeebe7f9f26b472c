//! Deployment plan: everything a run intends to ensure, derived from config.
use crate::config::DeploymentConfig;
use crate::resource::{ResourceDescriptor, ResourceKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Azure AI Developer built-in role.
pub const AI_DEVELOPER_ROLE_ID: &str = "64702f94-c441-49e6-a78b-ef80e0188fee";
pub const AI_DEVELOPER_ROLE_NAME: &str = "Azure AI Developer";
pub const CREATED_BY: &str = "foundry-provision";

/// Which piece of a source resource feeds a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretField {
    PrimaryKey,
    Endpoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretSpec {
    pub name: String,
    pub source: ResourceKind,
    pub field: SecretField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSpec {
    pub role_name: String,
    pub role_definition_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    pub location: String,
    pub resource_group: String,
    pub resources: Vec<ResourceDescriptor>,
    pub secrets: Vec<SecretSpec>,
    pub roles: Vec<RoleSpec>,
    pub tags: BTreeMap<String, String>,
    pub provider_namespaces: Vec<String>,
}

impl DeploymentPlan {
    pub fn descriptor(&self, kind: ResourceKind) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|desc| desc.kind == kind)
    }

    pub fn name_of(&self, kind: ResourceKind) -> Option<&str> {
        self.descriptor(kind).map(|desc| desc.name.as_str())
    }
}

/// Derive the plan from a validated configuration.
pub fn build_plan(config: &DeploymentConfig) -> DeploymentPlan {
    let resources: Vec<ResourceDescriptor> = ResourceKind::ALL
        .iter()
        .filter_map(|kind| {
            let name = config.name(*kind)?;
            Some(ResourceDescriptor {
                kind: *kind,
                name: name.to_string(),
                region: config.location.clone(),
                resource_group: config.resource_group.clone(),
                depends_on: kind.spec().depends_on.to_vec(),
            })
        })
        .collect();

    let mut secrets = vec![
        secret("ai-services-key", ResourceKind::AiServices, SecretField::PrimaryKey),
        secret("ai-services-endpoint", ResourceKind::AiServices, SecretField::Endpoint),
    ];
    if config.has_search() {
        secrets.push(secret(
            "search-service-key",
            ResourceKind::SearchService,
            SecretField::PrimaryKey,
        ));
        secrets.push(secret(
            "search-service-endpoint",
            ResourceKind::SearchService,
            SecretField::Endpoint,
        ));
    }

    let project = config
        .name(ResourceKind::AiServices)
        .unwrap_or_default()
        .to_string();
    let tags = BTreeMap::from([
        ("Environment".to_string(), "AI-Development".to_string()),
        ("Project".to_string(), project),
        ("Purpose".to_string(), "AI-Foundry".to_string()),
        ("CreatedBy".to_string(), CREATED_BY.to_string()),
    ]);

    let mut provider_namespaces: Vec<String> = resources
        .iter()
        .filter(|desc| desc.kind != ResourceKind::ResourceGroup)
        .map(|desc| desc.kind.namespace().to_string())
        .collect();
    provider_namespaces.push("Microsoft.Authorization".to_string());

    DeploymentPlan {
        location: config.location.clone(),
        resource_group: config.resource_group.clone(),
        resources,
        secrets,
        roles: vec![RoleSpec {
            role_name: AI_DEVELOPER_ROLE_NAME.to_string(),
            role_definition_id: AI_DEVELOPER_ROLE_ID.to_string(),
        }],
        tags,
        provider_namespaces,
    }
}

fn secret(name: &str, source: ResourceKind, field: SecretField) -> SecretSpec {
    SecretSpec {
        name: name.to_string(),
        source,
        field,
    }
}
