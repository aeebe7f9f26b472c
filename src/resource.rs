//! Managed resource kinds and their static metadata.
//!
//! The kind table is the single place that knows ARM types, API versions,
//! dependency edges, and which credentials the validator probes.
use serde::{Deserialize, Serialize};
use std::fmt;

/// One kind of managed entity, in provisioning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ResourceGroup,
    KeyVault,
    AiServices,
    ContainerRegistry,
    StorageAccount,
    LogWorkspace,
    AppInsights,
    SearchService,
}

/// How a failed credential probe is scored by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSeverity {
    Fail,
    Warning,
}

/// A POST action whose response must contain a credential.
#[derive(Debug, Clone, Copy)]
pub struct CredentialProbe {
    pub action: &'static str,
    /// JSON pointer into the action response.
    pub pointer: &'static str,
    pub label: &'static str,
    pub severity: ProbeSeverity,
}

/// Static metadata for a resource kind.
#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
    pub kind: ResourceKind,
    pub label: &'static str,
    pub setting: &'static str,
    /// Empty for the resource group, which lives outside a provider namespace.
    pub arm_type: &'static str,
    pub api_version: &'static str,
    pub depends_on: &'static [ResourceKind],
    pub optional: bool,
    pub credential_probe: Option<CredentialProbe>,
}

const KIND_SPECS: [KindSpec; 8] = [
    KindSpec {
        kind: ResourceKind::ResourceGroup,
        label: "Resource Group",
        setting: "RESOURCE_GROUP",
        arm_type: "Microsoft.Resources/resourceGroups",
        api_version: "2021-04-01",
        depends_on: &[],
        optional: false,
        credential_probe: None,
    },
    KindSpec {
        kind: ResourceKind::KeyVault,
        label: "Key Vault",
        setting: "KEYVAULT_NAME",
        arm_type: "Microsoft.KeyVault/vaults",
        api_version: "2023-07-01",
        depends_on: &[ResourceKind::ResourceGroup],
        optional: false,
        credential_probe: None,
    },
    KindSpec {
        kind: ResourceKind::AiServices,
        label: "AI Services",
        setting: "AI_SERVICES_NAME",
        arm_type: "Microsoft.CognitiveServices/accounts",
        api_version: "2023-05-01",
        depends_on: &[ResourceKind::ResourceGroup],
        optional: false,
        credential_probe: Some(CredentialProbe {
            action: "listKeys",
            pointer: "/key1",
            label: "AI Services key",
            severity: ProbeSeverity::Fail,
        }),
    },
    KindSpec {
        kind: ResourceKind::ContainerRegistry,
        label: "Container Registry",
        setting: "CONTAINER_REGISTRY_NAME",
        arm_type: "Microsoft.ContainerRegistry/registries",
        api_version: "2023-07-01",
        depends_on: &[ResourceKind::ResourceGroup],
        optional: false,
        credential_probe: Some(CredentialProbe {
            action: "listCredentials",
            pointer: "/passwords/0/value",
            label: "Container Registry admin credentials",
            severity: ProbeSeverity::Warning,
        }),
    },
    KindSpec {
        kind: ResourceKind::StorageAccount,
        label: "Storage Account",
        setting: "STORAGE_ACCOUNT_NAME",
        arm_type: "Microsoft.Storage/storageAccounts",
        api_version: "2023-01-01",
        depends_on: &[ResourceKind::ResourceGroup],
        optional: false,
        credential_probe: Some(CredentialProbe {
            action: "listKeys",
            pointer: "/keys/0/value",
            label: "Storage Account key",
            severity: ProbeSeverity::Fail,
        }),
    },
    KindSpec {
        kind: ResourceKind::LogWorkspace,
        label: "Log Analytics Workspace",
        setting: "LOG_WORKSPACE_NAME",
        arm_type: "Microsoft.OperationalInsights/workspaces",
        api_version: "2022-10-01",
        depends_on: &[ResourceKind::ResourceGroup],
        optional: false,
        credential_probe: None,
    },
    KindSpec {
        kind: ResourceKind::AppInsights,
        label: "Application Insights",
        setting: "APPLICATION_INSIGHTS_NAME",
        arm_type: "Microsoft.Insights/components",
        api_version: "2020-02-02",
        depends_on: &[ResourceKind::ResourceGroup, ResourceKind::LogWorkspace],
        optional: false,
        credential_probe: None,
    },
    KindSpec {
        kind: ResourceKind::SearchService,
        label: "Cognitive Search",
        setting: "COGNITIVE_SEARCH_NAME",
        arm_type: "Microsoft.Search/searchServices",
        api_version: "2023-11-01",
        depends_on: &[ResourceKind::ResourceGroup],
        optional: true,
        credential_probe: Some(CredentialProbe {
            action: "listAdminKeys",
            pointer: "/primaryKey",
            label: "Search admin key",
            severity: ProbeSeverity::Fail,
        }),
    },
];

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::ResourceGroup,
        ResourceKind::KeyVault,
        ResourceKind::AiServices,
        ResourceKind::ContainerRegistry,
        ResourceKind::StorageAccount,
        ResourceKind::LogWorkspace,
        ResourceKind::AppInsights,
        ResourceKind::SearchService,
    ];

    pub fn spec(self) -> &'static KindSpec {
        let spec = &KIND_SPECS[self as usize];
        debug_assert_eq!(spec.kind, self);
        spec
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn setting(self) -> &'static str {
        self.spec().setting
    }

    /// ARM provider namespace, e.g. `Microsoft.KeyVault`.
    pub fn namespace(self) -> &'static str {
        self.spec()
            .arm_type
            .split_once('/')
            .map(|(namespace, _)| namespace)
            .unwrap_or(self.spec().arm_type)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A resource to ensure, derived once from the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub name: String,
    pub region: String,
    pub resource_group: String,
    pub depends_on: Vec<ResourceKind>,
}

impl ResourceDescriptor {
    pub fn api_version(&self) -> &'static str {
        self.kind.spec().api_version
    }
}
