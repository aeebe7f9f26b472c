//! Quick inventory of a resource group against the expected resource set.
use crate::plan::DeploymentPlan;
use crate::provider::ResourceSummary;
use crate::resource::ResourceKind;
use serde::Serialize;

/// Types Azure creates alongside Application Insights.
pub const AUTO_CREATED_TYPES: &[&str] = &[
    "microsoft.alertsmanagement/smartdetectoralertrules",
    "microsoft.insights/actiongroups",
    "microsoft.insights/webtests",
    "microsoft.insights/workbooks",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Found,
    Missing,
    /// The type exists, but under other names.
    FoundInstead,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    pub kind: ResourceKind,
    pub resource_type: String,
    pub expected_name: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub found_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub resource_group: String,
    pub total_listed: usize,
    pub entries: Vec<InventoryEntry>,
    pub auto_created: Vec<ResourceSummary>,
    pub unexpected: Vec<ResourceSummary>,
    pub success: bool,
}

/// Compare a group listing with the planned resources.
pub fn compare(plan: &DeploymentPlan, listed: &[ResourceSummary]) -> InventoryReport {
    let entries: Vec<InventoryEntry> = plan
        .resources
        .iter()
        .filter(|desc| desc.kind != ResourceKind::ResourceGroup)
        .map(|desc| {
            let resource_type = desc.kind.spec().arm_type;
            let same_type: Vec<&ResourceSummary> = listed
                .iter()
                .filter(|r| r.resource_type.eq_ignore_ascii_case(resource_type))
                .collect();
            let (status, found_names) = if same_type.iter().any(|r| r.name == desc.name) {
                (EntryStatus::Found, Vec::new())
            } else if same_type.is_empty() {
                (EntryStatus::Missing, Vec::new())
            } else {
                (
                    EntryStatus::FoundInstead,
                    same_type.iter().map(|r| r.name.clone()).collect(),
                )
            };
            InventoryEntry {
                kind: desc.kind,
                resource_type: resource_type.to_string(),
                expected_name: desc.name.clone(),
                status,
                found_names,
            }
        })
        .collect();

    let mut auto_created = Vec::new();
    let mut unexpected = Vec::new();
    for resource in listed {
        let lowered = resource.resource_type.to_ascii_lowercase();
        let expected = entries
            .iter()
            .any(|e| e.resource_type.eq_ignore_ascii_case(&lowered));
        if expected {
            continue;
        }
        if AUTO_CREATED_TYPES.contains(&lowered.as_str()) {
            auto_created.push(resource.clone());
        } else {
            unexpected.push(resource.clone());
        }
    }

    let success = entries.iter().all(|e| e.status == EntryStatus::Found);
    InventoryReport {
        resource_group: plan.resource_group.clone(),
        total_listed: listed.len(),
        entries,
        auto_created,
        unexpected,
        success,
    }
}
