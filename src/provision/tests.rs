use super::*;
use crate::model::{OutcomeStatus, SecretStatus};
use crate::plan::{build_plan, fixtures};
use crate::provider::fake::{FakeCloud, SUBSCRIPTION};
use crate::provider::{
    ProviderError, ProviderResult, ResourceState, ResourceSummary, RoleAssignment,
    RoleAssignmentRequest,
};
use serde_json::Value;

fn identity() -> Identity {
    Identity {
        subscription_id: SUBSCRIPTION.to_string(),
        tenant_id: "tenant".to_string(),
        principal_id: "11111111-2222-4333-8444-555555555555".to_string(),
        principal_type: "User".to_string(),
    }
}

fn run(cloud: &FakeCloud, with_search: bool) -> DeploymentReport {
    let plan = build_plan(&fixtures::config(with_search));
    let identity = identity();
    Orchestrator::new(cloud, cloud, &identity, CancelFlag::new())
        .run(&plan)
        .expect("run")
}

fn status_of(report: &DeploymentReport, kind: ResourceKind) -> OutcomeStatus {
    report.outcome(kind).expect("outcome").status
}

fn error_kind_of(report: &DeploymentReport, kind: ResourceKind) -> ProvisioningErrorKind {
    report
        .outcome(kind)
        .and_then(|o| o.error.as_ref())
        .expect("error")
        .kind
}

fn conflict(code: &str) -> ProviderError {
    ProviderError::http(409, Some(code.to_string()), "name in use")
}

#[test]
fn fresh_run_creates_every_resource() {
    let cloud = FakeCloud::new();
    let report = run(&cloud, false);

    assert!(report.success);
    assert_eq!(report.resources.len(), 7);
    assert_eq!(report.count(OutcomeStatus::Created), 7);
    assert!(report
        .secrets
        .iter()
        .all(|s| s.status == SecretStatus::Published));
    assert_eq!(report.roles[0].status, RoleStatus::Assigned);
    assert_eq!(
        cloud.secret("kv-foundry", "ai-services-endpoint").as_deref(),
        Some("https://ai-foundry.cognitiveservices.azure.com/")
    );
    assert_eq!(
        cloud.secret("kv-foundry", "ai-services-key").as_deref(),
        Some("ai-key1-ai-foundry")
    );
}

#[test]
fn second_run_changes_nothing() {
    let cloud = FakeCloud::new();
    run(&cloud, true);
    cloud.clear_calls();

    let report = run(&cloud, true);

    assert!(report.success);
    assert_eq!(report.count(OutcomeStatus::Created), 0);
    assert_eq!(report.count(OutcomeStatus::AlreadyExists), 8);
    assert_eq!(cloud.create_count(), 0);
    assert_eq!(cloud.calls_starting_with("set_secret"), 0);
    assert_eq!(cloud.calls_starting_with("create_role"), 0);
    assert!(report
        .secrets
        .iter()
        .all(|s| s.status == SecretStatus::Unchanged));
    assert_eq!(report.roles[0].status, RoleStatus::AlreadyAssigned);
    assert_eq!(cloud.role_assignment_count(), 1);
}

#[test]
fn telemetry_waits_for_workspace() {
    let cloud = FakeCloud::new();
    cloud.fail_create(
        ResourceKind::LogWorkspace,
        ProviderError::http(400, Some("QuotaExceeded".to_string()), "workspace quota"),
    );

    let report = run(&cloud, false);

    assert!(!report.success);
    assert_eq!(
        error_kind_of(&report, ResourceKind::LogWorkspace),
        ProvisioningErrorKind::QuotaExceeded
    );
    assert_eq!(
        error_kind_of(&report, ResourceKind::AppInsights),
        ProvisioningErrorKind::DependencyUnavailable
    );
    assert!(!cloud
        .calls()
        .iter()
        .any(|call| call.starts_with("create AppInsights")));
    assert!(!cloud.calls().iter().any(|call| call.starts_with("get AppInsights")));
}

#[test]
fn one_failure_does_not_stop_independent_resources() {
    let cloud = FakeCloud::new();
    cloud.fail_create(ResourceKind::ContainerRegistry, conflict("AlreadyInUse"));

    let report = run(&cloud, false);

    assert!(!report.success);
    assert_eq!(
        error_kind_of(&report, ResourceKind::ContainerRegistry),
        ProvisioningErrorKind::NameConflict
    );
    for kind in [
        ResourceKind::ResourceGroup,
        ResourceKind::KeyVault,
        ResourceKind::AiServices,
        ResourceKind::StorageAccount,
        ResourceKind::LogWorkspace,
        ResourceKind::AppInsights,
    ] {
        assert_eq!(status_of(&report, kind), OutcomeStatus::Created, "{kind:?}");
    }
    assert!(report
        .secrets
        .iter()
        .all(|s| s.status == SecretStatus::Published));

    cloud.clear_failures();
    let rerun = run(&cloud, false);
    assert!(rerun.success);
    assert_eq!(
        status_of(&rerun, ResourceKind::ContainerRegistry),
        OutcomeStatus::Created
    );
    assert_eq!(rerun.count(OutcomeStatus::AlreadyExists), 6);
}

#[test]
fn conflict_with_matching_resource_counts_as_existing() {
    let cloud = FakeCloud::new();
    cloud.conflict_on_create(ResourceKind::StorageAccount);

    let report = run(&cloud, false);

    assert!(report.success);
    assert_eq!(
        status_of(&report, ResourceKind::StorageAccount),
        OutcomeStatus::AlreadyExists
    );
    let storage = report.outcome(ResourceKind::StorageAccount).expect("storage");
    assert!(storage.identifier("blob_endpoint").is_some());
}

#[test]
fn mismatched_vault_is_reported_and_gates_secrets() {
    let cloud = FakeCloud::new();
    cloud.seed(ResourceKind::KeyVault, "kv-foundry", "westus", None);

    let report = run(&cloud, false);

    assert!(!report.success);
    let vault = report.outcome(ResourceKind::KeyVault).expect("vault");
    assert_eq!(vault.status, OutcomeStatus::ConfigurationMismatch);
    assert_eq!(vault.mismatches[0].field, "location");
    assert_eq!(vault.mismatches[0].observed, "westus");
    assert!(!cloud.calls().iter().any(|c| c == "create KeyVault kv-foundry"));
    for secret in &report.secrets {
        assert_eq!(secret.status, SecretStatus::Failed);
        assert_eq!(
            secret.error.as_ref().map(|e| e.kind),
            Some(ProvisioningErrorKind::DependencyUnavailable)
        );
    }
    assert_eq!(cloud.calls_starting_with("set_secret"), 0);
    assert_eq!(
        status_of(&report, ResourceKind::AiServices),
        OutcomeStatus::Created
    );
}

#[test]
fn resource_group_failure_blocks_everything() {
    let cloud = FakeCloud::new();
    cloud.fail_create(
        ResourceKind::ResourceGroup,
        ProviderError::http(403, Some("AuthorizationFailed".to_string()), "denied"),
    );

    let report = run(&cloud, false);

    assert_eq!(
        error_kind_of(&report, ResourceKind::ResourceGroup),
        ProvisioningErrorKind::Unauthorized
    );
    for outcome in report.resources.iter().skip(1) {
        assert_eq!(
            outcome.error.as_ref().map(|e| e.kind),
            Some(ProvisioningErrorKind::DependencyUnavailable)
        );
    }
    assert_eq!(cloud.create_count(), 1);
    assert_eq!(report.roles[0].status, RoleStatus::Failed);
    assert_eq!(cloud.calls_starting_with("list_roles"), 0);
}

#[test]
fn existing_role_assignment_conflict_is_not_a_failure() {
    let cloud = FakeCloud::new();
    cloud.fail_role_create(conflict("RoleAssignmentExists"));

    let report = run(&cloud, false);

    assert!(report.success);
    assert_eq!(report.roles[0].status, RoleStatus::AlreadyAssigned);
}

#[test]
fn role_assignment_name_is_stable_across_runs() {
    let first = FakeCloud::new();
    run(&first, false);
    let second = FakeCloud::new();
    run(&second, false);
    let name_of = |cloud: &FakeCloud| {
        cloud
            .calls()
            .into_iter()
            .find(|call| call.starts_with("create_role"))
            .expect("create_role call")
    };
    assert_eq!(name_of(&first), name_of(&second));
}

#[test]
fn secret_values_never_reach_the_report() {
    let cloud = FakeCloud::new();
    let report = run(&cloud, true);
    let json = serde_json::to_string(&report).expect("serialize report");
    assert!(!json.contains("ai-key1-ai-foundry"));
    assert!(!json.contains("search-key-srch-foundry"));
    assert!(!json.contains("InstrumentationKey"));
}

#[test]
fn secret_write_failure_is_a_warning_and_a_failure() {
    let cloud = FakeCloud::new();
    cloud.fail_set_secret("ai-services-key");

    let report = run(&cloud, false);

    assert!(!report.success);
    assert_eq!(report.secrets[0].status, SecretStatus::Failed);
    assert_eq!(report.secrets[1].status, SecretStatus::Published);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("ai-services-key")));
}

#[test]
fn provider_registration_failure_only_warns() {
    let cloud = FakeCloud::new();
    cloud.fail_register("Microsoft.ContainerRegistry");

    let report = run(&cloud, false);

    assert!(report.success);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Microsoft.ContainerRegistry"));
}

struct CancelAfter<'a> {
    inner: &'a FakeCloud,
    flag: CancelFlag,
    after: ResourceKind,
}

impl ControlPlane for CancelAfter<'_> {
    fn get_resource(&self, desc: &ResourceDescriptor) -> ProviderResult<Option<ResourceState>> {
        self.inner.get_resource(desc)
    }

    fn create_resource(
        &self,
        desc: &ResourceDescriptor,
        body: &Value,
    ) -> ProviderResult<ResourceState> {
        let created = self.inner.create_resource(desc, body);
        if desc.kind == self.after {
            self.flag.cancel();
        }
        created
    }

    fn invoke_action(&self, desc: &ResourceDescriptor, action: &str) -> ProviderResult<Value> {
        self.inner.invoke_action(desc, action)
    }

    fn list_role_assignments(
        &self,
        scope: &str,
        principal_id: &str,
    ) -> ProviderResult<Vec<RoleAssignment>> {
        self.inner.list_role_assignments(scope, principal_id)
    }

    fn create_role_assignment(
        &self,
        request: &RoleAssignmentRequest,
    ) -> ProviderResult<RoleAssignment> {
        self.inner.create_role_assignment(request)
    }

    fn list_group_resources(&self, resource_group: &str) -> ProviderResult<Vec<ResourceSummary>> {
        self.inner.list_group_resources(resource_group)
    }

    fn register_provider(&self, namespace: &str) -> ProviderResult<()> {
        self.inner.register_provider(namespace)
    }
}

#[test]
fn interrupt_stops_before_next_step_and_keeps_created_resources() {
    let cloud = FakeCloud::new();
    let flag = CancelFlag::new();
    let plane = CancelAfter {
        inner: &cloud,
        flag: flag.clone(),
        after: ResourceKind::KeyVault,
    };
    let plan = build_plan(&fixtures::config(false));
    let identity = identity();

    let report = Orchestrator::new(&plane, &cloud, &identity, flag)
        .run(&plan)
        .expect("run");

    assert!(report.cancelled);
    assert!(!report.success);
    assert_eq!(report.resources.len(), 2);
    assert!(report.secrets.is_empty());
    assert!(report.roles.is_empty());
    assert!(cloud.has(ResourceKind::KeyVault));
    assert!(!cloud.has(ResourceKind::AiServices));
    assert!(report.warnings.iter().any(|w| w.contains("AI Services")));
}

#[test]
fn search_adds_resource_and_secrets() {
    let cloud = FakeCloud::new();
    let report = run(&cloud, true);
    assert!(report.success);
    assert_eq!(report.count(OutcomeStatus::Created), 8);
    assert_eq!(report.secrets.len(), 4);
    assert_eq!(
        cloud.secret("kv-foundry", "search-service-endpoint").as_deref(),
        Some("https://srch-foundry.search.windows.net/")
    );
}

#[test]
fn provisioned_group_passes_inventory_check() {
    let cloud = FakeCloud::new();
    let plan = build_plan(&fixtures::config(false));
    run(&cloud, false);
    cloud.add_unlisted_resource(
        "Failure Anomalies - appi-foundry",
        "microsoft.alertsmanagement/smartDetectorAlertRules",
    );
    cloud.add_unlisted_resource("vm1", "Microsoft.Compute/virtualMachines");

    let listed = cloud.list_group_resources("rg-foundry").expect("list");
    let inventory = crate::inventory::compare(&plan, &listed);

    assert!(inventory.success);
    assert_eq!(inventory.auto_created.len(), 1);
    assert_eq!(inventory.unexpected.len(), 1);
}
