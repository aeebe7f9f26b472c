//! Text rendering for plans, reports, validation, and inventory.
//!
//! Everything here is a pure function of its input; callers decide where the
//! text goes.
use super::hints::remediation;
use crate::config::rule_for;
use crate::inventory::{EntryStatus, InventoryReport};
use crate::model::{
    CheckStatus, DeploymentReport, OutcomeError, OutcomeStatus, ProvisioningOutcome, RoleStatus,
    SecretStatus, ValidationSummary,
};
use crate::plan::DeploymentPlan;

pub fn render_plan(plan: &DeploymentPlan) -> String {
    let mut lines = vec![
        "plan: dry run (no changes made)".to_string(),
        format!("resource group: {}", plan.resource_group),
        format!("location: {}", plan.location),
        "resources:".to_string(),
    ];
    for desc in &plan.resources {
        let deps: Vec<&str> = desc.depends_on.iter().map(|k| k.label()).collect();
        let after = if deps.is_empty() {
            String::new()
        } else {
            format!(" (after {})", deps.join(", "))
        };
        let scope = if rule_for(desc.kind).globally_unique {
            " [global name]"
        } else {
            ""
        };
        lines.push(format!("  - {}: {}{after}{scope}", desc.kind, desc.name));
    }
    lines.push("secrets:".to_string());
    for secret in &plan.secrets {
        lines.push(format!("  - {} (from {})", secret.name, secret.source));
    }
    lines.push("roles:".to_string());
    for role in &plan.roles {
        lines.push(format!(
            "  - {} ({}) at resource group scope",
            role.role_name, role.role_definition_id
        ));
    }
    lines.push(format!("providers: {}", plan.provider_namespaces.join(", ")));
    lines.join("\n")
}

fn status_text(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Created => "created",
        OutcomeStatus::AlreadyExists => "already exists",
        OutcomeStatus::ConfigurationMismatch => "configuration mismatch",
        OutcomeStatus::Failed => "FAILED",
    }
}

fn push_outcome(lines: &mut Vec<String>, outcome: &ProvisioningOutcome) {
    lines.push(format!(
        "  - {}: {} ({})",
        outcome.kind,
        outcome.name,
        status_text(outcome.status)
    ));
    for mismatch in &outcome.mismatches {
        lines.push(format!(
            "      {}: desired {}, found {}",
            mismatch.field, mismatch.desired, mismatch.observed
        ));
    }
    if let Some(err) = &outcome.error {
        push_error(lines, err);
    }
}

fn push_error(lines: &mut Vec<String>, err: &OutcomeError) {
    lines.push(format!("      error ({}): {}", err.kind, err.message));
    lines.push(format!("      hint: {}", remediation(err.kind)));
}

pub fn render_report(report: &DeploymentReport) -> String {
    let verdict = if report.dry_run {
        "dry run (no changes made)"
    } else if report.success {
        "succeeded"
    } else if report.cancelled {
        "interrupted"
    } else {
        "failed"
    };
    let mut lines = vec![
        format!("deployment: {verdict}"),
        format!("resource group: {}", report.resource_group),
        format!("location: {}", report.location),
        format!(
            "resources: {} created, {} existing, {} mismatched, {} failed",
            report.count(OutcomeStatus::Created),
            report.count(OutcomeStatus::AlreadyExists),
            report.count(OutcomeStatus::ConfigurationMismatch),
            report.count(OutcomeStatus::Failed)
        ),
    ];
    for outcome in &report.resources {
        push_outcome(&mut lines, outcome);
    }
    if !report.secrets.is_empty() {
        lines.push("secrets:".to_string());
        for secret in &report.secrets {
            let status = match secret.status {
                SecretStatus::Published => "published",
                SecretStatus::Unchanged => "unchanged",
                SecretStatus::Failed => "FAILED",
            };
            lines.push(format!("  - {}: {status}", secret.name));
            if let Some(err) = &secret.error {
                push_error(&mut lines, err);
            }
        }
    }
    if !report.roles.is_empty() {
        lines.push("roles:".to_string());
        for role in &report.roles {
            let status = match role.status {
                RoleStatus::Assigned => "assigned",
                RoleStatus::AlreadyAssigned => "already assigned",
                RoleStatus::Failed => "FAILED",
            };
            lines.push(format!("  - {}: {status}", role.role_name));
            if let Some(err) = &role.error {
                push_error(&mut lines, err);
            }
        }
    }
    if !report.warnings.is_empty() {
        lines.push("warnings:".to_string());
        for warning in &report.warnings {
            lines.push(format!("  - {warning}"));
        }
    }
    lines.join("\n")
}

pub fn render_validation(summary: &ValidationSummary) -> String {
    let mut lines = vec![format!(
        "validation: {} ({} checks, {} passed, {} failed, {} warnings, {:.1}% success)",
        if summary.success { "passed" } else { "failed" },
        summary.total,
        summary.passed,
        summary.failed,
        summary.warnings,
        summary.success_rate
    )];
    for check in &summary.checks {
        let marker = match check.status {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Warning => "WARN",
        };
        lines.push(format!(
            "  {marker} {}/{}: {}",
            check.category, check.name, check.message
        ));
    }
    lines.join("\n")
}

pub fn render_inventory(report: &InventoryReport) -> String {
    let mut lines = vec![
        format!("resource group: {}", report.resource_group),
        format!("listed: {}", report.total_listed),
        "expected:".to_string(),
    ];
    for entry in &report.entries {
        let state = match entry.status {
            EntryStatus::Found => "found".to_string(),
            EntryStatus::Missing => "MISSING".to_string(),
            EntryStatus::FoundInstead => {
                format!("MISSING (found instead: {})", entry.found_names.join(", "))
            }
        };
        lines.push(format!("  - {}: {} {state}", entry.kind, entry.expected_name));
    }
    if !report.auto_created.is_empty() {
        lines.push(format!(
            "auto-created: {}",
            report
                .auto_created
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if !report.unexpected.is_empty() {
        lines.push("unexpected:".to_string());
        for resource in &report.unexpected {
            lines.push(format!("  - {} ({})", resource.name, resource.resource_type));
        }
    }
    lines.join("\n")
}
