//! Workflow check step: one listing call, compared with the plan.
use super::context::RunContext;
use super::{print_json, record_history, HistoryRecord};
use crate::azure::AzureSession;
use crate::cli::CheckArgs;
use crate::inventory::{compare, EntryStatus};
use crate::provider::ControlPlane;
use crate::report::render_inventory;
use crate::util::now_epoch_ms;
use anyhow::{anyhow, Result};
use tracing::warn;

pub(crate) fn run_check(args: &CheckArgs) -> Result<()> {
    let started = now_epoch_ms()?;
    let ctx = RunContext::load(&args.settings)?;
    let session = AzureSession::connect(&ctx.config, ctx.timeouts)?;

    let listed = match session.arm.list_group_resources(&ctx.plan.resource_group) {
        Ok(listed) => listed,
        Err(err) if err.status == Some(404) => {
            warn!(resource_group = %ctx.plan.resource_group, "resource group not found");
            Vec::new()
        }
        Err(err) => {
            return Err(anyhow!(
                "list resource group {}: {err}",
                ctx.plan.resource_group
            ));
        }
    };
    let report = compare(&ctx.plan, &listed);

    if ctx.json {
        print_json(&report)?;
    } else {
        println!("{}", render_inventory(&report));
    }

    let missing = report
        .entries
        .iter()
        .filter(|entry| entry.status != EntryStatus::Found)
        .count();
    record_history(
        &ctx.paths,
        HistoryRecord {
            command: "check",
            started_at_epoch_ms: started,
            success: report.success,
            dry_run: false,
            message: format!("{} listed, {missing} missing", report.total_listed),
        },
    )?;

    if !report.success {
        return Err(anyhow!("{missing} expected resource(s) missing"));
    }
    Ok(())
}
