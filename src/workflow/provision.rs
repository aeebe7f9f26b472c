//! Workflow provision step.
//!
//! Dry runs stop after configuration, print the plan, and persist a report
//! with no outcomes. Full runs ensure
//! every entity, validate independently, and persist both reports.
use super::context::RunContext;
use super::{print_json, record_history, HistoryRecord};
use crate::azure::AzureSession;
use crate::cli::ProvisionArgs;
use crate::interrupt::CancelFlag;
use crate::model::{DeploymentReport, ValidationSummary};
use crate::provision::Orchestrator;
use crate::report::{render_plan, render_report, render_validation, write_json};
use crate::util::now_epoch_ms;
use crate::validate::Validator;
use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct ProvisionOutput<'a> {
    report: &'a DeploymentReport,
    validation: Option<&'a ValidationSummary>,
}

/// Run the provision step; fails unless every entity and check succeeded.
pub(crate) fn run_provision(args: &ProvisionArgs) -> Result<()> {
    let started = now_epoch_ms()?;
    let ctx = RunContext::load(&args.settings)?;

    if args.dry_run {
        let planned = DeploymentReport::planned(&ctx.plan, started);
        write_json(&ctx.paths.summary_path(), &planned)?;
        if ctx.json {
            print_json(&ctx.plan)?;
        } else {
            println!("{}", render_plan(&ctx.plan));
            eprintln!("wrote {}", ctx.paths.summary_path().display());
        }
        return record_history(
            &ctx.paths,
            HistoryRecord {
                command: "provision",
                started_at_epoch_ms: started,
                success: true,
                dry_run: true,
                message: format!("planned {} resources", ctx.plan.resources.len()),
            },
        );
    }

    let session = AzureSession::connect(&ctx.config, ctx.timeouts)?;
    let cancel = CancelFlag::for_process();
    let report = Orchestrator::new(&session.arm, &session.vault, &session.identity, cancel)
        .run(&ctx.plan)?;
    write_json(&ctx.paths.summary_path(), &report)?;

    let validation = if report.cancelled {
        info!("validation skipped after interrupt");
        None
    } else {
        let summary =
            Validator::new(&session.arm, &session.vault, &session.identity).run(&ctx.plan)?;
        write_json(&ctx.paths.validation_path(), &summary)?;
        Some(summary)
    };

    if ctx.json {
        print_json(&ProvisionOutput {
            report: &report,
            validation: validation.as_ref(),
        })?;
    } else {
        println!("{}", render_report(&report));
        if let Some(summary) = &validation {
            println!("{}", render_validation(summary));
        }
        eprintln!("wrote {}", ctx.paths.summary_path().display());
        if validation.is_some() {
            eprintln!("wrote {}", ctx.paths.validation_path().display());
        }
        eprintln!("log {}", ctx.paths.log_path().display());
    }

    let validated = validation.as_ref().is_some_and(|summary| summary.success);
    let success = report.success && validated;
    let message = if report.cancelled {
        "interrupted".to_string()
    } else {
        format!(
            "{} resources, {} secrets, {} roles",
            report.resources.len(),
            report.secrets.len(),
            report.roles.len()
        )
    };
    record_history(
        &ctx.paths,
        HistoryRecord {
            command: "provision",
            started_at_epoch_ms: started,
            success,
            dry_run: false,
            message,
        },
    )?;

    if !success {
        return Err(anyhow!(
            "provisioning did not complete successfully (see {})",
            ctx.paths.summary_path().display()
        ));
    }
    Ok(())
}
