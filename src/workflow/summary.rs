//! Workflow summary step: render persisted artifacts without calling Azure.
use super::{print_json, record_history, HistoryRecord};
use crate::cli::SummaryArgs;
use crate::model::{DeploymentReport, ValidationSummary};
use crate::paths::OutputPaths;
use crate::report::{load_json_optional, render_report, render_validation};
use crate::util::now_epoch_ms;
use anyhow::{anyhow, Result};
use serde::Serialize;

#[derive(Serialize)]
struct SummaryOutput {
    deployment: Option<DeploymentReport>,
    validation: Option<ValidationSummary>,
}

pub(crate) fn run_summary(args: &SummaryArgs) -> Result<()> {
    let started = now_epoch_ms()?;
    let paths = OutputPaths::new(args.output.out_dir.clone());
    let deployment: Option<DeploymentReport> = load_json_optional(&paths.summary_path())?;
    let validation: Option<ValidationSummary> = load_json_optional(&paths.validation_path())?;

    if deployment.is_none() && validation.is_none() {
        return Err(anyhow!(
            "no deployment summary or validation report in {} (run `foundry provision` first)",
            paths.root().display()
        ));
    }

    let success = deployment.as_ref().is_some_and(|r| r.success)
        && validation.as_ref().is_some_and(|v| v.success);

    if args.output.json {
        print_json(&SummaryOutput {
            deployment,
            validation,
        })?;
    } else {
        match &deployment {
            Some(report) => println!("{}", render_report(report)),
            None => println!("deployment: not found ({})", paths.summary_path().display()),
        }
        match &validation {
            Some(summary) => println!("{}", render_validation(summary)),
            None => println!("validation: not found ({})", paths.validation_path().display()),
        }
    }

    record_history(
        &paths,
        HistoryRecord {
            command: "summary",
            started_at_epoch_ms: started,
            success: true,
            dry_run: false,
            message: format!("overall {}", if success { "succeeded" } else { "not successful" }),
        },
    )
}
