//! Workflow validate step.
use super::context::RunContext;
use super::{print_json, record_history, HistoryRecord};
use crate::azure::AzureSession;
use crate::cli::ValidateArgs;
use crate::report::{render_validation, write_json};
use crate::util::now_epoch_ms;
use crate::validate::Validator;
use anyhow::{anyhow, Result};

/// Run the validator and write `foundry_validation_report.json`.
pub(crate) fn run_validate(args: &ValidateArgs) -> Result<()> {
    let started = now_epoch_ms()?;
    let ctx = RunContext::load(&args.settings)?;
    let session = AzureSession::connect(&ctx.config, ctx.timeouts)?;
    let summary = Validator::new(&session.arm, &session.vault, &session.identity).run(&ctx.plan)?;
    write_json(&ctx.paths.validation_path(), &summary)?;

    if ctx.json {
        print_json(&summary)?;
    } else {
        println!("{}", render_validation(&summary));
        eprintln!("wrote {}", ctx.paths.validation_path().display());
    }

    record_history(
        &ctx.paths,
        HistoryRecord {
            command: "validate",
            started_at_epoch_ms: started,
            success: summary.success,
            dry_run: false,
            message: format!(
                "{} passed, {} failed, {} warnings",
                summary.passed, summary.failed, summary.warnings
            ),
        },
    )?;

    if !summary.success {
        return Err(anyhow!("{} validation check(s) failed", summary.failed));
    }
    Ok(())
}
