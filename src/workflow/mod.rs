//! Workflow steps behind each CLI command.
//!
//! Each step loads its context, does its work through the provider traits,
//! persists artifacts, and appends one history line.
mod check;
mod context;
mod provision;
mod summary;
mod validate;

pub(crate) use check::run_check;
pub(crate) use provision::run_provision;
pub(crate) use summary::run_summary;
pub(crate) use validate::run_validate;

use crate::model::HistoryEntry;
use crate::paths::OutputPaths;
use crate::report::append_history;
use crate::util::now_epoch_ms;
use anyhow::{Context, Result};
use serde::Serialize;

pub(crate) struct HistoryRecord<'a> {
    pub(crate) command: &'a str,
    pub(crate) started_at_epoch_ms: u128,
    pub(crate) success: bool,
    pub(crate) dry_run: bool,
    pub(crate) message: String,
}

pub(crate) fn record_history(paths: &OutputPaths, record: HistoryRecord<'_>) -> Result<()> {
    let entry = HistoryEntry {
        command: record.command.to_string(),
        started_at_epoch_ms: record.started_at_epoch_ms,
        finished_at_epoch_ms: now_epoch_ms()?,
        success: record.success,
        dry_run: record.dry_run,
        message: record.message,
    };
    append_history(&paths.history_path(), &entry)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}
