use crate::azure::Timeouts;
use crate::cli::{SettingsArgs, DEFAULT_ENV_FILE};
use crate::config::{self, DeploymentConfig};
use crate::paths::OutputPaths;
use crate::plan::{build_plan, DeploymentPlan};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Everything a command needs before it talks to Azure.
pub(crate) struct RunContext {
    pub(crate) paths: OutputPaths,
    pub(crate) config: DeploymentConfig,
    pub(crate) plan: DeploymentPlan,
    pub(crate) timeouts: Timeouts,
    pub(crate) json: bool,
}

impl RunContext {
    /// Collect settings, validate them in one batch, and derive the plan.
    pub(crate) fn load(args: &SettingsArgs) -> Result<Self> {
        let (env_file, required) = match &args.env_file {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_ENV_FILE), false),
        };
        let user_file = config::default_user_settings_path();
        let settings = config::collect_settings(
            user_file.as_deref(),
            Some(&env_file),
            required,
            |key| std::env::var(key).ok(),
        )?;
        let config = config::load_config(&settings)?;
        let plan = build_plan(&config);
        debug!(
            resources = plan.resources.len(),
            secrets = plan.secrets.len(),
            "plan built"
        );
        Ok(Self {
            paths: OutputPaths::new(args.output.out_dir.clone()),
            config,
            plan,
            timeouts: Timeouts {
                request: Duration::from_secs(args.timeout_secs),
                operation: Duration::from_secs(args.operation_timeout_secs),
            },
            json: args.output.json,
        })
    }
}
