//! Thin wrapper over the Azure CLI for identity and access tokens.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Overrides how `az` is invoked, e.g. `FOUNDRY_AZ_COMMAND="az --only-show-errors"`.
pub const AZ_COMMAND_ENV: &str = "FOUNDRY_AZ_COMMAND";

#[derive(Debug, Deserialize)]
pub struct AzAccount {
    pub id: String,
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    pub user: AzUser,
}

#[derive(Debug, Deserialize)]
pub struct AzUser {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct AzToken {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct AzCli {
    argv: Vec<String>,
}

impl AzCli {
    /// Resolve the CLI from `FOUNDRY_AZ_COMMAND` or `PATH`.
    pub fn locate() -> Result<Self> {
        if let Ok(command) = std::env::var(AZ_COMMAND_ENV) {
            let argv = shell_words::split(&command)
                .with_context(|| format!("parse {AZ_COMMAND_ENV}: {command}"))?;
            if argv.is_empty() {
                return Err(anyhow!("{AZ_COMMAND_ENV} is empty"));
            }
            return Ok(Self { argv });
        }
        let program: PathBuf = which::which("az")
            .or_else(|_| which::which("az.cmd"))
            .context("locate Azure CLI (install `az` or set FOUNDRY_AZ_COMMAND)")?;
        Ok(Self {
            argv: vec![program.display().to_string()],
        })
    }

    fn run_json(&self, args: &[&str]) -> Result<Value> {
        let (program, base) = self
            .argv
            .split_first()
            .ok_or_else(|| anyhow!("Azure CLI command is empty"))?;
        debug!(args = %args.join(" "), "az");
        let output = Command::new(program)
            .args(base)
            .args(args)
            .args(["--output", "json"])
            .output()
            .with_context(|| format!("run az {}", args.join(" ")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "az {} failed with status {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            ));
        }
        serde_json::from_slice(&output.stdout)
            .with_context(|| format!("parse output of az {}", args.join(" ")))
    }

    pub fn account(&self) -> Result<AzAccount> {
        let value = self.run_json(&["account", "show"])?;
        serde_json::from_value(value).context("decode az account show")
    }

    /// Object id of the signed-in user or service principal.
    pub fn principal_object_id(&self, account: &AzAccount) -> Result<String> {
        let value = if account.user.kind.eq_ignore_ascii_case("servicePrincipal") {
            self.run_json(&["ad", "sp", "show", "--id", &account.user.name, "--query", "id"])?
        } else {
            self.run_json(&["ad", "signed-in-user", "show", "--query", "id"])?
        };
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("az returned no principal object id"))
    }

    pub fn access_token(&self, resource: &str, tenant: Option<&str>) -> Result<String> {
        let mut args = vec!["account", "get-access-token", "--resource", resource];
        if let Some(tenant) = tenant {
            args.extend(["--tenant", tenant]);
        }
        let value = self.run_json(&args)?;
        let token: AzToken = serde_json::from_value(value).context("decode access token")?;
        Ok(token.access_token)
    }
}
