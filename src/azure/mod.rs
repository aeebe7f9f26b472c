//! Azure-backed implementations of the provider traits.
//!
//! Identity and tokens come from the Azure CLI; all resource traffic goes
//! over HTTPS to ARM and the Key Vault data plane.
mod arm;
mod cli;
mod http;
mod keyvault;

use crate::config::DeploymentConfig;
use crate::provider::Identity;
use anyhow::{Context, Result};
use arm::ArmClient;
use cli::AzCli;
use http::HttpClient;
use keyvault::VaultSecretClient;
use std::time::Duration;
use tracing::info;

const ARM_RESOURCE: &str = "https://management.azure.com/";
const VAULT_RESOURCE: &str = "https://vault.azure.net";

/// Request and long-running-operation bounds.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub request: Duration,
    pub operation: Duration,
}

/// Authenticated clients plus the resolved caller identity.
pub struct AzureSession {
    pub identity: Identity,
    pub arm: ArmClient,
    pub vault: VaultSecretClient,
}

impl AzureSession {
    /// Resolve identity through `az` and build clients; configured identity
    /// overrides win over what the CLI reports.
    pub fn connect(config: &DeploymentConfig, timeouts: Timeouts) -> Result<Self> {
        let az = AzCli::locate()?;
        let account = az.account().context("read Azure CLI account (run `az login`)")?;
        let principal_id = match &config.principal_object_id {
            Some(id) => id.clone(),
            None => az
                .principal_object_id(&account)
                .context("resolve signed-in principal object id")?,
        };
        let principal_type = if account.user.kind.eq_ignore_ascii_case("servicePrincipal") {
            "ServicePrincipal"
        } else {
            "User"
        };
        let identity = Identity {
            subscription_id: config
                .subscription_id
                .clone()
                .unwrap_or_else(|| account.id.clone()),
            tenant_id: config
                .tenant_id
                .clone()
                .unwrap_or_else(|| account.tenant_id.clone()),
            principal_id,
            principal_type: principal_type.to_string(),
        };
        info!(
            subscription = %identity.subscription_id,
            principal = %identity.principal_id,
            "azure identity resolved"
        );

        let tenant = config.tenant_id.as_deref();
        let arm_token = az
            .access_token(ARM_RESOURCE, tenant)
            .context("acquire management token")?;
        let vault_token = az
            .access_token(VAULT_RESOURCE, tenant)
            .context("acquire key vault token")?;

        Ok(Self {
            arm: ArmClient::new(
                HttpClient::new(&arm_token, timeouts.request),
                &identity.subscription_id,
                timeouts.operation,
            ),
            vault: VaultSecretClient::new(HttpClient::new(&vault_token, timeouts.request)),
            identity,
        })
    }
}
