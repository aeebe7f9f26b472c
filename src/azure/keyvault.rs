//! Key Vault secrets data plane.
use super::http::HttpClient;
use crate::provider::{ProviderError, ProviderResult, SecretStore, SecretValue};
use serde_json::{json, Value};

const SECRETS_API_VERSION: &str = "7.4";

pub struct VaultSecretClient {
    http: HttpClient,
}

impl VaultSecretClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

fn secret_url(vault: &str, name: &str) -> String {
    format!("https://{vault}.vault.azure.net/secrets/{name}?api-version={SECRETS_API_VERSION}")
}

impl SecretStore for VaultSecretClient {
    fn get_secret(&self, vault: &str, name: &str) -> ProviderResult<Option<SecretValue>> {
        let reply = self.http.get(&secret_url(vault, name))?;
        if reply.status == 404 {
            return Ok(None);
        }
        let body = reply.into_result()?;
        body.get("value")
            .and_then(Value::as_str)
            .map(|value| Some(SecretValue::new(value)))
            .ok_or_else(|| ProviderError::http(200, None, format!("secret {name} has no value")))
    }

    fn set_secret(&self, vault: &str, name: &str, value: &SecretValue) -> ProviderResult<()> {
        let body = json!({ "value": value.expose() });
        self.http
            .put_json(&secret_url(vault, name), &body)?
            .into_result()
            .map(|_| ())
    }
}
