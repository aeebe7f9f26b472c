//! Blocking JSON-over-HTTP with bearer auth and bounded per-request time.
use crate::provider::{ProviderError, ProviderResult};
use serde_json::Value;
use std::time::Duration;
use tracing::trace;
use ureq::Agent;

/// Status plus parsed body of a completed request.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-2xx reply into a provider error carrying the ARM code.
    pub fn into_error(self) -> ProviderError {
        let error = self.body.get("error").unwrap_or(&self.body);
        let text = |keys: [&str; 2]| {
            keys.iter()
                .find_map(|key| error.get(*key).and_then(Value::as_str))
                .map(str::to_string)
        };
        let code = text(["code", "Code"]);
        let message = text(["message", "Message"])
            .unwrap_or_else(|| format!("request failed with HTTP {}", self.status));
        ProviderError::http(self.status, code, message)
    }

    /// `Ok(body)` on success, the parsed error otherwise.
    pub fn into_result(self) -> ProviderResult<Value> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(self.into_error())
        }
    }
}

pub struct HttpClient {
    agent: Agent,
    bearer: String,
}

impl HttpClient {
    pub fn new(token: &str, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: Agent::new_with_config(config),
            bearer: format!("Bearer {token}"),
        }
    }

    pub fn get(&self, url: &str) -> ProviderResult<Reply> {
        trace!(%url, "GET");
        let response = self
            .agent
            .get(url)
            .header("Authorization", self.bearer.as_str())
            .call();
        read_reply(response)
    }

    pub fn put_json(&self, url: &str, body: &Value) -> ProviderResult<Reply> {
        trace!(%url, "PUT");
        let response = self
            .agent
            .put(url)
            .header("Authorization", self.bearer.as_str())
            .send_json(body);
        read_reply(response)
    }

    pub fn post_empty(&self, url: &str) -> ProviderResult<Reply> {
        trace!(%url, "POST");
        let response = self
            .agent
            .post(url)
            .header("Authorization", self.bearer.as_str())
            .send_empty();
        read_reply(response)
    }
}

fn read_reply(
    response: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
) -> ProviderResult<Reply> {
    let mut response = response.map_err(|err| ProviderError::transport(err.to_string()))?;
    let status = response.status().as_u16();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|err| ProviderError::transport(format!("read response body: {err}")))?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    Ok(Reply { status, body })
}
