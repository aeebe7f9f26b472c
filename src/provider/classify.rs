use super::ProviderError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed taxonomy of provisioning failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningErrorKind {
    Unauthorized,
    QuotaExceeded,
    NameConflict,
    DependencyUnavailable,
    TransientNetwork,
    Unknown,
}

impl fmt::Display for ProvisioningErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProvisioningErrorKind::Unauthorized => "unauthorized",
            ProvisioningErrorKind::QuotaExceeded => "quota exceeded",
            ProvisioningErrorKind::NameConflict => "name conflict",
            ProvisioningErrorKind::DependencyUnavailable => "dependency unavailable",
            ProvisioningErrorKind::TransientNetwork => "transient network",
            ProvisioningErrorKind::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

const AUTH_CODES: &[&str] = &[
    "authorizationfailed",
    "authenticationfailed",
    "invalidauthenticationtoken",
    "expiredauthenticationtoken",
    "linkedauthorizationfailed",
    "forbidden",
    "unauthorized",
];

const NAME_CODE_MARKERS: &[&str] = &[
    "alreadyexists",
    "alreadytaken",
    "alreadyinuse",
    "namenotavailable",
    "nameunavailable",
    "customdomaininuse",
    "conflict",
];

/// Map a provider failure onto the error taxonomy.
///
/// Authorization wins over quota, which wins over naming; throttling and
/// server-side faults are transient. `DependencyUnavailable` is never
/// produced here; only the orchestrator's gating assigns it.
pub fn classify(err: &ProviderError) -> ProvisioningErrorKind {
    let Some(status) = err.status else {
        return ProvisioningErrorKind::TransientNetwork;
    };
    let code = err.code.as_deref().unwrap_or_default().to_ascii_lowercase();
    let message = err.message.to_ascii_lowercase();

    if status == 401 || status == 403 || AUTH_CODES.contains(&code.as_str()) {
        return ProvisioningErrorKind::Unauthorized;
    }
    if code.contains("quota")
        || code.ends_with("persubscriptionexceeded")
        || message.contains("quota")
    {
        return ProvisioningErrorKind::QuotaExceeded;
    }
    if status == 409 || NAME_CODE_MARKERS.iter().any(|marker| code.contains(marker)) {
        return ProvisioningErrorKind::NameConflict;
    }
    if status == 408 || status == 429 || (500..600).contains(&status) {
        return ProvisioningErrorKind::TransientNetwork;
    }
    ProvisioningErrorKind::Unknown
}

/// The role assignment already exists under another name.
pub fn is_role_assignment_exists(err: &ProviderError) -> bool {
    err.code
        .as_deref()
        .is_some_and(|code| code.eq_ignore_ascii_case("RoleAssignmentExists"))
}
