use crate::provider::ProvisioningErrorKind;

/// Operator-facing remediation for a failure class.
pub fn remediation(kind: ProvisioningErrorKind) -> &'static str {
    match kind {
        ProvisioningErrorKind::Unauthorized => {
            "sign in with `az login` and confirm Contributor plus User Access Administrator on the subscription or resource group"
        }
        ProvisioningErrorKind::QuotaExceeded => {
            "check subscription quotas for the region (`az vm list-usage --location <region>`) or choose another region"
        }
        ProvisioningErrorKind::NameConflict => {
            "the name is taken or soft-deleted elsewhere; pick a new globally unique name or purge the deleted resource"
        }
        ProvisioningErrorKind::DependencyUnavailable => {
            "fix the failure of the resource it depends on, then rerun; completed resources are kept"
        }
        ProvisioningErrorKind::TransientNetwork => {
            "a network or service fault occurred; rerun the command, it only creates what is missing"
        }
        ProvisioningErrorKind::Unknown => {
            "inspect foundry_deployment.log and confirm the resource provider is registered (`az provider list`)"
        }
    }
}
