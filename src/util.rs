use anyhow::{Context, Result};
use sha2::Digest;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Derive a stable GUID-shaped identifier from arbitrary parts.
///
/// ARM requires role assignment names to be GUIDs; deriving them from the
/// assignment's identity makes reruns address the same assignment.
pub fn stable_guid(parts: &[&str]) -> String {
    let hex = sha256_hex(parts.join("\n").to_ascii_lowercase().as_bytes());
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

pub fn now_epoch_ms() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("compute timestamp")?
        .as_millis())
}

/// Normalize an Azure region for comparison (`East US 2` == `eastus2`).
pub fn normalize_region(region: &str) -> String {
    region
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
