//! Settings sources: dotenv-style files layered over the process environment.
use super::known_keys;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const USER_SETTINGS_DIR: &str = "foundry-provision";
const USER_SETTINGS_FILE: &str = "foundry.env";

/// Flat key/value view of every settings source, already layered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Overlay `pairs`; later values win.
    pub fn extend<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.values.extend(pairs);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut settings = Settings::default();
        for (key, value) in iter {
            settings.insert(key, value);
        }
        settings
    }
}

/// `<config dir>/foundry-provision/foundry.env`, when a config dir exists.
pub fn default_user_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_SETTINGS_DIR).join(USER_SETTINGS_FILE))
}

/// Layer the user file, the process environment, and the working env file.
///
/// The env file wins over the process environment, which wins over the user
/// file. A missing user file or a missing default env file is skipped;
/// a missing env file passed explicitly is an error.
pub fn collect_settings(
    user_file: Option<&Path>,
    env_file: Option<&Path>,
    env_file_required: bool,
    process_env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut settings = Settings::default();

    if let Some(path) = user_file.filter(|path| path.is_file()) {
        debug!(path = %path.display(), "loading user settings");
        settings.extend(read_env_file(path)?);
    }

    for key in known_keys() {
        if let Some(value) = process_env(key) {
            settings.insert(key, value);
        }
    }

    if let Some(path) = env_file {
        if path.is_file() {
            debug!(path = %path.display(), "loading env file");
            settings.extend(read_env_file(path)?);
        } else if env_file_required {
            return Err(anyhow!("env file {} not found", path.display()));
        }
    }

    Ok(settings)
}

/// Read one dotenv file; `${VAR}` references resolve against the process
/// environment and earlier lines of the same file.
pub(super) fn read_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    dotenvy::from_path_iter(path)
        .with_context(|| format!("read {}", path.display()))?
        .map(|item| item.with_context(|| format!("parse {}", path.display())))
        .collect()
}
