//! Secret store backing the first credential layer.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ParleyError;

const SECRETS_FILE_NAME: &str = "secrets.toml";
const SECRETS_DIR_NAME: &str = ".parley";

/// Read-only source of named secrets.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ParleyError>;
}

/// Flat TOML table of string secrets, e.g. `together_ai_api_key = "..."`.
///
/// A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `./.parley/secrets.toml` when it exists, else the platform config
    /// directory.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(SECRETS_DIR_NAME).join(SECRETS_FILE_NAME);
        if local.exists() {
            return local;
        }
        directories::ProjectDirs::from("", "", "parley")
            .map(|dirs| dirs.config_dir().join(SECRETS_FILE_NAME))
            .unwrap_or(local)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, toml::Value>, ParleyError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(ParleyError::Io(err)),
        };
        toml::from_str(&raw).map_err(|e| {
            ParleyError::Configuration(format!(
                "Invalid secrets file {}: {e}",
                self.path.display()
            ))
        })
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, ParleyError> {
        let secrets = self.load()?;
        Ok(secrets
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }
}
