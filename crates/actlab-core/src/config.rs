use crate::client::{ClientConfig, Credentials};
use crate::error::{ActLabError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Connection settings. The password is never stored; it is prompted for or
/// passed on the command line when no key is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Render `.md` files to HTML before the hook uploads them.
    #[serde(default = "default_render_markdown")]
    pub render_markdown: bool,
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_render_markdown() -> bool {
    true
}

impl Config {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            base_path: default_base_path(),
            key: None,
            email: None,
            render_markdown: default_render_markdown(),
        }
    }

    /// Load `.actlab/config.yaml` under `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ActLabError::NotConfigured);
        }
        Self::load_from(&path)
    }

    /// Repository config if present, else the user-level file.
    pub fn load_or_global(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(ActLabError::NotConfigured) => {}
            other => return other,
        }
        let global = paths::global_config_path()?;
        if !global.exists() {
            return Err(ActLabError::NotConfigured);
        }
        tracing::debug!(path = %global.display(), "using user-level config");
        Self::load_from(&global)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<PathBuf> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())?;
        Ok(path)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.host, &self.base_path)
    }

    /// Credentials from the stored key, or the stored email plus `password`.
    pub fn credentials(&self, password: Option<String>) -> Result<Credentials> {
        Credentials::from_parts(self.key.clone(), self.email.clone(), password)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.host.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "host is empty".to_string(),
            });
        } else if !self.host.starts_with("http://") && !self.host.starts_with("https://") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("host '{}' has no scheme, http:// is assumed", self.host),
            });
        }

        if !self.base_path.starts_with('/') {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("base_path '{}' does not start with '/'", self.base_path),
            });
        }

        match (&self.key, &self.email) {
            (None, None) => warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "neither key nor email is set".to_string(),
            }),
            (Some(_), Some(_)) => warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "both key and email are set, the key is used".to_string(),
            }),
            _ => {}
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
