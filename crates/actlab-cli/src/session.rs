use actlab_core::config::Config;
use actlab_core::{ActLabError, Client};
use anyhow::Context;
use std::path::PathBuf;

/// Everything a command needs to reach the server: the resolved root plus
/// any connection settings given on the command line.
pub struct Session {
    pub root: PathBuf,
    pub host: Option<String>,
    pub key: Option<String>,
    pub password: Option<String>,
}

impl Session {
    /// Stored config with command-line overrides applied. A `--host` alone
    /// is enough when no config file exists.
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut cfg = match Config::load_or_global(&self.root) {
            Ok(cfg) => cfg,
            Err(ActLabError::NotConfigured) if self.host.is_some() => Config::new(""),
            Err(e) => return Err(e).context("failed to load config"),
        };
        if let Some(host) = &self.host {
            cfg.host = host.clone();
        }
        if let Some(key) = &self.key {
            cfg.key = Some(key.clone());
        }
        Ok(cfg)
    }

    pub fn connect(&self) -> anyhow::Result<Client> {
        let cfg = self.config()?;
        let credentials = cfg
            .credentials(self.password.clone())
            .context("no usable credentials, set a key or pass --password with an email")?;
        tracing::debug!(host = %cfg.host, "connecting");
        Client::connect(cfg.client_config(), credentials)
            .with_context(|| format!("failed to connect to {}", cfg.host))
    }
}
