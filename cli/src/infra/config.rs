//! Infrastructure implementation of the `ConfigSource` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ConfigSource;
use crate::domain::config::{KEY_ACCESS_TOKEN, StackConfig, parse_stack_config};

/// Stack file used when neither `--config` nor `AGENT_DEPLOY_CONFIG` is set.
pub const DEFAULT_CONFIG_FILE: &str = "agent-deploy.yaml";
/// Environment variable holding the access token.
pub const TOKEN_ENV: &str = "AGENT_DEPLOY_ACCESS_TOKEN";

/// Production `ConfigSource` reading a YAML stack file from disk.
///
/// Precedence, lowest first: stack file, `AGENT_DEPLOY_ACCESS_TOKEN`,
/// `--set` overrides.
pub struct YamlConfigSource {
    path: PathBuf,
    explicit: bool,
    overrides: Vec<String>,
}

impl YamlConfigSource {
    /// `path` is the `--config` value (clap already folds in
    /// `AGENT_DEPLOY_CONFIG`); `None` means the default file, which may be
    /// absent.
    #[must_use]
    pub fn new(path: Option<PathBuf>, overrides: Vec<String>) -> Self {
        let explicit = path.is_some();
        Self {
            path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
            explicit,
            overrides,
        }
    }

    /// Same as [`Self::new`], with the token taken from the environment
    /// when set.
    #[must_use]
    pub fn from_env(path: Option<PathBuf>, overrides: Vec<String>) -> Self {
        let mut source = Self::new(path, overrides);
        if let Ok(token) = std::env::var(TOKEN_ENV)
            && !token.is_empty()
        {
            source
                .overrides
                .insert(0, format!("{KEY_ACCESS_TOKEN}={token}"));
        }
        source
    }

    fn read(&self) -> Result<String> {
        if !self.explicit && !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no stack file, using overrides only");
            return Ok(String::new());
        }
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))
    }
}

impl ConfigSource for YamlConfigSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StackConfig> {
        let content = self.read()?;
        let cfg = parse_stack_config(&content, &self.overrides)?;
        tracing::debug!(
            path = %self.path.display(),
            overrides = self.overrides.len(),
            "configuration loaded"
        );
        Ok(cfg)
    }
}
