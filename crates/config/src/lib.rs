//! Configuration loading, validation, and management for Arka.
//!
//! Loads configuration from `~/.arka/config.toml` with environment
//! variable overrides. A config holds any number of named provider
//! profiles; exactly one of them is active at a time.

use arka_core::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name given to the profile synthesised purely from environment variables.
pub const ENV_PROFILE: &str = "env";

/// The root configuration structure.
///
/// Maps directly to `~/.arka/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the profile used for new sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,

    /// Named provider profiles
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    /// Orchestration loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Memory store settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// One vendor + model + credentials combination.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Vendor name, e.g. `openai`, `claude`, `gemini`
    pub provider: String,
    pub model: String,
    pub api_key: String,
    /// Tavily key for the `web_search` tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,
}

impl Profile {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key: api_key.into(),
            search_api_key: None,
        }
    }

    /// The parsed vendor.
    pub fn kind(&self) -> Result<ProviderKind, ConfigError> {
        self.provider
            .parse()
            .map_err(ConfigError::Validation)
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field(
                "search_api_key",
                &self.search_api_key.as_deref().map(redact),
            )
            .finish()
    }
}

/// Mask a secret for display, keeping only a short recognisable tail.
pub fn redact(secret: &str) -> String {
    let chars = secret.chars().count();
    if chars <= 8 {
        return "[REDACTED]".into();
    }
    let tail: String = secret.chars().skip(chars - 4).collect();
    format!("[REDACTED]...{tail}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model invocations per query before the user is asked to continue
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Wall-clock limit for `execute_command`
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Cap on captured command output, in bytes
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Default mode: `chat`, `plan` or `build`
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            command_timeout_secs: default_command_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            mode: default_mode(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Where memory files live; defaults to `~/.arka/memory`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_max_steps() -> u32 {
    20
}
fn default_command_timeout_secs() -> u64 {
    300
}
fn default_max_output_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_mode() -> String {
    "build".into()
}

impl AppConfig {
    /// Load configuration from the default path, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::default_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), profiles = config.profiles.len(), "Loaded config");
        Ok(config)
    }

    /// Write the configuration as TOML, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |e: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(io_err)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// The `~/.arka` directory.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".arka"))
            .ok_or_else(|| ConfigError::Validation("could not determine home directory".into()))
    }

    /// The `~/.arka/config.toml` file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// The configured memory directory, or `~/.arka/memory`.
    pub fn memory_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.memory.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("memory")),
        }
    }

    /// Apply `ARKA_PROVIDER`, `ARKA_MODEL`, `ARKA_API_KEY` and `TAVILY_API_KEY`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Values land on the active profile. With no active profile, an
    /// [`ENV_PROFILE`] is created once a provider, model and key are all known.
    pub fn apply_overrides_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        let provider = var("ARKA_PROVIDER");
        let model = var("ARKA_MODEL");
        let api_key = var("ARKA_API_KEY");
        let search_key = var("TAVILY_API_KEY");

        let has_active = self
            .active_profile
            .as_ref()
            .is_some_and(|name| self.profiles.contains_key(name));
        if !has_active {
            let (Some(provider), Some(model), Some(api_key)) =
                (provider.clone(), model.clone(), api_key.clone())
            else {
                return;
            };
            debug!("Creating profile from environment");
            self.profiles
                .insert(ENV_PROFILE.into(), Profile::new(provider, model, api_key));
            self.active_profile = Some(ENV_PROFILE.into());
        }

        let Some(profile) = self
            .active_profile
            .as_ref()
            .and_then(|name| self.profiles.get_mut(name))
        else {
            return;
        };

        if let Some(provider) = provider {
            profile.provider = provider;
        }
        if let Some(model) = model {
            profile.model = model;
        }
        if let Some(api_key) = api_key {
            profile.api_key = api_key;
        }
        if search_key.is_some() {
            profile.search_api_key = search_key;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (name, profile) = self.active()?;
        profile.kind()?;
        if profile.api_key.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "profile '{name}' has an empty api_key"
            )));
        }
        if profile.model.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "profile '{name}' has an empty model"
            )));
        }
        if self.agent.max_steps == 0 {
            return Err(ConfigError::Validation(
                "agent.max_steps must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// The active profile and its name.
    pub fn active(&self) -> Result<(&str, &Profile), ConfigError> {
        let name = self.active_profile.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "no active profile. Run `arka configure` to create one".into(),
            )
        })?;
        self.profiles
            .get_key_value(name)
            .map(|(name, profile)| (name.as_str(), profile))
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }

    /// Insert or replace a profile and make it active.
    pub fn upsert_profile(&mut self, name: impl Into<String>, profile: Profile) {
        let name = name.into();
        self.profiles.insert(name.clone(), profile);
        self.active_profile = Some(name);
    }

    /// Remove a profile. Removing the active one leaves no profile active.
    pub fn remove_profile(&mut self, name: &str) -> Result<Profile, ConfigError> {
        let removed = self
            .profiles
            .remove(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;
        if self.active_profile.as_deref() == Some(name) {
            self.active_profile = None;
        }
        Ok(removed)
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.profiles.contains_key(name) {
            return Err(ConfigError::UnknownProfile(name.to_string()));
        }
        self.active_profile = Some(name.to_string());
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("No profile named '{0}'")]
    UnknownProfile(String),
}
