use crate::models::UserConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fs;

/// File name of the user configuration inside the config directory.
pub const USER_CONFIG_FILE: &str = "PlantAI Config.yaml";

/// Prefix of environment variables that override the file, e.g. `PLANTAI_API_URL`.
pub const ENV_PREFIX: &str = "PLANTAI";

/// Configuration manager for loading and saving the YAML configuration file.
///
/// Values are layered, later layers winning:
/// 1. Built-in defaults ([`UserConfig::default`])
/// 2. `PlantAI Config.yaml` in the config directory (optional)
/// 3. `PLANTAI_*` environment variables
///
/// The result is resolved once at startup; nothing re-reads it at runtime.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "PlantAI Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join(USER_CONFIG_FILE),
            config_dir,
        })
    }

    /// Load the user configuration from file and process environment.
    pub fn load_user_config(&self) -> Result<UserConfig> {
        self.load_user_config_with_env(None)
    }

    /// Load the user configuration, taking environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_user_config_with_env(
        &self,
        env: Option<HashMap<String, String>>,
    ) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
        }

        let settings = config::Config::builder()
            .add_source(
                config::File::new(self.user_config_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!(
            "Loaded user config: api_url={}, debug={}",
            config.api_url,
            config.debug_mode
        );
        Ok(config)
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Write a default configuration file if none exists yet.
    ///
    /// Returns `true` if a file was written.
    pub fn ensure_user_config(&self) -> Result<bool> {
        if self.user_config_path.exists() {
            return Ok(false);
        }
        self.save_user_config(&UserConfig::default())?;
        Ok(true)
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the user configuration file path.
    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }
}
