use anyhow::{Context, Result, bail};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Path appended to the base URL for inference requests.
pub const PREDICT_PATH: &str = "predict";

/// User configuration from `PlantAI Config.yaml`, overridable by `PLANTAI_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Base URL of the inference service.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default = "default_console_logging")]
    pub console_logging: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            debug_mode: false,
            console_logging: default_console_logging(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_console_logging() -> bool {
    true
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl UserConfig {
    /// Resolve the full inference endpoint, `{api_url}/predict`.
    ///
    /// A trailing slash on the base URL is tolerated. Fails if the base is empty,
    /// not an absolute URL, or not http(s).
    pub fn predict_endpoint(&self) -> Result<Url> {
        let base = self.api_url.trim();
        if base.is_empty() {
            bail!("api_url is not configured");
        }

        let endpoint = format!("{}/{}", base.trim_end_matches('/'), PREDICT_PATH);
        let url = Url::parse(&endpoint)
            .with_context(|| format!("Invalid api_url: {}", self.api_url))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => bail!("Unsupported api_url scheme '{}': {}", other, self.api_url),
        }
    }
}
