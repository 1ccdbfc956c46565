use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ExplainError, Result};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const ENV_BACKEND_URL: &str = "EXPLAINER_BACKEND_URL";
pub const ENV_TIMEOUT_SECS: &str = "EXPLAINER_TIMEOUT_SECS";

/// Where the analysis service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainerConfig {
    pub backend_url: String,
    /// Zero disables the request timeout.
    pub timeout_secs: u64,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ExplainerConfig {
    /// Defaults overridden by `EXPLAINER_BACKEND_URL` / `EXPLAINER_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_BACKEND_URL) {
            config.backend_url = url;
        }
        if let Ok(secs) = std::env::var(ENV_TIMEOUT_SECS) {
            config.timeout_secs = secs.trim().parse().map_err(|_| {
                ExplainError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number, got '{secs}'"))
            })?;
        }

        Ok(config)
    }

    /// Keys present in the YAML document replace the values already in `self`.
    pub fn merge_yaml(mut self, yaml: &str) -> Result<Self> {
        let overrides: ConfigOverrides =
            serde_yaml::from_str(yaml).map_err(|e| ExplainError::Config(e.to_string()))?;

        if let Some(url) = overrides.backend_url {
            self.backend_url = url;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = secs;
        }
        Ok(self)
    }

    pub async fn merge_yaml_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExplainError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        self.merge_yaml(&yaml)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Absolute http(s) URL of the analysis service, with a trailing slash so endpoints join onto it.
    pub fn base_url(&self) -> Result<Url> {
        let trimmed = self.backend_url.trim().trim_end_matches('/');
        let url = Url::parse(&format!("{trimmed}/"))
            .map_err(|e| ExplainError::Config(format!("backend url '{}': {}", self.backend_url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ExplainError::Config(format!(
                "backend url must use http or https, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverrides {
    backend_url: Option<String>,
    timeout_secs: Option<u64>,
}
