use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{endpoints, models, session, ui};
use crate::error::MosscapError;
use crate::llm::ClientConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub verify_model: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    pub theme: String,
    pub session_id: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: models::DEFAULT_MODEL.to_string(),
            temperature: models::DEFAULT_TEMPERATURE,
            base_url: endpoints::OLLAMA_BASE_URL.to_string(),
            system_prompt: None,
            request_timeout_secs: None,
            verify_model: true,
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: ui::DEFAULT_THEME.to_string(),
            session_id: session::DEFAULT_SESSION_ID.to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            ui: UiSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mosscap")
            .join("config.toml")
    }

    /// Load from the default location, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %config_path.display(), error = %e, "ignoring invalid config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, MosscapError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), MosscapError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), MosscapError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MosscapError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The model client configuration these settings describe.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.llm.model.clone())
            .with_temperature(self.llm.temperature)
            .with_base_url(self.llm.base_url.clone())
            .with_verify_model(self.llm.verify_model)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.llm
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
