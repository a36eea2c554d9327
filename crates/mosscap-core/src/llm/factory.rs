use crate::constants::{endpoints, models};
use crate::error::{MosscapError, Result};
use crate::llm::{ModelClient, OllamaBuilder};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Everything that identifies a model client. Two equal configs share one
/// cached client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub model_name: String,
    pub temperature: f32,
    pub base_url: String,
    /// Check at construction time that the model is installed on the server.
    pub verify_model: bool,
}

impl ClientConfig {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            temperature: models::DEFAULT_TEMPERATURE,
            base_url: endpoints::OLLAMA_BASE_URL.to_string(),
            verify_model: true,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_verify_model(mut self, verify: bool) -> Self {
        self.verify_model = verify;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(MosscapError::client_init("model name is empty"));
        }
        if !self.temperature.is_finite() || !(0.0..=1.0).contains(&self.temperature) {
            return Err(MosscapError::client_init(format!(
                "temperature {} is outside [0, 1]",
                self.temperature
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(MosscapError::client_init("base URL is empty"));
        }
        Ok(())
    }

    // -0.0 and 0.0 are the same setting.
    fn temperature_bits(&self) -> u32 {
        if self.temperature == 0.0 {
            0.0f32.to_bits()
        } else {
            self.temperature.to_bits()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(models::DEFAULT_MODEL)
    }
}

impl PartialEq for ClientConfig {
    fn eq(&self, other: &Self) -> bool {
        self.model_name == other.model_name
            && self.temperature_bits() == other.temperature_bits()
            && self.base_url == other.base_url
            && self.verify_model == other.verify_model
    }
}

impl Eq for ClientConfig {}

impl Hash for ClientConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model_name.hash(state);
        self.temperature_bits().hash(state);
        self.base_url.hash(state);
        self.verify_model.hash(state);
    }
}

/// Constructs the (possibly expensive) client for a config.
#[async_trait::async_trait]
pub trait ClientBuilder: Send + Sync {
    async fn build(&self, config: &ClientConfig) -> Result<Arc<dyn ModelClient>>;
}

type Slot = Arc<OnceCell<Arc<dyn ModelClient>>>;

/// Memoizes model clients per [`ClientConfig`].
///
/// The first caller for a config runs the builder; concurrent callers for the
/// same config wait on that construction and receive the same `Arc`. A failed
/// construction leaves the slot empty, so a later call tries again.
pub struct ClientFactory {
    builder: Box<dyn ClientBuilder>,
    cache: Mutex<HashMap<ClientConfig, Slot>>,
}

impl ClientFactory {
    pub fn new(builder: impl ClientBuilder + 'static) -> Self {
        Self {
            builder: Box::new(builder),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Factory backed by a local Ollama server.
    pub fn ollama() -> Self {
        Self::new(OllamaBuilder)
    }

    /// The process-wide factory. Call [`ClientFactory::reset`] to drop its
    /// cached clients.
    pub fn global() -> &'static ClientFactory {
        static GLOBAL: OnceLock<ClientFactory> = OnceLock::new();
        GLOBAL.get_or_init(ClientFactory::ollama)
    }

    pub async fn get_client(&self, config: &ClientConfig) -> Result<Arc<dyn ModelClient>> {
        config.validate()?;

        let slot = {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.entry(config.clone()).or_default().clone()
        };

        if let Some(client) = slot.get() {
            debug!(model = %config.model_name, "reusing cached model client");
            return Ok(client.clone());
        }

        let client = slot
            .get_or_try_init(|| async {
                info!(
                    model = %config.model_name,
                    temperature = config.temperature,
                    base_url = %config.base_url,
                    "constructing model client"
                );
                self.builder.build(config).await
            })
            .await?;

        Ok(client.clone())
    }

    /// Drop every cached client. Clients already handed out stay alive for as
    /// long as their holders keep them.
    pub fn reset(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.clear();
    }

    /// Number of configs with a fully constructed client.
    pub fn cached_len(&self) -> usize {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.values().filter(|slot| slot.initialized()).count()
    }
}
