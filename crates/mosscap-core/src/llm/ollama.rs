use crate::error::MosscapError;
use crate::llm::factory::{ClientBuilder, ClientConfig};
use crate::llm::traits::*;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::ChatMessage as OllamaChatMessage;
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;
use std::sync::Arc;
use tracing::{debug, info};

/// Client for a model served by a local (or remote) Ollama instance.
pub struct OllamaClient {
    ollama: Ollama,
    model: String,
    temperature: f32,
    base_url: String,
}

impl OllamaClient {
    /// Bind a client to `config` without contacting the server.
    pub fn connect(config: &ClientConfig) -> Result<Self, MosscapError> {
        let ollama = Ollama::try_new(config.base_url.as_str()).map_err(|e| {
            MosscapError::client_init(format!("Invalid Ollama URL '{}': {e}", config.base_url))
        })?;
        Ok(Self {
            ollama,
            model: config.model_name.clone(),
            temperature: config.temperature,
            base_url: config.base_url.clone(),
        })
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server answers and, if asked, that the model is installed.
    pub async fn check_ready(&self, verify_model: bool) -> Result<(), MosscapError> {
        let models = self.ollama.list_local_models().await.map_err(|e| {
            MosscapError::client_init(format!(
                "Ollama is not responding at {}. Is it running? Error: {e}",
                self.base_url
            ))
        })?;

        if !verify_model {
            return Ok(());
        }

        let tagged = format!("{}:", self.model);
        if models
            .iter()
            .any(|m| m.name == self.model || m.name.starts_with(&tagged))
        {
            Ok(())
        } else {
            Err(MosscapError::client_init(format!(
                "Model '{}' is not installed on {}. Try `ollama pull {}`",
                self.model, self.base_url, self.model
            )))
        }
    }

    fn to_ollama_messages(messages: &[Message]) -> Vec<OllamaChatMessage> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::User => OllamaChatMessage::user(m.content.clone()),
                Role::Assistant => OllamaChatMessage::assistant(m.content.clone()),
                Role::System => OllamaChatMessage::system(m.content.clone()),
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ModelClient for OllamaClient {
    async fn chat(&self, messages: &[Message]) -> Result<LlmResponse, MosscapError> {
        let request =
            ChatMessageRequest::new(self.model.clone(), Self::to_ollama_messages(messages))
                .options(ModelOptions::default().temperature(self.temperature));

        debug!(model = %self.model, messages = messages.len(), "sending chat request");

        let response = self
            .ollama
            .send_chat_messages(request)
            .await
            .map_err(|e| MosscapError::generation(format!("Ollama chat error: {e}")))?;

        let usage = response.final_data.map(|fd| Usage {
            input_tokens: fd.prompt_eval_count as u64,
            output_tokens: fd.eval_count as u64,
        });

        Ok(LlmResponse {
            content: response.message.content,
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Production [`ClientBuilder`]: connects to Ollama and checks readiness.
#[derive(Debug, Default, Clone, Copy)]
pub struct OllamaBuilder;

#[async_trait::async_trait]
impl ClientBuilder for OllamaBuilder {
    async fn build(&self, config: &ClientConfig) -> Result<Arc<dyn ModelClient>, MosscapError> {
        let client = OllamaClient::connect(config)?;
        client.check_ready(config.verify_model).await?;
        info!(model = %config.model_name, base_url = %config.base_url, "Ollama client ready");
        Ok(Arc::new(client))
    }
}
