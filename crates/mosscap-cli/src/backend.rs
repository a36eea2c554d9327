use mosscap_core::{
    ClientFactory, HistoryStore, MosscapError, Settings, Transcript, TurnOrchestrator, TurnReport,
};
use std::sync::Arc;
use tracing::warn;

/// The screen's handle on the core.
///
/// Owns the session id and builds the orchestrator the first time a model
/// client can be obtained. A failed client construction is reported and tried
/// again on the next submission.
pub struct ChatBackend {
    settings: Settings,
    store: Arc<HistoryStore>,
    factory: &'static ClientFactory,
    orchestrator: Option<Arc<TurnOrchestrator>>,
}

impl ChatBackend {
    pub fn new(settings: Settings, store: Arc<HistoryStore>) -> Self {
        Self {
            settings,
            store,
            factory: ClientFactory::global(),
            orchestrator: None,
        }
    }

    pub fn with_factory(mut self, factory: &'static ClientFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.settings.ui.session_id
    }

    pub fn model_name(&self) -> &str {
        &self.settings.llm.model
    }

    pub fn is_connected(&self) -> bool {
        self.orchestrator.is_some()
    }

    /// Obtain the model client now rather than on the first message.
    pub async fn connect(&mut self) -> Result<(), MosscapError> {
        self.orchestrator().await.map(|_| ())
    }

    async fn orchestrator(&mut self) -> Result<Arc<TurnOrchestrator>, MosscapError> {
        if let Some(ref orchestrator) = self.orchestrator {
            return Ok(orchestrator.clone());
        }

        let client = self
            .factory
            .get_client(&self.settings.client_config())
            .await
            .inspect_err(|e| warn!(error = %e, "model client unavailable"))?;

        let mut orchestrator = TurnOrchestrator::new(self.store.clone(), client);
        if let Some(ref prompt) = self.settings.llm.system_prompt {
            orchestrator = orchestrator.with_system_prompt(prompt.clone());
        }
        if let Some(timeout) = self.settings.request_timeout() {
            orchestrator = orchestrator.with_timeout(timeout);
        }

        let orchestrator = Arc::new(orchestrator);
        self.orchestrator = Some(orchestrator.clone());
        Ok(orchestrator)
    }

    /// Submit input on this backend's session. Blank input is a no-op that
    /// never needs a model client.
    pub async fn submit(&mut self, input: &str) -> Result<Option<TurnReport>, MosscapError> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        let orchestrator = self.orchestrator().await?;
        orchestrator
            .submit_with_report(&self.settings.ui.session_id, input)
            .await
    }

    pub fn transcript(&self) -> Transcript {
        self.store
            .transcript(&self.settings.ui.session_id)
            .unwrap_or_default()
    }
}
