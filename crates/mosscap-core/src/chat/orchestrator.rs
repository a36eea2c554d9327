use crate::context::{ContextBuilder, HistoryStore, Transcript, Turn};
use crate::error::{MosscapError, Result};
use crate::llm::{LlmResponse, ModelClient};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where a session is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Generating,
}

/// Outcome details of a recorded turn, for status displays.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub response: String,
    pub turn_count: usize,
    pub elapsed: Duration,
    pub usage: Option<crate::llm::Usage>,
}

/// Drives one exchange: context assembly, the model call, and recording the
/// turn. Failed calls leave the transcript exactly as it was.
pub struct TurnOrchestrator {
    store: Arc<HistoryStore>,
    client: Arc<dyn ModelClient>,
    context: ContextBuilder,
    timeout: Option<Duration>,
    generating: Mutex<HashSet<String>>,
}

impl TurnOrchestrator {
    pub fn new(store: Arc<HistoryStore>, client: Arc<dyn ModelClient>) -> Self {
        Self {
            store,
            client,
            context: ContextBuilder::new(),
            timeout: None,
            generating: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.context = self.context.with_system_prompt(prompt);
        self
    }

    /// Bound each model call. Expiry counts as a generation failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    pub fn client(&self) -> &Arc<dyn ModelClient> {
        &self.client
    }

    pub fn transcript(&self, session_id: &str) -> Transcript {
        self.store.transcript(session_id).unwrap_or_default()
    }

    pub fn state(&self, session_id: &str) -> SessionState {
        let generating = self.generating.lock().unwrap_or_else(|e| e.into_inner());
        if generating.contains(session_id) {
            SessionState::Generating
        } else {
            SessionState::Idle
        }
    }

    /// Submit user input for a session.
    ///
    /// Returns `Ok(None)` for blank input (nothing is recorded and the model
    /// is not called), `Ok(Some(reply))` once the turn has been appended.
    pub async fn submit(&self, session_id: &str, user_input: &str) -> Result<Option<String>> {
        Ok(self
            .submit_with_report(session_id, user_input)
            .await?
            .map(|report| report.response))
    }

    /// Like [`TurnOrchestrator::submit`], with timing and usage of the call.
    pub async fn submit_with_report(
        &self,
        session_id: &str,
        user_input: &str,
    ) -> Result<Option<TurnReport>> {
        let prompt = user_input.trim();
        if prompt.is_empty() {
            debug!(session = session_id, "ignoring blank input");
            return Ok(None);
        }

        let _guard = self.begin(session_id)?;

        let transcript = self.store.get_or_create(session_id);
        let messages = self.context.build(&transcript, prompt);
        debug!(
            session = session_id,
            prior_turns = transcript.len(),
            est_tokens = ContextBuilder::estimate_tokens(&messages),
            "submitting turn"
        );

        let started = Instant::now();
        let response = match self.call_model(&messages).await {
            Ok(response) => response,
            Err(e) => {
                warn!(session = session_id, error = %e, "generation failed; transcript unchanged");
                return Err(e);
            }
        };
        let elapsed = started.elapsed();

        self.store
            .append(session_id, Turn::new(prompt, response.content.clone()));
        let turn_count = self.store.len(session_id);
        info!(
            session = session_id,
            turns = turn_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "turn recorded"
        );

        Ok(Some(TurnReport {
            response: response.content,
            turn_count,
            elapsed,
            usage: response.usage,
        }))
    }

    async fn call_model(&self, messages: &[crate::llm::Message]) -> Result<LlmResponse> {
        let call = self.client.chat(messages);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                MosscapError::generation(format!("model call timed out after {limit:?}"))
            })?,
            None => call.await,
        };
        // Anything the client reports is a failure of this call.
        result.map_err(|e| match e {
            MosscapError::Generation(_) => e,
            other => MosscapError::generation(other.to_string()),
        })
    }

    fn begin(&self, session_id: &str) -> Result<GeneratingGuard<'_>> {
        let mut generating = self.generating.lock().unwrap_or_else(|e| e.into_inner());
        if !generating.insert(session_id.to_string()) {
            return Err(MosscapError::SessionBusy(session_id.to_string()));
        }
        Ok(GeneratingGuard {
            generating: &self.generating,
            session_id: session_id.to_string(),
        })
    }
}

/// Returns the session to `Idle` however the submission ends.
struct GeneratingGuard<'a> {
    generating: &'a Mutex<HashSet<String>>,
    session_id: String,
}

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        let mut generating = self.generating.lock().unwrap_or_else(|e| e.into_inner());
        generating.remove(&self.session_id);
    }
}
