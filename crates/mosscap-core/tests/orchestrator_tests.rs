use mosscap_core::{
    HistoryStore, LlmResponse, Message, ModelClient, MosscapError, Role, SessionState,
    TurnOrchestrator, Usage,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock model that replies from a script and records every payload it sees.
struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn replying(text: &str) -> Arc<Self> {
        Self::new(vec![Ok(text)])
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_payload(&self) -> Vec<Message> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ModelClient for ScriptedLlm {
    async fn chat(&self, messages: &[Message]) -> Result<LlmResponse, MosscapError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(LlmResponse {
                content: text,
                usage: Some(Usage {
                    input_tokens: 10,
                    output_tokens: 5,
                }),
            }),
            Some(Err(cause)) => Err(MosscapError::generation(cause)),
            None => Ok(LlmResponse::text("(no more replies)")),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Echoes the last user message back after an optional delay.
struct EchoLlm {
    delay: Duration,
    calls: AtomicUsize,
}

impl EchoLlm {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ModelClient for EchoLlm {
    async fn chat(&self, messages: &[Message]) -> Result<LlmResponse, MosscapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(LlmResponse::text(format!("echo: {last}")))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// A client that fails with a non-generation error.
struct BrokenLlm;

#[async_trait::async_trait]
impl ModelClient for BrokenLlm {
    async fn chat(&self, _messages: &[Message]) -> Result<LlmResponse, MosscapError> {
        Err(MosscapError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        )))
    }

    fn model_name(&self) -> &str {
        "broken"
    }
}

fn orchestrator(client: Arc<dyn ModelClient>) -> TurnOrchestrator {
    TurnOrchestrator::new(Arc::new(HistoryStore::new()), client)
}

// ========================================================================
// Happy path
// ========================================================================

#[tokio::test]
async fn test_submit_records_turn_and_returns_reply() {
    let llm = ScriptedLlm::replying("Hi there");
    let orch = orchestrator(llm.clone());

    let reply = orch.submit("default", "Hello").await.unwrap();

    assert_eq!(reply.as_deref(), Some("Hi there"));
    assert_eq!(orch.transcript("default").pairs(), vec![("Hello", "Hi there")]);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_submit_stores_trimmed_input() {
    let llm = ScriptedLlm::replying("ok");
    let orch = orchestrator(llm.clone());

    orch.submit("default", "  padded question \n").await.unwrap();

    assert_eq!(orch.transcript("default").pairs(), vec![("padded question", "ok")]);
    assert_eq!(llm.last_payload(), vec![Message::user("padded question")]);
}

#[tokio::test]
async fn test_transcript_length_matches_successful_submissions() {
    let llm = ScriptedLlm::new(vec![Ok("r1"), Ok("r2"), Ok("r3"), Ok("r4")]);
    let orch = orchestrator(llm);

    for input in ["q1", "q2", "q3", "q4"] {
        orch.submit("default", input).await.unwrap();
    }

    assert_eq!(
        orch.transcript("default").pairs(),
        vec![("q1", "r1"), ("q2", "r2"), ("q3", "r3"), ("q4", "r4")]
    );
}

#[tokio::test]
async fn test_context_includes_prior_turn_then_new_message() {
    let llm = ScriptedLlm::new(vec![Ok("Hi"), Ok("Fine, thanks")]);
    let orch = orchestrator(llm.clone());

    orch.submit("default", "Hello").await.unwrap();
    orch.submit("default", "How are you?").await.unwrap();

    assert_eq!(
        llm.last_payload(),
        vec![
            Message::user("Hello"),
            Message::assistant("Hi"),
            Message::user("How are you?"),
        ]
    );
}

#[tokio::test]
async fn test_system_prompt_is_sent_before_history() {
    let llm = ScriptedLlm::new(vec![Ok("a"), Ok("b")]);
    let orch = orchestrator(llm.clone()).with_system_prompt("You are Mosscap.");

    orch.submit("default", "first").await.unwrap();
    orch.submit("default", "second").await.unwrap();

    let payload = llm.last_payload();
    assert_eq!(payload[0], Message::system("You are Mosscap."));
    assert_eq!(payload.len(), 4);
    // The system prompt is context, not a turn.
    assert_eq!(orch.transcript("default").len(), 2);
}

#[tokio::test]
async fn test_submit_with_report_carries_usage_and_count() {
    let llm = ScriptedLlm::new(vec![Ok("one"), Ok("two")]);
    let orch = orchestrator(llm);

    orch.submit("default", "a").await.unwrap();
    let report = orch
        .submit_with_report("default", "b")
        .await
        .unwrap()
        .expect("non-blank input produces a report");

    assert_eq!(report.response, "two");
    assert_eq!(report.turn_count, 2);
    assert_eq!(
        report.usage,
        Some(Usage {
            input_tokens: 10,
            output_tokens: 5
        })
    );
}

// ========================================================================
// Blank input
// ========================================================================

#[tokio::test]
async fn test_blank_input_is_noop() {
    let llm = ScriptedLlm::replying("should not be used");
    let orch = orchestrator(llm.clone());

    for blank in ["", "   ", "\t\n", " \r\n "] {
        let reply = orch.submit("default", blank).await.unwrap();
        assert!(reply.is_none());
    }

    assert!(orch.transcript("default").is_empty());
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_blank_input_does_not_create_session() {
    let store = Arc::new(HistoryStore::new());
    let orch = TurnOrchestrator::new(store.clone(), ScriptedLlm::replying("x"));

    orch.submit("ghost", "   ").await.unwrap();

    assert!(!store.contains("ghost"));
}

#[tokio::test]
async fn test_blank_input_after_turns_leaves_transcript_unchanged() {
    let llm = ScriptedLlm::new(vec![Ok("Hi")]);
    let orch = orchestrator(llm.clone());
    orch.submit("default", "Hello").await.unwrap();
    let before = orch.transcript("default");

    orch.submit("default", "    ").await.unwrap();

    assert_eq!(orch.transcript("default"), before);
    assert_eq!(llm.call_count(), 1);
}

// ========================================================================
// Failures
// ========================================================================

#[tokio::test]
async fn test_failed_generation_leaves_transcript_unchanged() {
    let llm = ScriptedLlm::new(vec![Ok("Hi"), Err("backend exploded")]);
    let orch = orchestrator(llm);

    orch.submit("default", "Hello").await.unwrap();
    let err = orch.submit("default", "Again").await.unwrap_err();

    assert!(err.is_generation());
    assert!(err.to_string().contains("backend exploded"));
    assert_eq!(orch.transcript("default").pairs(), vec![("Hello", "Hi")]);
}

#[tokio::test]
async fn test_submit_after_failure_succeeds() {
    let llm = ScriptedLlm::new(vec![Err("temporary"), Ok("recovered")]);
    let orch = orchestrator(llm.clone());

    assert!(orch.submit("default", "try").await.is_err());
    assert_eq!(orch.state("default"), SessionState::Idle);

    let reply = orch.submit("default", "try").await.unwrap();

    assert_eq!(reply.as_deref(), Some("recovered"));
    assert_eq!(orch.transcript("default").pairs(), vec![("try", "recovered")]);
    // The failed attempt never made it into the context.
    assert_eq!(llm.last_payload(), vec![Message::user("try")]);
}

#[tokio::test]
async fn test_non_generation_client_error_is_reported_as_generation_error() {
    let orch = orchestrator(Arc::new(BrokenLlm));

    let err = orch.submit("default", "hello").await.unwrap_err();

    assert!(err.is_generation());
    assert!(err.to_string().contains("connection reset"));
    assert!(orch.transcript("default").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_generation_error() {
    let llm = EchoLlm::new(Duration::from_secs(120));
    let orch = orchestrator(llm).with_timeout(Duration::from_secs(5));

    let err = orch.submit("default", "slow?").await.unwrap_err();

    assert!(err.is_generation());
    assert!(err.to_string().contains("timed out"));
    assert!(orch.transcript("default").is_empty());
    assert_eq!(orch.state("default"), SessionState::Idle);
}

// ========================================================================
// Session state and concurrency
// ========================================================================

#[tokio::test(start_paused = true)]
async fn test_session_is_generating_while_call_in_flight() {
    let llm = EchoLlm::new(Duration::from_secs(10));
    let orch = Arc::new(orchestrator(llm.clone()));

    let task = tokio::spawn({
        let orch = orch.clone();
        async move { orch.submit("default", "hold on").await }
    });

    // Let the spawned submit reach the model call.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(orch.state("default"), SessionState::Generating);
    assert_eq!(orch.state("other"), SessionState::Idle);

    let busy = orch.submit("default", "second").await.unwrap_err();
    assert!(matches!(busy, MosscapError::SessionBusy(ref id) if id == "default"));

    let reply = task.await.unwrap().unwrap();
    assert_eq!(reply.as_deref(), Some("echo: hold on"));
    assert_eq!(orch.state("default"), SessionState::Idle);
    assert_eq!(orch.transcript("default").len(), 1);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_submit_returns_session_to_idle() {
    let llm = EchoLlm::new(Duration::from_secs(60));
    let orch = Arc::new(orchestrator(llm));

    let task = tokio::spawn({
        let orch = orch.clone();
        async move { orch.submit("default", "never finishes").await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(orch.state("default"), SessionState::Generating);

    task.abort();
    let _ = task.await;

    assert_eq!(orch.state("default"), SessionState::Idle);
    assert!(orch.transcript("default").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_do_not_cross_contaminate() {
    let llm = EchoLlm::new(Duration::from_millis(5));
    let orch = Arc::new(orchestrator(llm));

    let mut handles = Vec::new();
    for session in ["alice", "bob", "carol"] {
        let orch = orch.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..5 {
                let input = format!("{session}-{i}");
                orch.submit(session, &input).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for session in ["alice", "bob", "carol"] {
        let transcript = orch.transcript(session);
        assert_eq!(transcript.len(), 5);
        for (i, turn) in transcript.iter().enumerate() {
            let expected = format!("{session}-{i}");
            assert_eq!(turn.user_message(), expected);
            assert_eq!(turn.model_response(), format!("echo: {expected}"));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_session_does_not_block_other_session() {
    let llm = EchoLlm::new(Duration::from_secs(30));
    let orch = Arc::new(orchestrator(llm));

    let slow = tokio::spawn({
        let orch = orch.clone();
        async move { orch.submit("slow", "wait").await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;

    // The store is readable and writable while the slow call is pending.
    orch.store()
        .append("fast", mosscap_core::Turn::new("quick", "answer"));
    assert_eq!(orch.transcript("fast").len(), 1);
    assert!(orch.transcript("slow").is_empty());

    slow.await.unwrap().unwrap();
    assert_eq!(orch.transcript("slow").len(), 1);
}
