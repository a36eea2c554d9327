use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::Mutex;

/// One exchange: what the user said and what the model answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    user_message: String,
    model_response: String,
    recorded_at: DateTime<Local>,
}

impl Turn {
    pub fn new(user_message: impl Into<String>, model_response: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            model_response: model_response.into(),
            recorded_at: Local::now(),
        }
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn model_response(&self) -> &str {
        &self.model_response
    }

    pub fn recorded_at(&self) -> DateTime<Local> {
        self.recorded_at
    }

    pub fn as_pair(&self) -> (&str, &str) {
        (&self.user_message, &self.model_response)
    }
}

/// Append-only, ordered list of turns for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// `(user, model)` pairs in submission order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.turns.iter().map(Turn::as_pair).collect()
    }
}

/// Session id → transcript. Lock scope is a single read or write; callers get
/// snapshots, never references into the map.
#[derive(Debug, Default)]
pub struct HistoryStore {
    sessions: Mutex<HashMap<String, Transcript>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the session's transcript, inserting an empty one if unseen.
    pub fn get_or_create(&self, session_id: &str) -> Transcript {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.entry(session_id.to_string()).or_default().clone()
    }

    pub fn append(&self, session_id: &str, turn: Turn) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.entry(session_id.to_string()).or_default().push(turn);
    }

    /// Snapshot without creating the session.
    pub fn transcript(&self, session_id: &str) -> Option<Transcript> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(session_id).cloned()
    }

    pub fn len(&self, session_id: &str) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(session_id).map_or(0, Transcript::len)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.contains_key(session_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }
}
