//! Shared defaults and labels, so the CLI and core agree on them.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    /// Model used when `--llm_model` is not given.
    pub const DEFAULT_MODEL: &str = "gemma3:12b-it-qat";
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
}

// ─── Sessions ─────────────────────────────────────────────────────────────────

pub mod session {
    /// The single session used when the host does not supply one.
    pub const DEFAULT_SESSION_ID: &str = "default";
}

// ─── UI labels ────────────────────────────────────────────────────────────────

pub mod ui {
    pub const ASSISTANT_NAME: &str = "Mosscap";
    pub const USER_LABEL: &str = "You";
    pub const INPUT_PLACEHOLDER: &str = "What do humans need?";
    pub const THINKING: &str = "Thinking...";
    pub const DEFAULT_THEME: &str = "moss";
}
