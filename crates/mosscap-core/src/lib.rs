pub mod error;
pub mod constants;
pub mod llm;
pub mod context;
pub mod chat;
pub mod config;

// Re-export key types
pub use error::MosscapError;
pub use llm::{
    ClientBuilder, ClientConfig, ClientFactory, LlmResponse, Message, ModelClient, OllamaBuilder,
    OllamaClient, Role, Usage,
};
pub use context::{ContextBuilder, HistoryStore, Transcript, Turn};
pub use chat::{SessionState, TurnOrchestrator, TurnReport};
pub use config::Settings;
