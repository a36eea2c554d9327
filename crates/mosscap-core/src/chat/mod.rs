mod orchestrator;

pub use orchestrator::{SessionState, TurnOrchestrator, TurnReport};
