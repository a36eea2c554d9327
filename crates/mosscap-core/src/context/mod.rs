mod history;
mod builder;

pub use history::{HistoryStore, Transcript, Turn};
pub use builder::ContextBuilder;
