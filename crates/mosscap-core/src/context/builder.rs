use crate::context::Transcript;
use crate::llm::Message;

/// Turns a transcript plus the new input into the message list sent to the
/// model. The whole transcript is replayed every time.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    system_prompt: Option<String>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        };
        self
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn build(&self, transcript: &Transcript, user_input: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(transcript.len() * 2 + 2);

        if let Some(ref system) = self.system_prompt {
            messages.push(Message::system(system));
        }

        for turn in transcript.iter() {
            messages.push(Message::user(turn.user_message()));
            messages.push(Message::assistant(turn.model_response()));
        }

        messages.push(Message::user(user_input));
        messages
    }

    /// Rough token count for a payload (4 chars per token).
    pub fn estimate_tokens(messages: &[Message]) -> usize {
        messages.iter().map(|m| m.content.len() / 4).sum()
    }
}
