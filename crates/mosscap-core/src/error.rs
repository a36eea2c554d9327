use thiserror::Error;

#[derive(Error, Debug)]
pub enum MosscapError {
    /// The model client could not be constructed for a configuration.
    #[error("Client initialization error: {0}")]
    ClientInitialization(String),

    /// A single call to the model failed. The transcript is left untouched.
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Session '{0}' already has a request in flight")]
    SessionBusy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl MosscapError {
    pub fn client_init(message: impl Into<String>) -> Self {
        Self::ClientInitialization(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation(_))
    }

    pub fn is_client_init(&self) -> bool {
        matches!(self, Self::ClientInitialization(_))
    }
}

pub type Result<T> = std::result::Result<T, MosscapError>;
