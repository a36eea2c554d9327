mod traits;
mod ollama;
pub mod factory;

pub use traits::*;
pub use ollama::{OllamaBuilder, OllamaClient};
pub use factory::{ClientBuilder, ClientConfig, ClientFactory};
