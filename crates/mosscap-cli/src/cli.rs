use clap::Parser;
use mosscap_core::Settings;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mosscap")]
#[command(about = "Uses Ollama to chat with a locally hosted LLM")]
#[command(version)]
pub struct Cli {
    /// Name of the Ollama model to converse with [default: gemma3:12b-it-qat]
    #[arg(short = 'm', long = "llm_model", visible_alias = "llm-model")]
    pub llm_model: Option<String>,

    /// Sampling temperature in [0, 1]
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Ollama server URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Session identifier the conversation is stored under
    #[arg(long)]
    pub session: Option<String>,

    /// Color theme (moss, dark, plain)
    #[arg(long)]
    pub theme: Option<String>,

    /// Give up on a model call after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip checking that the model is installed before chatting
    #[arg(long)]
    pub no_verify_model: bool,

    /// Read settings from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Send a single prompt, print the reply and exit
    #[arg(short, long)]
    pub prompt: Option<String>,
}

impl Cli {
    /// Load settings (explicit `--config` errors are fatal, the default
    /// location falls back to defaults) and apply flag overrides.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match self.config {
            Some(ref path) => Settings::load_from(path)?,
            None => Settings::load(),
        };
        self.apply(&mut settings);
        Ok(settings)
    }

    pub fn apply(&self, settings: &mut Settings) {
        if let Some(ref model) = self.llm_model {
            settings.llm.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            settings.llm.temperature = temperature;
        }
        if let Some(ref url) = self.base_url {
            settings.llm.base_url = url.clone();
        }
        if let Some(ref session) = self.session {
            settings.ui.session_id = session.clone();
        }
        if let Some(ref theme) = self.theme {
            settings.ui.theme = theme.clone();
        }
        if let Some(secs) = self.timeout {
            settings.llm.request_timeout_secs = Some(secs);
        }
        if self.no_verify_model {
            settings.llm.verify_model = false;
        }
    }
}
