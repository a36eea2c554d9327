use anyhow::Result;
use clap::Parser;
use mosscap_cli::{app, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the TUI and prompt replies.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    if let Some(ref prompt) = cli.prompt {
        app::run_single_prompt(&settings, prompt).await?;
    } else {
        app::run_tui(settings).await?;
    }

    Ok(())
}
