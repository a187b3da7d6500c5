use anyhow::Result;
use clap::Parser;
use deepchat_cli::app;
use deepchat_core::Settings;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "deepchat")]
#[command(about = "DeepChat - coding assistant backed by a local Ollama model")]
#[command(version)]
struct Cli {
    /// Run a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Model identifier to pass to Ollama
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    base_url: Option<String>,

    /// Extra instructions appended to the system instruction
    #[arg(long)]
    system: Option<String>,

    /// Color theme (dark, sky, dracula)
    #[arg(long)]
    theme: Option<String>,

    /// Start with the sidebar hidden
    #[arg(long)]
    no_sidebar: bool,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file (the TUI otherwise discards them)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // Anything printed to the terminal would tear the TUI.
        None if interactive => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref(), cli.prompt.is_none())?;

    // An explicit --config must load; a broken default file falls back to
    // defaults with a warning the user gets to see.
    let (mut settings, startup_warning) = match cli.config {
        Some(ref path) => (Settings::load_from(path)?, None),
        None => {
            let path = Settings::config_path();
            match Settings::load_or_default(&path) {
                Ok(settings) => (settings, None),
                Err(e) => {
                    let warning = format!("Ignoring config at {}: {e}", path.display());
                    tracing::warn!("{warning}");
                    (Settings::default(), Some(warning))
                }
            }
        }
    };

    if let Some(ref model) = cli.model {
        settings.select_model(model.clone());
    }
    if let Some(ref url) = cli.base_url {
        settings.llm.base_url = url.clone();
    }
    if let Some(ref system) = cli.system {
        settings.chat.custom_instructions = Some(system.clone());
    }
    if let Some(ref theme) = cli.theme {
        settings.ui.theme = theme.clone();
    }
    if cli.no_sidebar {
        settings.ui.show_sidebar = false;
    }

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&settings, &prompt).await?;
    } else {
        app::run_tui(settings, startup_warning).await?;
    }

    Ok(())
}
