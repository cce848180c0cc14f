use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lanibot::config::Settings;
use lanibot::models::request::QuizMode;
use tracing_subscriber::EnvFilter;

mod commands;
mod prompt;
mod session;

use commands::{chat::handle_chat, health::handle_health, question::handle_question};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base url (overrides LANIBOT_API__BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Verification widget response (overrides LANIBOT_VERIFICATION__TOKEN)
    #[arg(long, global = true)]
    turnstile_token: Option<String>,

    /// Send the placeholder credential instead of a widget response
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a study session for the selected LLABs
    Chat {
        /// LLAB numbers to study (1-12)
        #[arg(short, long = "llab", required = true, num_args = 1..)]
        llabs: Vec<u32>,

        /// Quiz mode: mixed, static_only or ai_only
        #[arg(short, long, default_value_t = QuizMode::Mixed)]
        mode: QuizMode,
    },

    /// Check whether the backend is up
    Health,

    /// Print one question from the fixed question bank
    Question {
        /// LLAB numbers to draw from (1-12)
        #[arg(short, long = "llab", required = true, num_args = 1..)]
        llabs: Vec<u32>,
    },
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::new().context("Failed to load configuration")?;
        if let Some(base_url) = &self.base_url {
            settings.api.base_url = base_url.clone();
        }
        if let Some(token) = &self.turnstile_token {
            settings.verification.token = Some(token.clone());
        }
        if self.dev {
            settings.verification.dev_mode = true;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    match cli.command {
        Command::Chat { llabs, mode } => handle_chat(settings, llabs, mode).await,
        Command::Health => handle_health(settings).await,
        Command::Question { llabs } => handle_question(settings, llabs).await,
    }
}
