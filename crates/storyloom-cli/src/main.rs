//! Storyloom terminal front end.

mod error;
mod markdown;
mod repl;
mod terminal;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use storyloom_core::gateway::GenerationGateway;
use storyloom_gateway::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use storyloom_gateway::{GeminiConfig, GeminiGateway, ProxyGateway};
use storyloom_story::application::controller::TurnController;
use storyloom_story::domain::parameters::SessionSetup;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::terminal::TerminalPresenter;

/// Command-line arguments for the story player.
#[derive(Parser, Debug)]
#[command(name = "storyloom")]
#[command(about = "Play a generated choose-your-own-adventure story in the terminal")]
#[command(version)]
struct Args {
    /// Story genre; asked for interactively when omitted
    #[arg(long)]
    genre: Option<String>,

    /// Main character; asked for interactively when omitted
    #[arg(long)]
    character: Option<String>,

    /// Writing style; asked for interactively when omitted
    #[arg(long)]
    style: Option<String>,

    /// Storyloom backend to send prompts through
    #[arg(long, env = "STORYLOOM_SERVER_URL", default_value = "http://localhost:3000")]
    server_url: String,

    /// Call Gemini directly instead of going through the backend
    #[arg(long)]
    direct: bool,

    /// Gemini API key, required with --direct
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model used with --direct
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    gemini_model: String,

    /// Sampling temperature used with --direct
    #[arg(long, env = "GEMINI_TEMPERATURE", default_value_t = 0.8)]
    gemini_temperature: f32,

    /// Gemini endpoint root used with --direct
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    gemini_base_url: String,

    /// Seconds to wait for a generation before giving up
    #[arg(long, env = "GENERATION_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,

    /// Delay between revealed characters
    #[arg(long, default_value_t = 10)]
    typing_delay_ms: u64,

    /// Print each segment at once
    #[arg(long)]
    no_typing: bool,
}

impl Args {
    fn gateway(&self) -> Result<Arc<dyn GenerationGateway>, CliError> {
        if self.timeout_secs == 0 {
            return Err(CliError::Config(
                "--timeout-secs must be greater than zero".to_owned(),
            ));
        }
        let timeout = Duration::from_secs(self.timeout_secs);

        if !self.direct {
            return Ok(Arc::new(ProxyGateway::new(&self.server_url, timeout)?));
        }

        let api_key = self
            .gemini_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CliError::Config("--direct requires GEMINI_API_KEY".to_owned()))?;
        let config = GeminiConfig::new(api_key)
            .with_model(&self.gemini_model)
            .with_temperature(self.gemini_temperature)
            .with_base_url(&self.gemini_base_url)
            .with_timeout(timeout);
        Ok(Arc::new(GeminiGateway::new(config)?))
    }

    fn typing_delay(&self) -> Option<Duration> {
        (!self.no_typing).then(|| Duration::from_millis(self.typing_delay_ms))
    }

    fn setup(&self) -> SessionSetup {
        SessionSetup {
            genre: self.genre.clone(),
            character: self.character.clone(),
            style: self.style.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with the story on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let gateway = args.gateway()?;
    let presenter = Arc::new(TerminalPresenter::new(std::io::stdout(), args.typing_delay()));
    let controller = Arc::new(TurnController::new(gateway, presenter.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let setup = repl::complete_setup(args.setup(), &mut lines, presenter.as_ref()).await?;
    repl::run(controller, setup, &mut lines, presenter.as_ref()).await
}
