// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, load the config, build the client and
//   hand everything to the chat session.
// - Errors come back as `anyhow::Error` and are printed once, here.

use anyhow::{Context, Result};
use chatterbox_cli::api::{default_http_client, CompletionClient};
use chatterbox_cli::config::Config;
use chatterbox_cli::progress::ProgressIndicator;
use chatterbox_cli::transcript::TranscriptStore;
use chatterbox_cli::ui::{self, ChatSession};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Chat with an OpenAI model from the terminal. The conversation is kept
/// between runs until you start a new one.
#[derive(Debug, Parser)]
#[command(name = "chatterbox", version)]
struct Cli {
    /// The message to send to the assistant.
    message: Option<String>,

    /// Start a new chat.
    #[arg(short, long)]
    new: bool,

    /// Specify the AI model.
    #[arg(short, long)]
    model: Option<String>,

    /// Set the temperature for response randomness.
    #[arg(short, long)]
    temperature: Option<f64>,

    /// Set the nucleus sampling probability (top_p).
    #[arg(short = 'p', long)]
    top_p: Option<f64>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Read input from a file.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout only ever carries the reply. `RUST_LOG`
/// overrides the level picked by `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    config
        .ensure_directories()
        .context("Failed to create chatterbox directories")?;

    let params = config.generation_parameters(cli.model.as_deref(), cli.temperature, cli.top_p);
    ui::validate_model(&params.model)?;

    let http = default_http_client().context("Failed to build HTTP client")?;
    let mut client = CompletionClient::new(http, config.api_key.clone());
    if let Some(endpoint) = &config.endpoint {
        client = client.with_endpoint(endpoint.clone());
    }
    debug!(endpoint = client.endpoint(), log_dir = %config.log_dir().display(), "configured");

    let store = TranscriptStore::new(config.log_dir());
    let progress = ProgressIndicator::new().with_message("Waiting for response");
    let mut session = ChatSession::new(store, client, progress);

    if cli.new {
        if let Some(path) = session.start_new_chat()? {
            eprintln!("Archived previous chat to {}", path.display());
        }
    }

    let input = ui::read_user_input(cli.message, cli.file.as_deref())?;
    if input.trim().is_empty() {
        eprintln!("Nothing to send.");
        return Ok(());
    }

    let reply = session.send(&input, &params)?;
    println!("{reply}");
    Ok(())
}
