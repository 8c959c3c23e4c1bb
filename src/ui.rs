// UI layer: the chat flow behind the `chatterbox` command. It wires the
// transcript store, the completion client and the progress indicator
// together, reads the user's message and turns failures into short
// user-facing messages.

use crate::api::Completion;
use crate::error::CompletionError;
use crate::progress::ProgressIndicator;
use crate::summary::Summarizer;
use crate::transcript::TranscriptStore;
use crate::types::{GenerationParameters, Model, Transcript};
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Label used when the chat log cannot be decoded and is moved aside.
pub const UNREADABLE_LABEL: &str = "unreadable";

/// One conversation: the store that owns `chat.log`, the client that talks
/// to the completion service and the spinner shown while waiting on it.
pub struct ChatSession<C> {
    store: TranscriptStore,
    client: C,
    progress: ProgressIndicator,
}

impl<C: Completion> ChatSession<C> {
    pub fn new(store: TranscriptStore, client: C, progress: ProgressIndicator) -> Self {
        ChatSession {
            store,
            client,
            progress,
        }
    }

    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    /// Archive the current chat under a generated summary so the next
    /// message starts a fresh transcript. Returns the archive path, or `None`
    /// when there was no chat to archive.
    pub fn start_new_chat(&mut self) -> Result<Option<PathBuf>> {
        if !self.store.exists() {
            return Ok(None);
        }
        let label = match self.store.load() {
            Ok(transcript) => {
                let summarizer = Summarizer::new(&self.client);
                self.progress
                    .run(|| summarizer.summarize(&transcript))
                    .context("Failed to summarize the current chat")?
            }
            Err(e) if e.is_unreadable() => {
                warn!(error = %e, "archiving unreadable chat log without a summary");
                UNREADABLE_LABEL.to_string()
            }
            Err(e) => return Err(e).context("Failed to load chat log"),
        };

        let archived = self
            .store
            .archive(&label)
            .context("Failed to archive chat log")?;
        if let Some(path) = &archived {
            info!(path = %path.display(), "chat archived");
        }
        Ok(archived)
    }

    /// Append `input` to the conversation, wait for the reply and save both.
    /// Nothing is written unless the request succeeds.
    pub fn send(&mut self, input: &str, params: &GenerationParameters) -> Result<String> {
        let (mut transcript, unreadable) = match self.store.load() {
            Ok(transcript) => (transcript, false),
            Err(e) if e.is_unreadable() => {
                warn!(error = %e, "chat log unreadable, starting a fresh transcript");
                (Transcript::new(), true)
            }
            Err(e) => return Err(e).context("Failed to load chat log"),
        };
        transcript.push_user(input);

        let client = &self.client;
        let reply = self
            .progress
            .run(|| client.complete(transcript.messages(), params))?;
        transcript.push_assistant(reply.as_str());

        // Keep the undecodable file around instead of writing over it.
        if unreadable {
            self.store
                .archive(UNREADABLE_LABEL)
                .context("Failed to move unreadable chat log aside")?;
        }
        self.store
            .save(&transcript)
            .context("Failed to save chat log")?;
        Ok(reply)
    }
}

/// Pick the message from the argument, then the file, then stdin.
pub fn read_user_input(message: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(message) = message {
        return Ok(message);
    }
    if let Some(path) = file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read message from {}", path.display()));
    }

    let stdin = io::stdin();
    if stdin.is_tty() {
        eprintln!("Enter your message (end with EOF or Ctrl+D):");
    } else {
        info!("reading piped input");
    }
    let mut input = String::new();
    stdin
        .lock()
        .read_to_string(&mut input)
        .context("Failed to read message from stdin")?;
    Ok(input)
}

/// Check a model name before anything touches disk or the network.
pub fn validate_model(name: &str) -> Result<Model> {
    name.parse::<Model>().with_context(|| {
        let known: Vec<&str> = Model::ALL.iter().map(|m| m.as_str()).collect();
        format!("Invalid model specified. Known models: {}", known.join(", "))
    })
}

/// User-facing text for an error, keyed on the completion failure kind when
/// there is one in the chain.
pub fn describe_error(err: &anyhow::Error) -> String {
    let completion = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<CompletionError>());
    match completion {
        Some(CompletionError::RateLimited) => {
            "Rate limit exceeded. Please wait and try again later.".to_string()
        }
        Some(CompletionError::Unauthorized) => {
            "Invalid API key. Please check your configuration.".to_string()
        }
        Some(e @ CompletionError::Http { .. }) => e.to_string(),
        _ => format!("{err:#}"),
    }
}

/// Print an error to stderr.
pub fn report_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), describe_error(err));
}
