// Summaries for archived chats: a second, tiny completion request that asks
// the cheapest model for a label of a few words.

use crate::api::Completion;
use crate::error::CompletionError;
use crate::types::{GenerationParameters, Message, Model, Transcript, DEFAULT_SYSTEM_PROMPT};

const SUMMARY_MAX_TOKENS: u32 = 10;
const SUMMARY_TEMPERATURE: f64 = 0.5;
const SUMMARY_TOP_P: f64 = 0.5;

/// Produces short labels for transcripts through any [`Completion`].
pub struct Summarizer<C> {
    client: C,
}

impl<C: Completion> Summarizer<C> {
    pub fn new(client: C) -> Self {
        Summarizer { client }
    }

    /// Ask for a label under five words. The raw reply is only trimmed;
    /// making it safe for a file name is up to the caller.
    pub fn summarize(&self, transcript: &Transcript) -> Result<String, CompletionError> {
        let messages = [
            Message::system(DEFAULT_SYSTEM_PROMPT),
            Message::user(summary_prompt(transcript)),
        ];
        let label = self.client.complete(&messages, &summary_parameters())?;
        Ok(label.trim().to_string())
    }
}

fn summary_prompt(transcript: &Transcript) -> String {
    format!(
        "Summarize the following conversation in less than 5 words:\n\n{}",
        transcript.to_plain_text()
    )
}

fn summary_parameters() -> GenerationParameters {
    GenerationParameters::new(Model::cheapest().as_str())
        .temperature(SUMMARY_TEMPERATURE)
        .top_p(SUMMARY_TOP_P)
        .max_tokens(Some(SUMMARY_MAX_TOKENS))
}
