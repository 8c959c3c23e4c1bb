// Library root
// -----------
// This crate exposes the library surface behind the `chatterbox` binary.
// The binary (`main.rs`) parses flags and loads config, then hands off to
// the chat session in `ui`.
//
// Module responsibilities:
// - `types`: messages, transcripts, models and generation parameters.
// - `error`: the classified error kinds for requests, transcripts and config.
// - `api`: the blocking HTTP client for the chat-completion endpoint.
// - `transcript`: loading, saving and archiving `chat.log`.
// - `summary`: short labels for archived chats.
// - `progress`: the spinner shown while a request is outstanding.
// - `config`: the config file and environment overrides.
// - `ui`: the chat flow, input reading and user-facing error messages.
pub mod api;
pub mod config;
pub mod error;
pub mod progress;
pub mod summary;
pub mod transcript;
pub mod types;
pub mod ui;
