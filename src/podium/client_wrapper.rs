//! Collaborator seams for the debate core.
//!
//! Everything the orchestration layer cannot do by itself — language-model
//! inference, speech synthesis, final-utterance transcription — is reached
//! through one of the narrow traits in this module. The session keeps
//! `Arc<dyn ...>` handles and never learns transport or provider details,
//! so swapping a provider only requires a different constructor.
//!
//! A [`LanguageClient`] returns plain [`Message`]s; when the model wants to
//! invoke a tool, the invocation travels *inside* the message text as a
//! `{"tool_call": {...}}` JSON fragment (see
//! [`parse_tool_invocation`](crate::podium::tools::parse_tool_invocation)).

use async_trait::async_trait;
use std::error::Error;

/// Boxed error type shared by every collaborator seam.
pub type CollaboratorError = Box<dyn Error + Send + Sync>;

/// Represents the possible roles for a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Set by the orchestrator to steer a persona's behaviour.
    System,
    /// A message the consuming persona should treat as said *to* it.
    User,
    /// A message the consuming persona said itself.
    Assistant,
}

/// A generic chat message handed to (or received from) a language model.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl Message {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Trait defining the interface to the language-model collaborator.
#[async_trait]
pub trait LanguageClient: Send + Sync {
    /// Generate the next reply for the given context.
    ///
    /// When `tool_choice` names a tool, the model is forced to answer with
    /// an invocation of exactly that tool; the invocation still arrives as
    /// a `{"tool_call": ...}` fragment in the returned message content.
    async fn generate_reply(
        &self,
        messages: &[Message],
        tool_choice: Option<&str>,
    ) -> Result<Message, CollaboratorError>;
}

/// Trait for the text-to-speech collaborator.
///
/// Only scripted lines go through this seam ("What do you think?", the
/// research hand-off line); playback of regular persona replies belongs to
/// the voice transport, which is out of scope here.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Trigger playback of a scripted line.
    async fn speak(&self, text: &str) -> Result<(), CollaboratorError>;

    /// Resolve once the currently playing audio has finished.
    ///
    /// The default resolves immediately so implementations without playout
    /// tracking keep working.
    async fn wait_for_playout(&self) {}
}

/// Trait for the speech-to-text collaborator.
///
/// The session only ever consumes *final* utterances: the first one may
/// supply the debate topic, every later one marks a completed user turn.
/// Returning `None` signals that the input stream has ended.
#[async_trait]
pub trait UtteranceSource: Send + Sync {
    /// Wait for the next finalized user utterance.
    async fn next_final_utterance(&mut self) -> Option<String>;
}
