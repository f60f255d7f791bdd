//! # Podium
//!
//! Podium is a Rust toolkit for orchestrating spoken debates between a
//! small roster of AI personas and a human participant.
//!
//! The crate owns the turn-taking and shared-state core of such a debate:
//!
//! * **Turn-Taking State Machine**: exactly one persona holds the floor at
//!   a time; the floor only moves through an explicit
//!   `giveTurnToNextSpeaker` decision, never by polling
//! * **Transcript & Perspectives**: an append-only attributed transcript,
//!   reshaped into each speaker's point of view (self as assistant,
//!   everyone else attributed as user input) by a pure transform
//! * **Shared Debate Artifacts**: a bounded, collectively edited hot-takes
//!   list and a per-persona research-result table, both owned by the
//!   session and outliving every ephemeral speaker
//! * **Research Races**: redundant research attempts raced in the
//!   background, first success wins, losers cancelled before they can
//!   touch shared state
//! * **Outbound Event Gateway**: validated, best-effort UI notifications
//!   with bounded retry and a strict allow-list filter between LLM avatar
//!   calls and the frontend
//!
//! Speech-to-text, text-to-speech, media transport, and language-model
//! inference itself are collaborators behind narrow traits — see
//! [`client_wrapper`](podium::client_wrapper) — and the bundled
//! [`XaiClient`](podium::clients::xai::XaiClient) covers the
//! language-model and research seams for any OpenAI-compatible endpoint.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use podium::{DebateConfig, DebateSession, FixedRoster, Persona, VoiceCategory};
//! use podium::clients::xai::XaiClient;
//! # use podium::client_wrapper::{CollaboratorError, SpeechSynthesizer};
//! # use podium::gateway::RemoteChannel;
//! # use async_trait::async_trait;
//! # struct NullSpeech;
//! # #[async_trait]
//! # impl SpeechSynthesizer for NullSpeech {
//! #     async fn speak(&self, _text: &str) -> Result<(), CollaboratorError> { Ok(()) }
//! # }
//! # struct NullChannel;
//! # #[async_trait]
//! # impl RemoteChannel for NullChannel {
//! #     fn is_attached(&self) -> bool { false }
//! #     async fn publish(&self, _e: &str, _p: &serde_json::Value) -> Result<(), CollaboratorError> { Ok(()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     podium::init_logger();
//!
//!     let xai = Arc::new(XaiClient::new(
//!         &std::env::var("XAI_API_KEY")?,
//!         "grok-4-1-fast-non-reasoning",
//!     ));
//!     let roster = Arc::new(FixedRoster::new(vec![Persona {
//!         id: 0,
//!         name: "Raven".into(),
//!         prompt: "A sardonic goth coder who treats debates like stand-up.".into(),
//!         category: VoiceCategory::Female,
//!         description: "Deflects with sarcasm.".into(),
//!     }]));
//!
//!     let mut session = DebateSession::new(
//!         DebateConfig::with_topic("should we ban homework?"),
//!         xai.clone(),
//!         Arc::new(NullSpeech),
//!         roster,
//!         xai,
//!         Arc::new(NullChannel),
//!     );
//!     session.start().await?;
//!     session.on_user_utterance("I say ban it all").await?;
//!     Ok(())
//! }
//! ```
//!
//! Continue exploring the modules re-exported from the crate root for the
//! individual building blocks.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding
/// Podium can opt in to simple `RUST_LOG` driven diagnostics without
/// having to choose a specific logging backend upfront.
///
/// ```rust
/// podium::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `podium` module.
pub mod podium;

// Re-exporting key items for easier external access.
pub use crate::podium::client_wrapper;
pub use crate::podium::client_wrapper::{
    CollaboratorError, LanguageClient, Message, Role, SpeechSynthesizer, UtteranceSource,
};
pub use crate::podium::clients;
pub use crate::podium::config::DebateConfig;
pub use crate::podium::debate_session::DebateSession;
pub use crate::podium::gateway;
pub use crate::podium::gateway::{
    EventGateway, RemoteChannel, ResearchPhase, UiEvent, PUBLISH_ATTEMPTS,
};
pub use crate::podium::hot_takes::{HotTakeError, HotTakes, MAX_HOT_TAKES};
pub use crate::podium::persona::{
    assign_voices, select_voice, FixedRoster, Persona, PersonaSource, VoiceCategory,
};
pub use crate::podium::perspective::perspective_for;
pub use crate::podium::research;
pub use crate::podium::research::{
    ResearchClient, ResearchExhausted, ResearchFinding, ResearchManager, RESEARCH_ATTEMPTS,
};
pub use crate::podium::session_state::{shared_state, SessionState, SharedState};
pub use crate::podium::speaker::Speaker;
pub use crate::podium::tools;
pub use crate::podium::transcript::{DebateMessage, Transcript, USER_SPEAKER};
pub use crate::podium::turn::{resolve_speaker, SpeakerResolution, TurnState};
