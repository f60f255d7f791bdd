//! Configuration for a debate session.
//!
//! Provides the [`DebateConfig`] struct consumed by
//! [`DebateSession`](crate::podium::debate_session::DebateSession).
//! Users construct it manually — no file parsing dependencies are
//! required.

use crate::podium::persona::VoiceCategory;

/// Knobs for one debate session.
///
/// This struct is intentionally minimal and callers construct it however
/// they want. No TOML, YAML, or other config-file parsing dependencies
/// are introduced.
#[derive(Clone, Debug)]
pub struct DebateConfig {
    /// Debate topic. `None` means the session bootstraps from the first
    /// final user utterance instead.
    pub topic: Option<String>,
    /// Voice categories requested for the roster.
    pub categories: Vec<VoiceCategory>,
    /// Redundant attempts launched per research query.
    pub research_attempts: usize,
    /// Delivery attempts per outbound UI event.
    pub publish_attempts: usize,
    /// Cap on tool round-trips within a single persona reply.
    pub max_tool_iterations: usize,
}

impl Default for DebateConfig {
    fn default() -> Self {
        DebateConfig {
            topic: None,
            categories: vec![VoiceCategory::Male, VoiceCategory::Female],
            research_attempts: crate::podium::research::RESEARCH_ATTEMPTS,
            publish_attempts: crate::podium::gateway::PUBLISH_ATTEMPTS,
            max_tool_iterations: 5,
        }
    }
}

impl DebateConfig {
    /// Config for a session whose topic is already known.
    pub fn with_topic(topic: impl Into<String>) -> Self {
        DebateConfig {
            topic: Some(topic.into()),
            ..DebateConfig::default()
        }
    }
}
