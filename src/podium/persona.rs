//! Debate personas and per-session voice assignment.
//!
//! A [`Persona`] is immutable once produced: the roster is created at
//! session start and shared read-only with every ephemeral speaker
//! instance. Voices are picked once per session from a fixed per-category
//! table and treated as configuration afterwards.

use async_trait::async_trait;
use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::podium::client_wrapper::CollaboratorError;

/// Voice-selection dimension for a persona.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoiceCategory {
    Female,
    Male,
}

impl VoiceCategory {
    /// Wire/label form used in logs and UI payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceCategory::Female => "female",
            VoiceCategory::Male => "male",
        }
    }
}

/// A debate participant with a fixed identity and stance.
#[derive(Clone, Debug, PartialEq)]
pub struct Persona {
    /// Small integer id, stable for the session.
    pub id: u32,
    /// Display name, unique within the session.
    pub name: String,
    /// System-prompt text describing the persona's stance and style.
    pub prompt: String,
    /// Voice-selection dimension.
    pub category: VoiceCategory,
    /// Public one-line bio for the UI.
    pub description: String,
}

lazy_static! {
    /// Voice options per category. Assignment is `options[id % len]`.
    static ref VOICES: HashMap<VoiceCategory, Vec<&'static str>> = {
        let mut m = HashMap::new();
        m.insert(VoiceCategory::Female, vec!["Ara", "Eve", "Una"]);
        m.insert(VoiceCategory::Male, vec!["Rex", "Sal", "Leo"]);
        m
    };
}

/// Fallback voice when a category has no options.
const DEFAULT_VOICE: &str = "eve";

/// Pick the voice identifier for a persona.
pub fn select_voice(persona: &Persona) -> String {
    match VOICES.get(&persona.category) {
        Some(options) if !options.is_empty() => {
            options[persona.id as usize % options.len()].to_lowercase()
        }
        _ => DEFAULT_VOICE.to_string(),
    }
}

/// Compute the session-wide voice assignment map, once, at roster time.
pub fn assign_voices(roster: &[Persona]) -> HashMap<u32, String> {
    roster
        .iter()
        .map(|p| (p.id, select_voice(p)))
        .collect()
}

/// Trait producing the persona roster once the debate topic is known.
///
/// Generation wording is a collaborator concern; the core only needs the
/// finished roster.
#[async_trait]
pub trait PersonaSource: Send + Sync {
    /// Produce the roster for the given topic and requested voice mix.
    async fn roster(
        &self,
        topic: &str,
        categories: &[VoiceCategory],
    ) -> Result<Vec<Persona>, CollaboratorError>;
}

/// A [`PersonaSource`] that returns a preset roster regardless of topic.
pub struct FixedRoster {
    personas: Vec<Persona>,
}

impl FixedRoster {
    /// Wrap a preset roster.
    pub fn new(personas: Vec<Persona>) -> Self {
        FixedRoster { personas }
    }
}

#[async_trait]
impl PersonaSource for FixedRoster {
    async fn roster(
        &self,
        _topic: &str,
        _categories: &[VoiceCategory],
    ) -> Result<Vec<Persona>, CollaboratorError> {
        Ok(self.personas.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona(id: u32, name: &str, category: VoiceCategory) -> Persona {
        Persona {
            id,
            name: name.to_string(),
            prompt: String::new(),
            category,
            description: String::new(),
        }
    }

    #[test]
    fn test_voice_selection_wraps_by_id() {
        let a = persona(0, "Ada", VoiceCategory::Female);
        let b = persona(3, "Bea", VoiceCategory::Female);
        // Three female options, so id 0 and id 3 land on the same voice.
        assert_eq!(select_voice(&a), select_voice(&b));
        assert_eq!(select_voice(&a), "ara");
    }

    #[test]
    fn test_voice_assignment_is_stable() {
        let roster = vec![
            persona(0, "Ada", VoiceCategory::Female),
            persona(1, "Rex", VoiceCategory::Male),
        ];
        let first = assign_voices(&roster);
        let second = assign_voices(&roster);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.get(&1).map(String::as_str), Some("sal"));
    }

    #[tokio::test]
    async fn test_fixed_roster_ignores_topic() {
        let source = FixedRoster::new(vec![persona(0, "Ada", VoiceCategory::Female)]);
        let roster = source
            .roster("anything", &[VoiceCategory::Female])
            .await
            .unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Ada");
    }
}
