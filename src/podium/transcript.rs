//! The shared debate transcript.
//!
//! An append-only, totally ordered log of attributed messages — the single
//! source of truth for "what was said by whom". All personas share the one
//! store; per-speaker views are derived by the
//! [`perspective`](crate::podium::perspective) module and never written
//! back.

use chrono::{DateTime, Utc};

use crate::podium::client_wrapper::Role;

/// Speaker label used for the human participant.
pub const USER_SPEAKER: &str = "user";

/// One attributed entry in the transcript.
#[derive(Clone, Debug, PartialEq)]
pub struct DebateMessage {
    /// Role as recorded at append time (`Assistant` for personas, `User`
    /// for the human).
    pub role: Role,
    /// Persona name, or [`USER_SPEAKER`]. Immutable once appended.
    pub speaker: String,
    /// Utterance text.
    pub content: String,
    /// Position in the store; strictly increasing, never reused.
    pub sequence: u64,
    /// Arrival time of the entry.
    pub spoken_at: DateTime<Utc>,
}

/// Ordered append-only log of [`DebateMessage`]s.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<DebateMessage>,
    next_sequence: u64,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Transcript::default()
    }

    /// Append an attributed message and return its sequence number.
    pub fn append(
        &mut self,
        role: Role,
        speaker: impl Into<String>,
        content: impl Into<String>,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(DebateMessage {
            role,
            speaker: speaker.into(),
            content: content.into(),
            sequence,
            spoken_at: Utc::now(),
        });
        sequence
    }

    /// Replace the content of an existing entry, keyed by message identity.
    ///
    /// This is the single corrective path: it exists to fix up an empty or
    /// interrupted utterance after the fact. The speaker attribution is
    /// never touched. Returns `false` when no entry has that sequence.
    pub fn amend(&mut self, sequence: u64, content: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|m| m.sequence == sequence) {
            Some(entry) => {
                entry.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Whether any user-authored message has been recorded yet.
    pub fn has_user_message(&self) -> bool {
        self.entries.iter().any(|m| m.role == Role::User)
    }

    /// All entries, in arrival order.
    pub fn entries(&self) -> &[DebateMessage] {
        &self.entries
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&DebateMessage> {
        self.entries.last()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_strictly_increase() {
        let mut transcript = Transcript::new();
        let a = transcript.append(Role::User, USER_SPEAKER, "hi");
        let b = transcript.append(Role::Assistant, "Ada", "hello");
        let c = transcript.append(Role::Assistant, "Rex", "greetings");
        assert!(a < b && b < c);
        let entries = transcript.entries();
        assert_eq!(entries[0].sequence, a);
        assert_eq!(entries[2].speaker, "Rex");
    }

    #[test]
    fn test_amend_replaces_content_and_keeps_speaker() {
        let mut transcript = Transcript::new();
        transcript.append(Role::User, USER_SPEAKER, "hi");
        let seq = transcript.append(Role::Assistant, "Ada", "");
        assert!(transcript.amend(seq, "recovered reply"));
        let entry = &transcript.entries()[1];
        assert_eq!(entry.content, "recovered reply");
        assert_eq!(entry.speaker, "Ada");
        assert_eq!(entry.sequence, seq);
    }

    #[test]
    fn test_amend_unknown_sequence_is_rejected() {
        let mut transcript = Transcript::new();
        transcript.append(Role::User, USER_SPEAKER, "hi");
        assert!(!transcript.amend(99, "nope"));
        assert_eq!(transcript.entries()[0].content, "hi");
    }

    #[test]
    fn test_has_user_message() {
        let mut transcript = Transcript::new();
        assert!(!transcript.has_user_message());
        transcript.append(Role::Assistant, "Ada", "opening");
        assert!(!transcript.has_user_message());
        transcript.append(Role::User, USER_SPEAKER, "question");
        assert!(transcript.has_user_message());
    }
}
