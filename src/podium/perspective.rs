//! Per-speaker transcript perspectives.
//!
//! Each persona sees the shared transcript from its own point of view:
//! its own messages come back as `Assistant` turns with untouched content,
//! while everything said by anyone else — other personas and the human
//! alike — becomes a `User` turn carrying an attribution prefix. The
//! transformation is a pure function over the store; the store itself is
//! never mutated, so re-application always starts from untransformed
//! source material.

use crate::podium::client_wrapper::{Message, Role};
use crate::podium::transcript::Transcript;

/// Derive `persona_name`'s view of the transcript.
pub fn perspective_for(transcript: &Transcript, persona_name: &str) -> Vec<Message> {
    transcript
        .entries()
        .iter()
        .map(|entry| {
            if entry.speaker == persona_name {
                Message {
                    role: Role::Assistant,
                    content: entry.content.clone(),
                }
            } else {
                Message {
                    role: Role::User,
                    content: format!("{} says: {}", entry.speaker, entry.content),
                }
            }
        })
        .collect()
}
