//! The turn-taking state machine.
//!
//! Exactly one persona holds the floor at any instant (or none, during
//! bootstrap). The state only ever changes through an explicit handoff
//! decision — nothing polls. Speaker-name matching is case-insensitive
//! and exact against the stored roster name; there is no partial or fuzzy
//! matching.

use crate::podium::persona::Persona;
use crate::podium::transcript::USER_SPEAKER;

/// Who currently holds the turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    /// No active speaker yet; waiting for a topic and roster.
    Bootstrap,
    /// The persona with this id holds the floor.
    SpeakerActive(u32),
    /// A speaker explicitly yielded to the human and is suspended.
    AwaitingUser,
}

/// Outcome of matching a next-speaker decision against the roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeakerResolution {
    /// A known persona was named.
    Persona(u32),
    /// The literal "user" was named.
    User,
    /// The name matched nothing; the current speaker keeps the floor.
    Unrecognized,
}

/// Resolve a next-speaker name against the roster.
pub fn resolve_speaker(roster: &[Persona], name: &str) -> SpeakerResolution {
    let wanted = name.trim().to_lowercase();
    if wanted == USER_SPEAKER {
        return SpeakerResolution::User;
    }
    for persona in roster {
        if persona.name.to_lowercase() == wanted {
            return SpeakerResolution::Persona(persona.id);
        }
    }
    SpeakerResolution::Unrecognized
}
