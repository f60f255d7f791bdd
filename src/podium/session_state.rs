//! Session-owned mutable state shared across speaker swaps.
//!
//! Ephemeral speaker instances come and go on every handoff; the state in
//! this module is the only thing that outlives them. It is created at
//! session start and dropped with the session — nothing here persists
//! across sessions or processes.
//!
//! Turn-holding mutations (hot takes) are serialized by the
//! single-active-speaker invariant. The lock exists for the two places
//! genuine concurrency remains: research completions and outbound
//! publishes land from background tasks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::podium::hot_takes::HotTakes;
use crate::podium::research::ResearchFinding;

/// Mutable shared state owned by a single debate session.
#[derive(Debug, Default)]
pub struct SessionState {
    /// The collectively edited hot-takes list.
    pub hot_takes: HotTakes,
    /// Unconsumed research findings, keyed by persona id. A finding stays
    /// in place after it is folded into the persona's instructions.
    pub research_results: HashMap<u32, ResearchFinding>,
    /// Persona ids currently out of the room awaiting a research outcome.
    pub researching: HashSet<u32>,
    /// Voice assignment computed once at roster time.
    pub voices: HashMap<u32, String>,
}

impl SessionState {
    /// Fresh state for a new session: empty artifacts, no voices yet.
    pub fn new() -> Self {
        SessionState::default()
    }
}

/// Handle shared between the session and its background tasks.
pub type SharedState = Arc<RwLock<SessionState>>;

/// Allocate a fresh [`SharedState`].
pub fn shared_state() -> SharedState {
    Arc::new(RwLock::new(SessionState::new()))
}
