//! The shared hot-takes list — the debate's collectively edited output.
//!
//! A small, bounded list of distinct strings that the currently active
//! persona may add to, sharpen, or prune. Mutations are ordinary tool
//! effects; exclusivity comes from the single-active-speaker invariant,
//! not from a lock here.

use std::error::Error;
use std::fmt;

/// Maximum number of hot takes the list may hold.
pub const MAX_HOT_TAKES: usize = 4;

/// Failure modes of hot-take mutations.
///
/// These are reported back to the invoking persona as tool-level failures
/// so the model can self-correct and narrate the correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotTakeError {
    /// The exact text is already present.
    Duplicate(String),
    /// The list already holds [`MAX_HOT_TAKES`] entries.
    CapacityExceeded,
    /// No entry matches the given text.
    NotFound(String),
}

impl fmt::Display for HotTakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotTakeError::Duplicate(text) => {
                write!(f, "Hot take already exists: '{}'", text)
            }
            HotTakeError::CapacityExceeded => {
                write!(f, "Limit reached ({}). Replace or delete first.", MAX_HOT_TAKES)
            }
            HotTakeError::NotFound(text) => {
                write!(f, "Hot take not found: '{}'", text)
            }
        }
    }
}

impl Error for HotTakeError {}

/// Ordered list of distinct hot takes, capacity [`MAX_HOT_TAKES`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HotTakes {
    takes: Vec<String>,
}

impl HotTakes {
    /// Create an empty list.
    pub fn new() -> Self {
        HotTakes::default()
    }

    /// Append a new take.
    pub fn add(&mut self, text: &str) -> Result<(), HotTakeError> {
        if self.takes.iter().any(|t| t == text) {
            return Err(HotTakeError::Duplicate(text.to_string()));
        }
        if self.takes.len() >= MAX_HOT_TAKES {
            return Err(HotTakeError::CapacityExceeded);
        }
        self.takes.push(text.to_string());
        Ok(())
    }

    /// Replace an existing take in place, preserving its position.
    ///
    /// No uniqueness check is applied to `new_text`.
    pub fn replace(&mut self, old_text: &str, new_text: &str) -> Result<(), HotTakeError> {
        match self.takes.iter().position(|t| t == old_text) {
            Some(index) => {
                self.takes[index] = new_text.to_string();
                Ok(())
            }
            None => Err(HotTakeError::NotFound(old_text.to_string())),
        }
    }

    /// Remove a take.
    pub fn delete(&mut self, text: &str) -> Result<(), HotTakeError> {
        match self.takes.iter().position(|t| t == text) {
            Some(index) => {
                self.takes.remove(index);
                Ok(())
            }
            None => Err(HotTakeError::NotFound(text.to_string())),
        }
    }

    /// Render the list for embedding into persona instructions.
    pub fn as_prompt_block(&self) -> String {
        if self.takes.is_empty() {
            return "(none yet)".to_string();
        }
        self.takes
            .iter()
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Owned copy of the current takes, in order.
    pub fn snapshot(&self) -> Vec<String> {
        self.takes.clone()
    }

    /// Number of takes currently held.
    pub fn len(&self) -> usize {
        self.takes.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.takes.is_empty()
    }
}
