//! Racing research side-quests.
//!
//! A research request fans out into a handful of redundant attempts
//! against the external research capability; the first attempt to finish
//! successfully wins, and the losers are aborted immediately so they can
//! never race the winner into shared state. The single winning finding is
//! the only value ever handed back to the caller, which performs the one
//! write into the research-result table.

use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::podium::client_wrapper::CollaboratorError;

/// Number of redundant attempts launched per research request.
pub const RESEARCH_ATTEMPTS: usize = 3;

/// The product of one completed research task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResearchFinding {
    /// The single sharpest insight, one sentence.
    pub take: String,
    /// Why the insight matters.
    pub explanation: String,
    /// Optional supporting infographic.
    pub image_url: Option<String>,
}

/// Trait for the external research capability.
///
/// One call covers the whole pipeline (web search, synthesis, image
/// generation); the race in [`ResearchManager`] treats it as an opaque,
/// fallible unit.
#[async_trait]
pub trait ResearchClient: Send + Sync {
    /// Run a single research attempt for the query.
    async fn research_once(&self, query: &str) -> Result<ResearchFinding, CollaboratorError>;
}

/// All attempts of a research race failed.
#[derive(Debug, Clone)]
pub struct ResearchExhausted {
    /// How many attempts were launched.
    pub attempts: usize,
    /// Message of the last observed failure, if any attempt got that far.
    pub last_error: Option<String>,
}

impl fmt::Display for ResearchExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_error {
            Some(err) => write!(
                f,
                "all {} research attempts failed; last error: {}",
                self.attempts, err
            ),
            None => write!(f, "all {} research attempts failed", self.attempts),
        }
    }
}

impl Error for ResearchExhausted {}

/// Launches redundant research attempts and resolves with the first win.
#[derive(Clone)]
pub struct ResearchManager {
    client: Arc<dyn ResearchClient>,
    attempts: usize,
}

impl ResearchManager {
    /// Create a manager racing [`RESEARCH_ATTEMPTS`] attempts per query.
    pub fn new(client: Arc<dyn ResearchClient>) -> Self {
        ResearchManager {
            client,
            attempts: RESEARCH_ATTEMPTS,
        }
    }

    /// Override the number of attempts per query (builder pattern).
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Race the attempts; first success wins, losers are aborted.
    ///
    /// Every attempt runs as its own task. As soon as one resolves
    /// successfully, the remaining handles are aborted before this method
    /// returns, so a slow loser can never complete afterwards. When every
    /// attempt fails, the error is [`ResearchExhausted`] — terminal for
    /// this research task, never for the session.
    pub async fn race(&self, query: &str) -> Result<ResearchFinding, ResearchExhausted> {
        let mut in_flight = FuturesUnordered::new();
        for attempt in 0..self.attempts {
            let client = self.client.clone();
            let query = query.to_string();
            in_flight.push(tokio::spawn(async move {
                log::debug!("research attempt {} started: {}", attempt + 1, query);
                client.research_once(&query).await
            }));
        }

        let mut last_error = None;
        while let Some(joined) = in_flight.next().await {
            match joined {
                Ok(Ok(finding)) => {
                    for loser in in_flight.iter() {
                        loser.abort();
                    }
                    return Ok(finding);
                }
                Ok(Err(err)) => last_error = Some(err.to_string()),
                Err(join_err) => last_error = Some(join_err.to_string()),
            }
        }

        Err(ResearchExhausted {
            attempts: self.attempts,
            last_error,
        })
    }
}
