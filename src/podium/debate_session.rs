//! The debate conductor.
//!
//! [`DebateSession`] owns the transcript, the turn-taking state machine,
//! the persona roster, the shared artifacts, and the outbound gateway,
//! and wires them to the external collaborators. There is a single
//! logical thread of control per session: at most one persona is ever
//! active, so transcript appends and hot-take mutations are naturally
//! serialized. Concurrency only exists in the research race and the
//! fire-and-forget publishes, both of which run on their own tasks.
//!
//! # Flow
//!
//! ```text
//! user utterance ──▶ transcript append ──▶ forced next-speaker decision
//!        ▲                                          │
//!        │                                          ▼
//!   "What do you    ◀── AwaitingUser ◀── handoff ── SpeakerActive(p)
//!    think?"                                        │  fresh Speaker,
//!                                                   │  reply + tools,
//!                                                   ▼  next decision
//!                                            SpeakerActive(q) ...
//! ```

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::podium::client_wrapper::{
    CollaboratorError, LanguageClient, Message, Role, SpeechSynthesizer, UtteranceSource,
};
use crate::podium::config::DebateConfig;
use crate::podium::gateway::{
    validate_avatar_call, AvatarCall, EventGateway, RemoteChannel, ResearchPhase, UiEvent,
};
use crate::podium::persona::{assign_voices, Persona, PersonaSource};
use crate::podium::research::{ResearchClient, ResearchManager};
use crate::podium::session_state::{shared_state, SharedState};
use crate::podium::speaker::Speaker;
use crate::podium::tools::{
    parse_tool_invocation, strip_tool_fragment, ToolInvocation, ToolResult, TOOL_ADD_HOT_TAKE,
    TOOL_AVATAR, TOOL_DELETE_HOT_TAKE, TOOL_EMOJI_REACTION, TOOL_GIVE_TURN, TOOL_REPLACE_HOT_TAKE,
};
use crate::podium::transcript::{Transcript, USER_SPEAKER};
use crate::podium::turn::{resolve_speaker, SpeakerResolution, TurnState};

/// Scripted line spoken when a persona yields the floor to the human.
const USER_PROMPT_LINE: &str = "What do you think?";

/// Nudge for the reply a speaker owes the room on taking the floor.
const REPLY_NUDGE: &str = "Respond directly to the most recent message in 15 words or fewer.";

/// Nudge attached to every forced next-speaker decision.
const DECISION_NUDGE: &str = "Now decide who should speak next.";

/// Fallback topic recorded when the first utterance is empty.
const EMPTY_TOPIC: &str = "User provided no topic";

/// Outcome of dispatching one parsed tool invocation.
struct ToolApplication {
    result: ToolResult,
    handoff: Option<SpeakerResolution>,
}

/// Orchestrates one multi-persona debate.
pub struct DebateSession {
    id: Uuid,
    config: DebateConfig,
    llm: Arc<dyn LanguageClient>,
    tts: Arc<dyn SpeechSynthesizer>,
    personas: Arc<dyn PersonaSource>,
    research: ResearchManager,
    gateway: EventGateway,
    topic: Option<String>,
    roster: Vec<Persona>,
    transcript: Transcript,
    state: TurnState,
    speaker: Option<Speaker>,
    shared: SharedState,
    first_entry_done: bool,
}

impl DebateSession {
    /// Assemble a session from its collaborators.
    pub fn new(
        config: DebateConfig,
        llm: Arc<dyn LanguageClient>,
        tts: Arc<dyn SpeechSynthesizer>,
        personas: Arc<dyn PersonaSource>,
        research_client: Arc<dyn ResearchClient>,
        channel: Arc<dyn RemoteChannel>,
    ) -> Self {
        let id = Uuid::new_v4();
        let research = ResearchManager::new(research_client).with_attempts(config.research_attempts);
        let gateway = EventGateway::new(channel, id).with_attempts(config.publish_attempts);
        DebateSession {
            id,
            config,
            llm,
            tts,
            personas,
            research,
            gateway,
            topic: None,
            roster: Vec::new(),
            transcript: Transcript::new(),
            state: TurnState::Bootstrap,
            speaker: None,
            shared: shared_state(),
            first_entry_done: false,
        }
    }

    /// Session identifier stamped on logs and events.
    pub fn session_id(&self) -> Uuid {
        self.id
    }

    /// Current turn state.
    pub fn turn_state(&self) -> TurnState {
        self.state
    }

    /// The debate topic, once known.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// The persona roster, once produced.
    pub fn roster(&self) -> &[Persona] {
        &self.roster
    }

    /// The shared transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Snapshot of the current hot takes.
    pub async fn hot_takes(&self) -> Vec<String> {
        self.shared.read().await.hot_takes.snapshot()
    }

    /// The per-session voice assignment, fixed at roster time.
    pub async fn voice_assignments(&self) -> std::collections::HashMap<u32, String> {
        self.shared.read().await.voices.clone()
    }

    /// Corrective path: replace the content of an interrupted or empty
    /// transcript entry, keyed by its sequence number.
    pub fn amend_utterance(&mut self, sequence: u64, content: &str) -> bool {
        let amended = self.transcript.amend(sequence, content);
        if !amended {
            log::warn!("[{}] amend ignored; no entry with sequence {}", self.id, sequence);
        }
        amended
    }

    /// Start the session.
    ///
    /// With a configured topic the debate begins immediately; otherwise
    /// the session stays in [`TurnState::Bootstrap`] collecting silence
    /// until the first final user utterance supplies the topic.
    pub async fn start(&mut self) -> Result<(), CollaboratorError> {
        match self.config.topic.clone() {
            Some(topic) => {
                log::info!("[{}] starting with configured topic: {}", self.id, topic);
                self.begin_debate(topic, None).await
            }
            None => {
                log::info!(
                    "[{}] no topic supplied; waiting for the first user utterance",
                    self.id
                );
                Ok(())
            }
        }
    }

    /// Feed one finalized user utterance into the session.
    pub async fn on_user_utterance(&mut self, text: &str) -> Result<(), CollaboratorError> {
        let text = text.trim().to_string();
        match self.state {
            TurnState::Bootstrap => {
                let topic = if text.is_empty() {
                    EMPTY_TOPIC.to_string()
                } else {
                    text
                };
                log::info!("[{}] derived topic from speech: {}", self.id, topic);
                self.begin_debate(topic.clone(), Some(topic)).await
            }
            TurnState::SpeakerActive(_) | TurnState::AwaitingUser => {
                self.transcript.append(Role::User, USER_SPEAKER, text);
                self.after_user_turn().await
            }
        }
    }

    /// Pull utterances from a source until it ends.
    pub async fn drive(
        &mut self,
        source: &mut dyn UtteranceSource,
    ) -> Result<(), CollaboratorError> {
        self.start().await?;
        while let Some(text) = source.next_final_utterance().await {
            self.on_user_utterance(&text).await?;
        }
        Ok(())
    }

    /// Send a persona out to research; the debate continues without it.
    ///
    /// The active persona leaves the room (excluded from every peer's
    /// participant list), the floor moves to `hand_off_to`, and the
    /// research race runs in the background. When it resolves, the
    /// finding is stored for the researcher's next time on the floor.
    pub async fn dig_deeper(
        &mut self,
        query: &str,
        hand_off_to: &str,
    ) -> Result<(), CollaboratorError> {
        let (persona_id, persona_name) = match &self.speaker {
            Some(speaker) => (speaker.persona_id, speaker.persona_name.clone()),
            None => {
                log::warn!("[{}] dig_deeper ignored; no active speaker", self.id);
                return Ok(());
            }
        };

        log::info!(
            "[{}] starting research: {} (handing off to {})",
            persona_name,
            query,
            hand_off_to
        );
        self.shared.write().await.researching.insert(persona_id);
        self.gateway.publish(UiEvent::ResearchStatus {
            agent_id: persona_id,
            agent_name: persona_name.clone(),
            phase: ResearchPhase::Searching,
        });
        self.spawn_research(persona_id, persona_name, query.to_string());

        match resolve_speaker(&self.roster, hand_off_to) {
            SpeakerResolution::Persona(next) => {
                let next_name = self
                    .roster
                    .iter()
                    .find(|p| p.id == next)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| hand_off_to.to_string());
                self.say_in_background(format!(
                    "Let me dig deeper on this. {}, take it from here - I'll be back with what I find.",
                    next_name
                ));
                self.enter_speaker(next).await?;
                self.run_turn_cycle().await
            }
            SpeakerResolution::User | SpeakerResolution::Unrecognized => {
                self.say_in_background(
                    "Let me research this. What do you think in the meantime?".to_string(),
                );
                self.state = TurnState::AwaitingUser;
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    async fn begin_debate(
        &mut self,
        topic: String,
        opening_user_text: Option<String>,
    ) -> Result<(), CollaboratorError> {
        let roster = self
            .personas
            .roster(&topic, &self.config.categories)
            .await?;
        if roster.is_empty() {
            log::warn!("[{}] empty roster; staying in bootstrap", self.id);
            return Ok(());
        }
        for p in &roster {
            log::info!(
                "  [{}] {} ({}): {}",
                p.id,
                p.name,
                p.category.as_str(),
                p.description
            );
        }

        self.shared.write().await.voices = assign_voices(&roster);
        self.topic = Some(topic);
        self.roster = roster;
        if let Some(text) = opening_user_text {
            self.transcript.append(Role::User, USER_SPEAKER, text);
        }

        let first_id = self.roster[0].id;
        self.enter_speaker(first_id).await?;
        self.run_turn_cycle().await
    }

    /// Swap the floor to `persona_id`: discard the previous ephemeral
    /// speaker and assemble a fresh one from current shared state.
    async fn enter_speaker(&mut self, persona_id: u32) -> Result<(), CollaboratorError> {
        let persona = match self.roster.iter().find(|p| p.id == persona_id) {
            Some(p) => p.clone(),
            None => {
                log::error!("[{}] unknown persona id {} on entry", self.id, persona_id);
                return Ok(());
            }
        };
        let topic = self.topic.clone().unwrap_or_default();

        let speaker = {
            let shared = self.shared.clone();
            let guard = shared.read().await;
            Speaker::assemble(&topic, &persona, &self.roster, &guard, &self.transcript)
        };
        self.speaker = Some(speaker);
        self.state = TurnState::SpeakerActive(persona_id);
        log::info!("[{}] {} takes the floor", self.id, persona.name);

        self.gateway.publish(UiEvent::SpeakerChanged { id: persona_id });
        if !self.first_entry_done {
            self.first_entry_done = true;
            self.gateway.publish(UiEvent::PersonasCreated {
                personas: self.roster.clone(),
            });
        }
        Ok(())
    }

    /// Reply-then-decide loop that keeps the debate moving until a
    /// persona yields to the user or a decision falls through.
    async fn run_turn_cycle(&mut self) -> Result<(), CollaboratorError> {
        loop {
            if !self.transcript.has_user_message() {
                log::info!("[{}] waiting for initial user input before responding", self.id);
                return Ok(());
            }

            let handoff = self.generate_speaker_reply().await?;
            let decision = match handoff {
                Some(resolution) => resolution,
                None => self.request_turn_decision().await?,
            };

            match decision {
                SpeakerResolution::Persona(next) => {
                    self.enter_speaker(next).await?;
                }
                SpeakerResolution::User => {
                    self.yield_to_user();
                    return Ok(());
                }
                SpeakerResolution::Unrecognized => {
                    // Fallback: the current persona keeps the floor and the
                    // session goes quiet until the next user utterance.
                    return Ok(());
                }
            }
        }
    }

    /// Forced decision after a completed user turn. Which persona is
    /// active does not change until the decision resolves.
    async fn after_user_turn(&mut self) -> Result<(), CollaboratorError> {
        match self.request_turn_decision().await? {
            SpeakerResolution::Persona(next) => {
                self.enter_speaker(next).await?;
                self.run_turn_cycle().await
            }
            SpeakerResolution::User => {
                self.yield_to_user();
                Ok(())
            }
            SpeakerResolution::Unrecognized => {
                // Leave the turn defined: the decider keeps (or regains)
                // the floor without being forced into a fresh decision.
                if let Some(speaker) = &self.speaker {
                    self.state = TurnState::SpeakerActive(speaker.persona_id);
                }
                Ok(())
            }
        }
    }

    /// Generate the active persona's reply, executing tool effects as
    /// they appear. Returns a handoff resolution when the persona passed
    /// the turn mid-reply.
    async fn generate_speaker_reply(
        &mut self,
    ) -> Result<Option<SpeakerResolution>, CollaboratorError> {
        let llm = self.llm.clone();
        let (persona_id, persona_name) = match &self.speaker {
            Some(speaker) => (speaker.persona_id, speaker.persona_name.clone()),
            None => return Ok(None),
        };

        if let Some(speaker) = self.speaker.as_mut() {
            speaker.push(Message::user(REPLY_NUDGE));
        }

        let max_iterations = self.config.max_tool_iterations;
        let mut iterations = 0usize;
        loop {
            let context = match &self.speaker {
                Some(speaker) => speaker.context().to_vec(),
                None => return Ok(None),
            };
            let reply = llm.generate_reply(&context, None).await?;
            if let Some(speaker) = self.speaker.as_mut() {
                speaker.push(reply.clone());
            }

            let invocation = parse_tool_invocation(&reply.content);
            let prose = strip_tool_fragment(&reply.content);
            if !prose.is_empty() {
                self.transcript
                    .append(Role::Assistant, persona_name.clone(), prose);
            }

            let invocation = match invocation {
                Some(invocation) => invocation,
                None => return Ok(None),
            };

            if iterations >= max_iterations {
                log::warn!(
                    "[{}] {} hit the tool iteration cap; ending the turn",
                    self.id,
                    persona_name
                );
                return Ok(None);
            }
            iterations += 1;

            let application = self.apply_tool(persona_id, &persona_name, &invocation).await;
            if let Some(resolution) = application.handoff {
                return Ok(Some(resolution));
            }

            let feedback = if application.result.success {
                format!(
                    "Tool '{}' executed successfully. Result: {}",
                    invocation.name, application.result.output
                )
            } else {
                format!(
                    "Tool '{}' failed. Error: {}",
                    invocation.name,
                    application
                        .result
                        .error
                        .as_deref()
                        .unwrap_or("Unknown error")
                )
            };
            if let Some(speaker) = self.speaker.as_mut() {
                speaker.push(Message::user(feedback));
            }
        }
    }

    /// Ask the active persona for a next-speaker decision via a forced
    /// tool call.
    async fn request_turn_decision(&mut self) -> Result<SpeakerResolution, CollaboratorError> {
        let llm = self.llm.clone();
        let persona_name = match &self.speaker {
            Some(speaker) => speaker.persona_name.clone(),
            None => return Ok(SpeakerResolution::Unrecognized),
        };

        if let Some(speaker) = self.speaker.as_mut() {
            speaker.push(Message::user(DECISION_NUDGE));
        }
        let context = match &self.speaker {
            Some(speaker) => speaker.context().to_vec(),
            None => return Ok(SpeakerResolution::Unrecognized),
        };
        let reply = llm.generate_reply(&context, Some(TOOL_GIVE_TURN)).await?;
        if let Some(speaker) = self.speaker.as_mut() {
            speaker.push(reply.clone());
        }

        match parse_tool_invocation(&reply.content) {
            Some(invocation) if invocation.name == TOOL_GIVE_TURN => {
                let named = invocation.str_arg("speaker").to_string();
                let resolution = resolve_speaker(&self.roster, &named);
                if resolution == SpeakerResolution::Unrecognized {
                    log::warn!(
                        "[{}] {} named unknown speaker '{}'; keeping the current speaker",
                        self.id,
                        persona_name,
                        named
                    );
                }
                Ok(resolution)
            }
            Some(invocation) => {
                log::warn!(
                    "[{}] expected {} but got '{}'; keeping the current speaker",
                    self.id,
                    TOOL_GIVE_TURN,
                    invocation.name
                );
                Ok(SpeakerResolution::Unrecognized)
            }
            None => {
                log::warn!(
                    "[{}] forced decision from {} produced no tool call",
                    self.id,
                    persona_name
                );
                Ok(SpeakerResolution::Unrecognized)
            }
        }
    }

    /// Dispatch one parsed tool invocation against the session.
    async fn apply_tool(
        &mut self,
        persona_id: u32,
        persona_name: &str,
        invocation: &ToolInvocation,
    ) -> ToolApplication {
        match invocation.name.as_str() {
            TOOL_GIVE_TURN => {
                let named = invocation.str_arg("speaker").to_string();
                let resolution = resolve_speaker(&self.roster, &named);
                if resolution == SpeakerResolution::Unrecognized {
                    log::warn!(
                        "[{}] {} named unknown speaker '{}'; keeping the current speaker",
                        self.id,
                        persona_name,
                        named
                    );
                    // The no-op fallback is not an error the model sees.
                    return ToolApplication {
                        result: ToolResult::success(json!("Staying with the current speaker")),
                        handoff: None,
                    };
                }
                ToolApplication {
                    result: ToolResult::success(json!("Turn handed over")),
                    handoff: Some(resolution),
                }
            }
            TOOL_ADD_HOT_TAKE => {
                let text = invocation.str_arg("text").to_string();
                let outcome = self.shared.write().await.hot_takes.add(&text);
                match outcome {
                    Ok(()) => {
                        log::info!("[{}] ADD hot take: {}", persona_name, text);
                        self.after_hot_take_change().await;
                        ToolApplication {
                            result: ToolResult::success(json!("Added")),
                            handoff: None,
                        }
                    }
                    Err(err) => ToolApplication {
                        result: ToolResult::failure(err.to_string()),
                        handoff: None,
                    },
                }
            }
            TOOL_REPLACE_HOT_TAKE => {
                let old_text = invocation.str_arg("oldText").to_string();
                let new_text = invocation.str_arg("newText").to_string();
                let outcome = self
                    .shared
                    .write()
                    .await
                    .hot_takes
                    .replace(&old_text, &new_text);
                match outcome {
                    Ok(()) => {
                        log::info!(
                            "[{}] REPLACE hot take: '{}' -> '{}'",
                            persona_name,
                            old_text,
                            new_text
                        );
                        self.after_hot_take_change().await;
                        ToolApplication {
                            result: ToolResult::success(json!("Replaced")),
                            handoff: None,
                        }
                    }
                    Err(err) => ToolApplication {
                        result: ToolResult::failure(err.to_string()),
                        handoff: None,
                    },
                }
            }
            TOOL_DELETE_HOT_TAKE => {
                let text = invocation.str_arg("text").to_string();
                let outcome = self.shared.write().await.hot_takes.delete(&text);
                match outcome {
                    Ok(()) => {
                        log::info!("[{}] DELETE hot take: {}", persona_name, text);
                        self.after_hot_take_change().await;
                        ToolApplication {
                            result: ToolResult::success(json!("Deleted")),
                            handoff: None,
                        }
                    }
                    Err(err) => ToolApplication {
                        result: ToolResult::failure(err.to_string()),
                        handoff: None,
                    },
                }
            }
            TOOL_EMOJI_REACTION => {
                let emoji = invocation.str_arg("emoji").to_string();
                self.gateway.publish(UiEvent::EmojiReaction {
                    emoji,
                    speaker_id: persona_id,
                });
                ToolApplication {
                    result: ToolResult::success(json!("Reacted")),
                    handoff: None,
                }
            }
            TOOL_AVATAR => {
                let raw = invocation
                    .arguments
                    .get("call")
                    .cloned()
                    .unwrap_or_else(|| invocation.arguments.clone());
                let call: AvatarCall = match serde_json::from_value(raw) {
                    Ok(call) => call,
                    Err(err) => {
                        log::warn!("[{}] malformed avatar call dropped: {}", self.id, err);
                        return ToolApplication {
                            result: ToolResult::success(
                                json!({"status": "skipped", "reason": "malformed-call"}),
                            ),
                            handoff: None,
                        };
                    }
                };
                match validate_avatar_call(&call) {
                    Ok(normalized) => {
                        self.gateway
                            .publish(UiEvent::AvatarDirective { call: normalized });
                        ToolApplication {
                            result: ToolResult::success(json!({"status": "sent"})),
                            handoff: None,
                        }
                    }
                    Err(rejection) => {
                        // Deliberate safety filter: dropped, logged, never published.
                        log::warn!("[{}] avatar call dropped: {}", self.id, rejection);
                        ToolApplication {
                            result: ToolResult::success(
                                json!({"status": "skipped", "reason": rejection.to_string()}),
                            ),
                            handoff: None,
                        }
                    }
                }
            }
            other => ToolApplication {
                result: ToolResult::failure(format!("Tool not found: {}", other)),
                handoff: None,
            },
        }
    }

    /// Shared side effects of every successful hot-take mutation: rebuild
    /// the active persona's instructions and queue the UI notification.
    async fn after_hot_take_change(&mut self) {
        let takes = {
            let shared = self.shared.clone();
            let guard = shared.read().await;
            guard.hot_takes.snapshot()
        };
        self.refresh_active_speaker().await;
        self.gateway.publish(UiEvent::HotTakesUpdated { takes });
    }

    /// Recompute the active speaker's system instructions from the
    /// current shared state.
    async fn refresh_active_speaker(&mut self) {
        let persona = match &self.speaker {
            Some(speaker) => self
                .roster
                .iter()
                .find(|p| p.id == speaker.persona_id)
                .cloned(),
            None => None,
        };
        let persona = match persona {
            Some(p) => p,
            None => return,
        };
        let topic = self.topic.clone().unwrap_or_default();
        let shared = self.shared.clone();
        let guard = shared.read().await;
        if let Some(speaker) = self.speaker.as_mut() {
            speaker.refresh_instructions(&topic, &persona, &self.roster, &guard);
        }
    }

    /// Enter [`TurnState::AwaitingUser`] and schedule exactly one
    /// prompting utterance for after the current audio finishes.
    fn yield_to_user(&mut self) {
        self.state = TurnState::AwaitingUser;
        log::info!("[{}] floor yielded to the user", self.id);
        let tts = self.tts.clone();
        let session_id = self.id;
        tokio::spawn(async move {
            tts.wait_for_playout().await;
            if let Err(err) = tts.speak(USER_PROMPT_LINE).await {
                log::warn!("[{}] prompting utterance failed: {}", session_id, err);
            }
        });
    }

    /// Fire-and-forget a scripted line.
    fn say_in_background(&self, line: String) {
        let tts = self.tts.clone();
        let session_id = self.id;
        tokio::spawn(async move {
            if let Err(err) = tts.speak(&line).await {
                log::warn!("[{}] scripted line failed: {}", session_id, err);
            }
        });
    }

    /// Run the research race on its own task and merge the outcome back
    /// into shared state when it resolves.
    fn spawn_research(&self, persona_id: u32, persona_name: String, query: String) {
        let manager = self.research.clone();
        let shared = self.shared.clone();
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            match manager.race(&query).await {
                Ok(finding) => {
                    {
                        let mut guard = shared.write().await;
                        guard.research_results.insert(persona_id, finding.clone());
                        guard.researching.remove(&persona_id);
                    }
                    log::info!("[{}] research complete: {}", persona_name, finding.take);
                    gateway
                        .publish_now(&UiEvent::ResearchStatus {
                            agent_id: persona_id,
                            agent_name: persona_name.clone(),
                            phase: ResearchPhase::Done,
                        })
                        .await;
                    gateway
                        .publish_now(&UiEvent::AgentReturned {
                            agent_id: persona_id,
                            agent_name: persona_name,
                            has_findings: true,
                        })
                        .await;
                }
                Err(exhausted) => {
                    shared.write().await.researching.remove(&persona_id);
                    log::warn!("[{}] {}", persona_name, exhausted);
                    gateway
                        .publish_now(&UiEvent::ResearchStatus {
                            agent_id: persona_id,
                            agent_name: persona_name,
                            phase: ResearchPhase::Error,
                        })
                        .await;
                }
            }
        });
    }
}
