//! Outbound event gateway to the remote UI.
//!
//! Publishes a small catalogue of named events over a best-effort duplex
//! channel. Publishes never block the debate flow: callers fire and
//! forget, each delivery is retried up to [`PUBLISH_ATTEMPTS`] times, and
//! a missing remote endpoint resolves instantly as a no-op because the UI
//! may attach after the debate has started.
//!
//! Avatar animation is the one place with real input validation: the
//! gateway sits between an untrusted LLM tool call and the UI, so
//! anything outside the fixed allow-lists is dropped with a reported
//! reason instead of being forwarded.

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::podium::client_wrapper::CollaboratorError;
use crate::podium::persona::Persona;

/// Delivery attempts per publish before giving up.
pub const PUBLISH_ATTEMPTS: usize = 3;

/// Trait for the duplex channel to the remote UI.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Whether a remote endpoint is currently attached.
    ///
    /// Defaults to `true`; implementations backed by a room should report
    /// actual peer presence so detached publishes can short-circuit.
    fn is_attached(&self) -> bool {
        true
    }

    /// Deliver one named event to the remote endpoint.
    async fn publish(&self, event: &str, payload: &Value) -> Result<(), CollaboratorError>;
}

/// Phase of an in-flight research task, surfaced to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResearchPhase {
    Searching,
    Done,
    Error,
}

impl ResearchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchPhase::Searching => "searching",
            ResearchPhase::Done => "done",
            ResearchPhase::Error => "error",
        }
    }
}

/// UI-facing events produced by the debate core.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    /// The floor changed hands.
    SpeakerChanged { id: u32 },
    /// The roster was produced; sent once, on the first floor entry.
    PersonasCreated { personas: Vec<Persona> },
    /// The hot-takes list changed.
    HotTakesUpdated { takes: Vec<String> },
    /// A persona reacted with an emoji.
    EmojiReaction { emoji: String, speaker_id: u32 },
    /// A research task changed phase.
    ResearchStatus {
        agent_id: u32,
        agent_name: String,
        phase: ResearchPhase,
    },
    /// A researching persona is back in the room.
    AgentReturned {
        agent_id: u32,
        agent_name: String,
        has_findings: bool,
    },
    /// A validated avatar animation directive.
    AvatarDirective { call: AvatarCall },
}

impl UiEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::SpeakerChanged { .. } => "speaker_changed",
            UiEvent::PersonasCreated { .. } => "personas_created",
            UiEvent::HotTakesUpdated { .. } => "hot_takes_updated",
            UiEvent::EmojiReaction { .. } => "emoji_reaction",
            UiEvent::ResearchStatus { .. } => "research_status",
            UiEvent::AgentReturned { .. } => "agent_returned",
            UiEvent::AvatarDirective { .. } => "avatar_tool",
        }
    }

    /// Serialized payload of the event.
    pub fn payload(&self) -> Value {
        match self {
            UiEvent::SpeakerChanged { id } => json!({ "id": id }),
            UiEvent::PersonasCreated { personas } => Value::Array(
                personas
                    .iter()
                    .map(|p| {
                        json!({
                            "id": p.id,
                            "name": p.name,
                            "category": p.category.as_str(),
                            "description": p.description,
                        })
                    })
                    .collect(),
            ),
            UiEvent::HotTakesUpdated { takes } => json!({ "takes": takes }),
            UiEvent::EmojiReaction { emoji, speaker_id } => {
                json!({ "emoji": emoji, "speaker_id": speaker_id })
            }
            UiEvent::ResearchStatus {
                agent_id,
                agent_name,
                phase,
            } => json!({
                "agent_id": agent_id,
                "agent_name": agent_name,
                "type": phase.as_str(),
            }),
            UiEvent::AgentReturned {
                agent_id,
                agent_name,
                has_findings,
            } => json!({
                "agent_id": agent_id,
                "agent_name": agent_name,
                "has_findings": has_findings,
            }),
            UiEvent::AvatarDirective { call } => {
                json!({ "kind": "avatar-tool", "call": call })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Avatar validation
// ---------------------------------------------------------------------------

/// Optional targeting information on an avatar call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AvatarContext {
    #[serde(rename = "avatarId", skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    /// Alias slot: some models tuck the preset into the context.
    #[serde(default, skip_serializing)]
    pub preset: Option<String>,
    /// Alias slot: or call it "expression".
    #[serde(default, skip_serializing)]
    pub expression: Option<String>,
}

/// An avatar animation call as supplied by the model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AvatarCall {
    #[serde(rename = "type")]
    pub call_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Alias slot accepted on input, normalized away on output.
    #[serde(default, skip_serializing)]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<AvatarContext>,
}

/// Why an avatar call was dropped instead of published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AvatarRejection {
    UnsupportedType(String),
    MissingPreset,
    UnsupportedPreset(String),
    UnsupportedAvatar(String),
}

impl fmt::Display for AvatarRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvatarRejection::UnsupportedType(t) => write!(f, "unsupported-type:{}", t),
            AvatarRejection::MissingPreset => write!(f, "missing-preset"),
            AvatarRejection::UnsupportedPreset(p) => write!(f, "unsupported-preset:{}", p),
            AvatarRejection::UnsupportedAvatar(a) => write!(f, "unsupported-avatar:{}", a),
        }
    }
}

impl Error for AvatarRejection {}

lazy_static! {
    static ref EXPRESSION_SYNONYMS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("happy", "smile");
        m.insert("serious", "concerned");
        m.insert("sad", "concerned");
        m.insert("frown", "concerned");
        m.insert("blink", "wink");
        m.insert("winking", "wink");
        m
    };
    static ref SUPPORTED_EXPRESSIONS: HashSet<&'static str> = {
        ["smile", "surprised", "concerned", "wink", "laugh"]
            .iter()
            .copied()
            .collect()
    };
    static ref SUPPORTED_AVATAR_IDS: HashSet<&'static str> =
        ["assistant", "local"].iter().copied().collect();
}

/// Validate and normalize an avatar call.
///
/// Only `setExpression` passes. The preset is lowercased, mapped through
/// the synonym table, and checked against the fixed allow-list; an
/// optional `avatarId` is checked against its own allow-list. Anything
/// else is rejected with a reason suitable for logging.
pub fn validate_avatar_call(call: &AvatarCall) -> Result<AvatarCall, AvatarRejection> {
    if call.call_type != "setExpression" {
        return Err(AvatarRejection::UnsupportedType(call.call_type.clone()));
    }

    let raw_preset = call
        .preset
        .as_deref()
        .or(call.expression.as_deref())
        .or_else(|| call.context.as_ref().and_then(|c| c.preset.as_deref()))
        .or_else(|| call.context.as_ref().and_then(|c| c.expression.as_deref()))
        .ok_or(AvatarRejection::MissingPreset)?;

    let lowered = raw_preset.to_lowercase();
    let preset = EXPRESSION_SYNONYMS
        .get(lowered.as_str())
        .copied()
        .unwrap_or(lowered.as_str());
    if !SUPPORTED_EXPRESSIONS.contains(preset) {
        return Err(AvatarRejection::UnsupportedPreset(preset.to_string()));
    }

    let avatar_id = match call.context.as_ref().and_then(|c| c.avatar_id.as_deref()) {
        Some(id) => {
            if !SUPPORTED_AVATAR_IDS.contains(id) {
                return Err(AvatarRejection::UnsupportedAvatar(id.to_string()));
            }
            Some(id.to_string())
        }
        None => None,
    };

    Ok(AvatarCall {
        call_type: "setExpression".to_string(),
        preset: Some(preset.to_string()),
        expression: None,
        context: avatar_id.map(|id| AvatarContext {
            avatar_id: Some(id),
            preset: None,
            expression: None,
        }),
    })
}

// ---------------------------------------------------------------------------
// Retry helper + gateway
// ---------------------------------------------------------------------------

/// Run `op` up to `attempts` times, returning the first success.
///
/// Intermediate failures are logged at debug level; the final failure is
/// handed back to the caller, which treats delivery as best-effort.
pub async fn with_retries<T, E, F, Fut>(attempts: usize, mut op: F) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    for attempt in 1..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                log::debug!("attempt {}/{} failed: {}", attempt, attempts, err);
            }
        }
    }
    op().await
}

/// Fire-and-forget publisher of [`UiEvent`]s.
#[derive(Clone)]
pub struct EventGateway {
    channel: Arc<dyn RemoteChannel>,
    session_id: Uuid,
    attempts: usize,
}

impl EventGateway {
    /// Create a gateway over the given channel.
    pub fn new(channel: Arc<dyn RemoteChannel>, session_id: Uuid) -> Self {
        EventGateway {
            channel,
            session_id,
            attempts: PUBLISH_ATTEMPTS,
        }
    }

    /// Override the per-publish attempt budget (builder pattern).
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Queue an event for delivery without blocking the debate flow.
    pub fn publish(&self, event: UiEvent) {
        let gateway = self.clone();
        tokio::spawn(async move {
            gateway.publish_now(&event).await;
        });
    }

    /// Deliver an event inline, retrying transient failures.
    ///
    /// Returns `true` when the event was delivered or intentionally
    /// skipped (no endpoint attached); `false` when every attempt failed.
    pub async fn publish_now(&self, event: &UiEvent) -> bool {
        if !self.channel.is_attached() {
            log::debug!(
                "[{}] no remote endpoint attached; dropping '{}'",
                self.session_id,
                event.name()
            );
            return true;
        }

        let name = event.name();
        let payload = event.payload();
        let channel = self.channel.clone();
        let delivery = with_retries(self.attempts, || {
            let channel = channel.clone();
            let payload = payload.clone();
            async move { channel.publish(name, &payload).await }
        })
        .await;

        match delivery {
            Ok(()) => true,
            Err(err) => {
                log::warn!(
                    "[{}] giving up on '{}' after {} attempts: {}",
                    self.session_id,
                    name,
                    self.attempts,
                    err
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct RecordingChannel {
        attached: bool,
        fail_first: usize,
        calls: AtomicUsize,
        delivered: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingChannel {
        fn new(attached: bool, fail_first: usize) -> Self {
            RecordingChannel {
                attached,
                fail_first,
                calls: AtomicUsize::new(0),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RemoteChannel for RecordingChannel {
        fn is_attached(&self) -> bool {
            self.attached
        }

        async fn publish(&self, event: &str, payload: &Value) -> Result<(), CollaboratorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err("transient channel failure".into());
            }
            self.delivered
                .lock()
                .await
                .push((event.to_string(), payload.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_detached_channel_is_a_silent_noop() {
        let channel = Arc::new(RecordingChannel::new(false, 0));
        let gateway = EventGateway::new(channel.clone(), Uuid::new_v4());
        let ok = gateway
            .publish_now(&UiEvent::SpeakerChanged { id: 1 })
            .await;
        assert!(ok);
        assert_eq!(channel.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let channel = Arc::new(RecordingChannel::new(true, 2));
        let gateway = EventGateway::new(channel.clone(), Uuid::new_v4());
        let ok = gateway
            .publish_now(&UiEvent::HotTakesUpdated {
                takes: vec!["hot".to_string()],
            })
            .await;
        assert!(ok);
        assert_eq!(channel.calls.load(Ordering::SeqCst), 3);
        let delivered = channel.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "hot_takes_updated");
    }

    #[tokio::test]
    async fn test_gives_up_after_the_attempt_budget() {
        let channel = Arc::new(RecordingChannel::new(true, 99));
        let gateway = EventGateway::new(channel.clone(), Uuid::new_v4());
        let ok = gateway
            .publish_now(&UiEvent::SpeakerChanged { id: 0 })
            .await;
        assert!(!ok);
        assert_eq!(channel.calls.load(Ordering::SeqCst), PUBLISH_ATTEMPTS);
    }

    #[test]
    fn test_avatar_happy_synonym_normalizes_to_smile() {
        let call = AvatarCall {
            call_type: "setExpression".to_string(),
            preset: Some("Happy".to_string()),
            expression: None,
            context: Some(AvatarContext {
                avatar_id: Some("assistant".to_string()),
                ..Default::default()
            }),
        };
        let normalized = validate_avatar_call(&call).unwrap();
        assert_eq!(normalized.preset.as_deref(), Some("smile"));
        assert_eq!(
            normalized
                .context
                .as_ref()
                .and_then(|c| c.avatar_id.as_deref()),
            Some("assistant")
        );
    }

    #[test]
    fn test_avatar_set_pose_is_dropped() {
        let call = AvatarCall {
            call_type: "setPose".to_string(),
            ..Default::default()
        };
        let err = validate_avatar_call(&call).unwrap_err();
        assert_eq!(err.to_string(), "unsupported-type:setPose");
    }

    #[test]
    fn test_avatar_unknown_preset_is_dropped() {
        let call = AvatarCall {
            call_type: "setExpression".to_string(),
            preset: Some("angry".to_string()),
            ..Default::default()
        };
        let err = validate_avatar_call(&call).unwrap_err();
        assert_eq!(err.to_string(), "unsupported-preset:angry");
    }

    #[test]
    fn test_avatar_missing_preset_is_dropped() {
        let call = AvatarCall {
            call_type: "setExpression".to_string(),
            ..Default::default()
        };
        assert_eq!(
            validate_avatar_call(&call).unwrap_err(),
            AvatarRejection::MissingPreset
        );
    }

    #[test]
    fn test_avatar_unknown_target_is_dropped() {
        let call = AvatarCall {
            call_type: "setExpression".to_string(),
            preset: Some("wink".to_string()),
            expression: None,
            context: Some(AvatarContext {
                avatar_id: Some("narrator".to_string()),
                ..Default::default()
            }),
        };
        let err = validate_avatar_call(&call).unwrap_err();
        assert_eq!(err.to_string(), "unsupported-avatar:narrator");
    }

    #[test]
    fn test_avatar_preset_alias_in_context_is_accepted() {
        let call = AvatarCall {
            call_type: "setExpression".to_string(),
            preset: None,
            expression: None,
            context: Some(AvatarContext {
                avatar_id: None,
                preset: None,
                expression: Some("blink".to_string()),
            }),
        };
        let normalized = validate_avatar_call(&call).unwrap();
        assert_eq!(normalized.preset.as_deref(), Some("wink"));
        assert!(normalized.context.is_none());
    }
}
