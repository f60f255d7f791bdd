// Integration tests for the research race and the dig-deeper flow.
use async_trait::async_trait;
use podium::client_wrapper::{
    CollaboratorError, LanguageClient, Message, SpeechSynthesizer,
};
use podium::gateway::RemoteChannel;
use podium::research::{ResearchClient, ResearchFinding, ResearchManager};
use podium::tools::{tool_call_fragment, TOOL_GIVE_TURN};
use podium::{
    DebateConfig, DebateSession, FixedRoster, Persona, TurnState, VoiceCategory,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

struct ScriptedClient {
    script: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    fn new(script: Vec<String>) -> Self {
        ScriptedClient {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LanguageClient for ScriptedClient {
    async fn generate_reply(
        &self,
        messages: &[Message],
        _tool_choice: Option<&str>,
    ) -> Result<Message, CollaboratorError> {
        self.calls.lock().await.push(messages.to_vec());
        let next = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "Nothing more to say.".to_string());
        Ok(Message::assistant(next))
    }
}

struct RecordingSpeech {
    lines: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn speak(&self, text: &str) -> Result<(), CollaboratorError> {
        self.lines.lock().await.push(text.to_string());
        Ok(())
    }
}

struct RecordingChannel {
    events: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl RemoteChannel for RecordingChannel {
    async fn publish(&self, event: &str, payload: &Value) -> Result<(), CollaboratorError> {
        self.events
            .lock()
            .await
            .push((event.to_string(), payload.clone()));
        Ok(())
    }
}

/// Three staggered attempts: one quick success, one slow success, one
/// that never resolves. Completions are counted so the test can prove the
/// losers produced no writes.
struct StaggeredResearch {
    calls: AtomicUsize,
    completions: Arc<AtomicUsize>,
}

#[async_trait]
impl ResearchClient for StaggeredResearch {
    async fn research_once(&self, _query: &str) -> Result<ResearchFinding, CollaboratorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match call {
            0 => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                self.completions.fetch_add(1, Ordering::SeqCst);
                Ok(ResearchFinding {
                    take: "homework was invented as a punishment".to_string(),
                    explanation: "a nineteenth-century disciplinary tool".to_string(),
                    image_url: Some("https://img.example/homework.png".to_string()),
                })
            }
            1 => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                self.completions.fetch_add(1, Ordering::SeqCst);
                Ok(ResearchFinding {
                    take: "slow loser".to_string(),
                    explanation: String::new(),
                    image_url: None,
                })
            }
            _ => {
                futures_util::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn roster() -> Vec<Persona> {
    vec![
        Persona {
            id: 0,
            name: "Raven".to_string(),
            prompt: "Sardonic goth coder.".to_string(),
            category: VoiceCategory::Female,
            description: String::new(),
        },
        Persona {
            id: 1,
            name: "Lumi".to_string(),
            prompt: "Chaotic optimist.".to_string(),
            category: VoiceCategory::Female,
            description: String::new(),
        },
    ]
}

fn give_turn(to: &str) -> String {
    tool_call_fragment(TOOL_GIVE_TURN, json!({ "speaker": to }))
}

#[tokio::test]
async fn test_race_takes_first_success_and_losers_never_write() {
    let completions = Arc::new(AtomicUsize::new(0));
    let client = Arc::new(StaggeredResearch {
        calls: AtomicUsize::new(0),
        completions: completions.clone(),
    });
    let manager = ResearchManager::new(client);

    let finding = manager.race("homework history").await.unwrap();
    assert_eq!(finding.take, "homework was invented as a punishment");

    // Give the aborted losers time to prove they stay silent.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dig_deeper_hands_off_and_merges_findings() {
    let completions = Arc::new(AtomicUsize::new(0));
    let research = Arc::new(StaggeredResearch {
        calls: AtomicUsize::new(0),
        completions,
    });
    let llm = Arc::new(ScriptedClient::new(vec![
        // Raven takes the floor and yields to the user.
        "Raven's opener.".to_string(),
        give_turn("user"),
        // After the hand-off, Lumi replies and yields to the user.
        "Lumi holding the fort.".to_string(),
        give_turn("user"),
        // After the user's return, Lumi sends the floor back to Raven.
        give_turn("Raven"),
        "Raven is back, armed with facts.".to_string(),
        give_turn("user"),
    ]));
    let speech = Arc::new(RecordingSpeech {
        lines: Mutex::new(Vec::new()),
    });
    let channel = Arc::new(RecordingChannel {
        events: Mutex::new(Vec::new()),
    });

    let mut session = DebateSession::new(
        DebateConfig::default(),
        llm.clone(),
        speech.clone(),
        Arc::new(FixedRoster::new(roster())),
        research,
        channel.clone(),
    );

    session.start().await.unwrap();
    session.on_user_utterance("debate homework").await.unwrap();
    assert_eq!(session.turn_state(), TurnState::AwaitingUser);

    // Raven (suspended, still holding the speaker slot) goes researching.
    session.dig_deeper("homework history", "Lumi").await.unwrap();

    // Lumi announced the hand-off line and took over.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let lines = speech.lines.lock().await.clone();
    assert!(lines
        .iter()
        .any(|l| l.contains("Lumi, take it from here")));

    // The race resolved: the table holds Raven's finding, the
    // researching set is empty again, and the UI heard about it.
    let names: Vec<String> = channel
        .events
        .lock()
        .await
        .iter()
        .map(|(n, _)| n.clone())
        .collect();
    assert!(names.contains(&"research_status".to_string()));
    assert!(names.contains(&"agent_returned".to_string()));

    // The user pulls Raven back in; her fresh instructions carry the take.
    session.on_user_utterance("welcome back Raven").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let calls = llm.calls.lock().await;
    let ravens_return = &calls[calls.len() - 2];
    assert!(ravens_return[0]
        .content
        .contains("homework was invented as a punishment"));
}

#[tokio::test]
async fn test_dig_deeper_without_known_peer_waits_on_the_user() {
    let research = Arc::new(StaggeredResearch {
        calls: AtomicUsize::new(0),
        completions: Arc::new(AtomicUsize::new(0)),
    });
    let llm = Arc::new(ScriptedClient::new(vec![
        "Raven's opener.".to_string(),
        give_turn("user"),
    ]));
    let speech = Arc::new(RecordingSpeech {
        lines: Mutex::new(Vec::new()),
    });
    let channel = Arc::new(RecordingChannel {
        events: Mutex::new(Vec::new()),
    });

    let mut session = DebateSession::new(
        DebateConfig::default(),
        llm,
        speech.clone(),
        Arc::new(FixedRoster::new(roster())),
        research,
        channel,
    );

    session.start().await.unwrap();
    session.on_user_utterance("debate homework").await.unwrap();
    session.dig_deeper("anything", "Nobody").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(session.turn_state(), TurnState::AwaitingUser);
    let lines = speech.lines.lock().await.clone();
    assert!(lines
        .iter()
        .any(|l| l.contains("What do you think in the meantime?")));
}
