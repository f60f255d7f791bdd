//! Scripted two-persona debate against a live xAI endpoint.
//!
//! Usage:
//!   XAI_API_KEY=... cargo run --example scripted_debate
//!
//! The "user" side is a short scripted list of utterances so the demo can
//! run unattended; swap `ScriptedUser` for a real STT feed to go live.

use async_trait::async_trait;
use podium::client_wrapper::{CollaboratorError, SpeechSynthesizer, UtteranceSource};
use podium::clients::xai::XaiClient;
use podium::gateway::RemoteChannel;
use podium::{DebateConfig, DebateSession, FixedRoster, Persona, VoiceCategory};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

struct ConsoleSpeech;

#[async_trait]
impl SpeechSynthesizer for ConsoleSpeech {
    async fn speak(&self, text: &str) -> Result<(), CollaboratorError> {
        println!("🔊 {}", text);
        Ok(())
    }
}

struct ConsoleChannel;

#[async_trait]
impl RemoteChannel for ConsoleChannel {
    async fn publish(&self, event: &str, payload: &Value) -> Result<(), CollaboratorError> {
        println!("📡 {} {}", event, payload);
        Ok(())
    }
}

struct ScriptedUser {
    lines: VecDeque<String>,
}

#[async_trait]
impl UtteranceSource for ScriptedUser {
    async fn next_final_utterance(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

fn demo_roster(topic: &str) -> Vec<Persona> {
    vec![
        Persona {
            id: 0,
            name: "Raven".to_string(),
            prompt: format!(
                "You are Raven, a sardonic goth coder who treats '{}' like late-night stand-up. \
                 Roast flimsy arguments, drop absurd metaphors, and keep replies tight and spiky.",
                topic
            ),
            category: VoiceCategory::Female,
            description: "Raven is a goth coder who deflects with sarcasm and treats every debate \
                          like open mic night."
                .to_string(),
        },
        Persona {
            id: 1,
            name: "Lumi".to_string(),
            prompt: format!(
                "You are Lumi, a chaotic optimist who loves turning '{}' into playful challenges. \
                 Clap back with memes, hype wild ideas, and keep things light but pointed.",
                topic
            ),
            category: VoiceCategory::Female,
            description: "Lumi is a chaotic optimist who responds with meme energy and playful jabs."
                .to_string(),
        },
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    podium::init_logger();

    let api_key = std::env::var("XAI_API_KEY")?;
    let topic = "should AI personas be allowed to vote in polls?";
    let xai = Arc::new(XaiClient::new(&api_key, "grok-4-1-fast-non-reasoning"));

    let mut session = DebateSession::new(
        DebateConfig::with_topic(topic),
        xai.clone(),
        Arc::new(ConsoleSpeech),
        Arc::new(FixedRoster::new(demo_roster(topic))),
        xai,
        Arc::new(ConsoleChannel),
    );

    let mut user = ScriptedUser {
        lines: vec![
            "I think they absolutely should, they have opinions too".to_string(),
            "Raven, you're being too cynical about this".to_string(),
            "Okay, give me your final hot takes".to_string(),
        ]
        .into_iter()
        .collect(),
    };

    session.drive(&mut user).await?;

    println!("\n=== Transcript ===");
    for entry in session.transcript().entries() {
        println!("[{}] {}", entry.speaker, entry.content);
    }
    println!("\n=== Hot takes ===");
    for take in session.hot_takes().await {
        println!("🔥 {}", take);
    }
    Ok(())
}
