//! Ephemeral speaker instances.
//!
//! A [`Speaker`] is the value object that exists while one persona holds
//! the floor. It is assembled fresh on every turn entry — instructions
//! and perspective view derived from the current shared state — and
//! discarded whole on handoff. No incremental context survives a swap.

use crate::podium::client_wrapper::Message;
use crate::podium::hot_takes::MAX_HOT_TAKES;
use crate::podium::persona::Persona;
use crate::podium::perspective::perspective_for;
use crate::podium::session_state::SessionState;
use crate::podium::tools::{debate_toolset, render_tool_instructions};
use crate::podium::transcript::Transcript;

/// The active persona's working context for one tenure on the floor.
#[derive(Debug)]
pub struct Speaker {
    /// Id of the persona holding the floor.
    pub persona_id: u32,
    /// Name of the persona holding the floor.
    pub persona_name: String,
    context: Vec<Message>,
}

impl Speaker {
    /// Build a fresh speaker for `persona`: system instructions derived
    /// from the current shared state, followed by the persona's
    /// perspective view of the transcript.
    pub fn assemble(
        topic: &str,
        persona: &Persona,
        roster: &[Persona],
        state: &SessionState,
        transcript: &Transcript,
    ) -> Self {
        let mut context = vec![Message::system(build_instructions(
            topic, persona, roster, state,
        ))];
        context.extend(perspective_for(transcript, &persona.name));
        Speaker {
            persona_id: persona.id,
            persona_name: persona.name.clone(),
            context,
        }
    }

    /// Recompute the system instructions after a shared-artifact change.
    ///
    /// Only the leading system message is swapped; the in-turn exchange is
    /// preserved so the model keeps any tool feedback it already received.
    pub fn refresh_instructions(
        &mut self,
        topic: &str,
        persona: &Persona,
        roster: &[Persona],
        state: &SessionState,
    ) {
        if self.context.is_empty() {
            self.context.push(Message::system(""));
        }
        self.context[0] = Message::system(build_instructions(topic, persona, roster, state));
    }

    /// Append a message to the working context.
    pub fn push(&mut self, message: Message) {
        self.context.push(message);
    }

    /// The full working context, system message first.
    pub fn context(&self) -> &[Message] {
        &self.context
    }
}

/// Assemble the persona's system instructions from current shared state.
fn build_instructions(
    topic: &str,
    persona: &Persona,
    roster: &[Persona],
    state: &SessionState,
) -> String {
    // Personas out researching have effectively left the room.
    let others: Vec<&str> = roster
        .iter()
        .filter(|p| p.id != persona.id && !state.researching.contains(&p.id))
        .map(|p| p.name.as_str())
        .collect();
    let others = if others.is_empty() {
        "the User".to_string()
    } else {
        format!("{}, and User", others.join(", "))
    };

    let mut instructions = format!(
        "You are {name} participating in a debate on: \"{topic}\"\n\n\
         Your role:\n{prompt}\n\n\
         Other participants: {others}\n\n\
         Rules:\n\
         - Respond briefly (one sentence, hard cap 15 words)\n\
         - Stay in character and address others by name\n\
         - The conversation starts with a user message; respond to it first before debating others\n\
         - Messages from other participants are prefixed \"<name> says:\"; never repeat that prefix in your reply\n\n\
         The hot-takes list below is the shared output of this debate (max {cap} entries).\n\
         Add an insight when one crystallizes, replace a take you can sharpen, delete what got \
         demolished, and always announce what you're doing.\n\n\
         Current hot takes:\n{takes}\n",
        name = persona.name,
        topic = topic,
        prompt = persona.prompt,
        others = others,
        cap = MAX_HOT_TAKES,
        takes = state.hot_takes.as_prompt_block(),
    );

    if let Some(finding) = state.research_results.get(&persona.id) {
        instructions.push_str(&format!(
            "\nYour fresh research findings. Share this in your next response:\n\
             {take}\n\n{explanation}\n\n\
             Start your response by presenting this finding to the group!\n",
            take = finding.take,
            explanation = finding.explanation,
        ));
    }

    instructions.push('\n');
    instructions.push_str(&render_tool_instructions(&debate_toolset()));
    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::podium::client_wrapper::Role;
    use crate::podium::persona::VoiceCategory;
    use crate::podium::research::ResearchFinding;
    use crate::podium::transcript::USER_SPEAKER;

    fn persona(id: u32, name: &str) -> Persona {
        Persona {
            id,
            name: name.to_string(),
            prompt: format!("You are {}.", name),
            category: VoiceCategory::Female,
            description: String::new(),
        }
    }

    fn roster() -> Vec<Persona> {
        vec![persona(0, "Raven"), persona(1, "Lumi"), persona(2, "Sage")]
    }

    #[test]
    fn test_assemble_puts_instructions_first_then_perspective() {
        let roster = roster();
        let state = SessionState::new();
        let mut transcript = Transcript::new();
        transcript.append(Role::User, USER_SPEAKER, "go");
        transcript.append(Role::Assistant, "Lumi", "hello");

        let speaker = Speaker::assemble("topic", &roster[0], &roster, &state, &transcript);
        let context = speaker.context();
        assert_eq!(context[0].role, Role::System);
        assert!(context[0].content.contains("You are Raven"));
        assert_eq!(context[1].content, "user says: go");
        assert_eq!(context[2].content, "Lumi says: hello");
    }

    #[test]
    fn test_researching_peers_are_left_out_of_the_room() {
        let roster = roster();
        let mut state = SessionState::new();
        state.researching.insert(1);

        let speaker = Speaker::assemble("t", &roster[0], &roster, &state, &Transcript::new());
        let instructions = &speaker.context()[0].content;
        assert!(instructions.contains("Sage, and User"));
        assert!(!instructions.contains("Lumi"));
    }

    #[test]
    fn test_fresh_findings_are_folded_in_for_their_owner_only() {
        let roster = roster();
        let mut state = SessionState::new();
        state.research_results.insert(
            2,
            ResearchFinding {
                take: "fusion got 10x cheaper".to_string(),
                explanation: "costs collapsed".to_string(),
                image_url: None,
            },
        );

        let sage = Speaker::assemble("t", &roster[2], &roster, &state, &Transcript::new());
        assert!(sage.context()[0].content.contains("fusion got 10x cheaper"));

        let raven = Speaker::assemble("t", &roster[0], &roster, &state, &Transcript::new());
        assert!(!raven.context()[0].content.contains("fusion got 10x cheaper"));
    }

    #[test]
    fn test_refresh_swaps_only_the_system_message() {
        let roster = roster();
        let mut state = SessionState::new();
        let mut speaker = Speaker::assemble("t", &roster[0], &roster, &state, &Transcript::new());
        speaker.push(Message::user("mid-turn feedback"));

        state.hot_takes.add("new take").unwrap();
        speaker.refresh_instructions("t", &roster[0], &roster, &state);

        assert!(speaker.context()[0].content.contains("new take"));
        assert_eq!(speaker.context()[1].content, "mid-turn feedback");
    }
}
