//! The tool surface exposed to debating personas.
//!
//! This is the only wire protocol the core defines: six tools a persona
//! may invoke while it holds the turn. Tool metadata is rendered into the
//! persona's instructions; invocations come back embedded in the model's
//! reply as a `{"tool_call": {"name": ..., "parameters": {...}}}` JSON
//! fragment and are extracted with brace counting, which tolerates
//! surrounding prose.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Hand the turn to another participant (or back to the user).
pub const TOOL_GIVE_TURN: &str = "giveTurnToNextSpeaker";
/// Append a new hot take to the shared list.
pub const TOOL_ADD_HOT_TAKE: &str = "addHotTake";
/// Sharpen an existing hot take in place.
pub const TOOL_REPLACE_HOT_TAKE: &str = "replaceHotTake";
/// Remove a hot take from the shared list.
pub const TOOL_DELETE_HOT_TAKE: &str = "deleteHotTake";
/// React with a single emoji.
pub const TOOL_EMOJI_REACTION: &str = "emojiReaction";
/// Animate an avatar in the UI.
pub const TOOL_AVATAR: &str = "avatarTool";

/// Defines the type of a tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// Defines a parameter for a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: Option<String>,
    pub required: bool,
}

impl ToolParameter {
    /// Define a new tool parameter with the provided name and type.
    pub fn new(name: impl Into<String>, param_type: ToolParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
        }
    }

    /// Add a human readable description that will surface in rendered schemas.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Metadata about a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    /// Create metadata with the supplied identifier and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter definition to the tool metadata.
    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }
}

/// Represents the result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool execution was successful.
    pub success: bool,
    /// The output data from the tool.
    pub output: Value,
    /// Optional error message if execution failed.
    pub error: Option<String>,
}

impl ToolResult {
    /// Convenience constructor for successful tool execution.
    pub fn success(output: Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    /// Convenience constructor for failed tool execution.
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            output: Value::Null,
            error: Some(error),
        }
    }
}

/// A tool invocation parsed out of an LLM reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Name of the tool being invoked.
    pub name: String,
    /// Raw JSON arguments as the model supplied them.
    pub arguments: Value,
}

impl ToolInvocation {
    /// Fetch a string argument, defaulting to empty when absent.
    pub fn str_arg(&self, key: &str) -> &str {
        self.arguments.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// The full toolset handed to every debating persona.
pub fn debate_toolset() -> Vec<ToolMetadata> {
    vec![
        ToolMetadata::new(
            TOOL_GIVE_TURN,
            "Transition to the next speaker. Prefer whoever has not spoken recently or holds an \
             opposing view, and give the user a chance to participate.",
        )
        .with_parameter(
            ToolParameter::new("speaker", ToolParameterType::String)
                .with_description("Name of the next speaker: one of the other participants or 'user'")
                .required(),
        ),
        ToolMetadata::new(TOOL_ADD_HOT_TAKE, "Add a new hot take to the shared list").with_parameter(
            ToolParameter::new("text", ToolParameterType::String)
                .with_description("The hot take text, a sharp tweetable insight from the debate")
                .required(),
        ),
        ToolMetadata::new(
            TOOL_REPLACE_HOT_TAKE,
            "Replace an existing hot take with a refined version",
        )
        .with_parameter(
            ToolParameter::new("oldText", ToolParameterType::String)
                .with_description("Exact text of the hot take to replace")
                .required(),
        )
        .with_parameter(
            ToolParameter::new("newText", ToolParameterType::String)
                .with_description("New refined text")
                .required(),
        ),
        ToolMetadata::new(TOOL_DELETE_HOT_TAKE, "Delete a hot take from the shared list")
            .with_parameter(
                ToolParameter::new("text", ToolParameterType::String)
                    .with_description("Exact text of the hot take to delete")
                    .required(),
            ),
        ToolMetadata::new(
            TOOL_EMOJI_REACTION,
            "Express your character's current emotion with a single emoji",
        )
        .with_parameter(
            ToolParameter::new("emoji", ToolParameterType::String)
                .with_description("A single emoji character")
                .required(),
        ),
        ToolMetadata::new(
            TOOL_AVATAR,
            "Animate avatars in the UI. Only setExpression with presets smile, surprised, \
             concerned, wink or laugh is supported; target via context.avatarId of 'assistant' \
             or 'local'.",
        )
        .with_parameter(
            ToolParameter::new("call", ToolParameterType::Object)
                .with_description("The animation call: {type, preset?, context?}")
                .required(),
        ),
    ]
}

/// Render the tool contract for inclusion in persona instructions.
pub fn render_tool_instructions(tools: &[ToolMetadata]) -> String {
    let mut block = String::from("You have access to the following tools:\n");
    for tool in tools {
        block.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        if !tool.parameters.is_empty() {
            block.push_str("  Parameters:\n");
            for param in &tool.parameters {
                block.push_str(&format!(
                    "    - {} ({:?}): {}\n",
                    param.name,
                    param.param_type,
                    param.description.as_deref().unwrap_or("No description")
                ));
            }
        }
    }
    block.push_str(
        "\nTo use a tool, respond with a JSON object in the following format:\n\
         {\"tool_call\": {\"name\": \"tool_name\", \"parameters\": {...}}}\n\
         After tool execution, you'll receive the result and can continue.\n",
    );
    block
}

/// Parse the first tool invocation out of an LLM reply, if any.
///
/// Scans for a `{"tool_call"` fragment and brace-counts to the matching
/// closing brace rather than parsing the whole reply as JSON, which
/// handles the common case of the model wrapping the call in prose.
pub fn parse_tool_invocation(response: &str) -> Option<ToolInvocation> {
    let start = response.find("{\"tool_call\"")?;
    let mut depth = 0usize;
    let mut end = None;
    for (offset, ch) in response[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let fragment = &response[start..end?];
    let parsed: Value = serde_json::from_str(fragment).ok()?;
    let call = parsed.get("tool_call")?;
    let name = call.get("name")?.as_str()?.to_string();
    let arguments = call
        .get("parameters")
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    Some(ToolInvocation { name, arguments })
}

/// Remove the first tool-call fragment from a reply, leaving the prose.
///
/// Personas are told to narrate their tool use; whatever text surrounds
/// the fragment is the part worth keeping in the transcript.
pub fn strip_tool_fragment(response: &str) -> String {
    if let Some(start) = response.find("{\"tool_call\"") {
        let mut depth = 0usize;
        for (offset, ch) in response[start..].char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let end = start + offset + 1;
                        let mut prose = String::with_capacity(response.len());
                        prose.push_str(&response[..start]);
                        prose.push_str(&response[end..]);
                        return prose.trim().to_string();
                    }
                }
                _ => {}
            }
        }
    }
    response.trim().to_string()
}

/// Helper used by tests and demos: serialize an invocation the way a model
/// would emit it.
pub fn tool_call_fragment(name: &str, parameters: Value) -> String {
    serde_json::json!({"tool_call": {"name": name, "parameters": parameters}}).to_string()
}

/// Quick lookup table of the toolset keyed by name.
pub fn toolset_by_name() -> HashMap<String, ToolMetadata> {
    debate_toolset()
        .into_iter()
        .map(|t| (t.name.clone(), t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toolset_names_are_the_wire_protocol() {
        let names: Vec<String> = debate_toolset().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                TOOL_GIVE_TURN,
                TOOL_ADD_HOT_TAKE,
                TOOL_REPLACE_HOT_TAKE,
                TOOL_DELETE_HOT_TAKE,
                TOOL_EMOJI_REACTION,
                TOOL_AVATAR,
            ]
        );

        let by_name = toolset_by_name();
        assert_eq!(by_name.len(), 6);
        let replace = &by_name[TOOL_REPLACE_HOT_TAKE];
        assert!(replace.parameters.iter().all(|p| p.required));
        assert_eq!(replace.parameters.len(), 2);
    }

    #[test]
    fn test_parse_invocation_embedded_in_prose() {
        let reply = format!(
            "Let me note that down. {} There we go.",
            tool_call_fragment(TOOL_ADD_HOT_TAKE, json!({"text": "cats are liquids"}))
        );
        let invocation = parse_tool_invocation(&reply).unwrap();
        assert_eq!(invocation.name, TOOL_ADD_HOT_TAKE);
        assert_eq!(invocation.str_arg("text"), "cats are liquids");
    }

    #[test]
    fn test_parse_handles_nested_braces() {
        let reply = tool_call_fragment(
            TOOL_AVATAR,
            json!({"call": {"type": "setExpression", "preset": "smile", "context": {"avatarId": "local"}}}),
        );
        let invocation = parse_tool_invocation(&reply).unwrap();
        assert_eq!(invocation.name, TOOL_AVATAR);
        assert_eq!(
            invocation.arguments["call"]["context"]["avatarId"],
            json!("local")
        );
    }

    #[test]
    fn test_parse_ignores_plain_text() {
        assert!(parse_tool_invocation("no tools here, just opinions").is_none());
        assert!(parse_tool_invocation("{\"tool_call\": \"malformed").is_none());
    }

    #[test]
    fn test_strip_leaves_surrounding_prose() {
        let reply = format!(
            "I'm adding this one. {} Moving on.",
            tool_call_fragment(TOOL_ADD_HOT_TAKE, json!({"text": "t"}))
        );
        assert_eq!(strip_tool_fragment(&reply), "I'm adding this one.  Moving on.");
        assert_eq!(strip_tool_fragment("plain reply"), "plain reply");
    }

    #[test]
    fn test_rendered_instructions_mention_every_tool() {
        let rendered = render_tool_instructions(&debate_toolset());
        for tool in debate_toolset() {
            assert!(rendered.contains(&tool.name));
        }
        assert!(rendered.contains("{\"tool_call\""));
    }
}
