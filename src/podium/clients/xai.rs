//! xAI client wrapper speaking the OpenAI-compatible surface.
//!
//! One concrete implementation of both collaborator seams the debate core
//! consumes from a model provider: [`LanguageClient`] for turn generation
//! (with optional forced tool choice) and
//! [`ResearchClient`](crate::podium::research::ResearchClient) for the
//! collapsed research capability (one web-search-enabled chat call, then
//! one image generation). Pointing the base URL at any other
//! OpenAI-compatible endpoint works the same way.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::podium::client_wrapper::{CollaboratorError, LanguageClient, Message, Role};
use crate::podium::research::{ResearchClient, ResearchFinding};

const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
const DEFAULT_IMAGE_MODEL: &str = "grok-2-image-1212";

const RESEARCH_SYSTEM: &str = "You are a research agent. Use web search to find info. Max 1 \
search.\n\nFind the SINGLE most surprising, counterintuitive, or impactful insight.\n\nOutput \
JSON:\n{\n  \"take\": \"One powerful sentence - the juiciest finding\",\n  \"explanation\": \
\"2-3 sentences why this matters\",\n  \"image_prompt\": \"Infographic prompt with the specific \
numbers from the take, a comparison, and a visual metaphor\"\n}";

/// Client wrapper for xAI's Grok models.
pub struct XaiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    image_model: String,
}

impl XaiClient {
    /// Create a client from an API key and explicit model string.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::new_with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create a client pointing at a custom OpenAI-compatible base URL.
    pub fn new_with_base_url(api_key: &str, model: &str, base_url: &str) -> Self {
        let http = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        XaiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    /// Override the image-generation model (builder pattern).
    pub fn with_image_model(mut self, image_model: &str) -> Self {
        self.image_model = image_model.to_string();
        self
    }

    /// Exposed model name.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, body: Value) -> Result<Value, CollaboratorError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    fn wire_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                json!({ "role": role, "content": m.content })
            })
            .collect()
    }
}

#[async_trait]
impl LanguageClient for XaiClient {
    async fn generate_reply(
        &self,
        messages: &[Message],
        tool_choice: Option<&str>,
    ) -> Result<Message, CollaboratorError> {
        let mut body = json!({
            "model": self.model,
            "messages": Self::wire_messages(messages),
        });
        if let Some(tool_name) = tool_choice {
            body["tool_choice"] = json!({
                "type": "function",
                "function": { "name": tool_name },
            });
        }

        let value = self.chat(body).await?;
        let message = &value["choices"][0]["message"];

        // Native tool calls are folded back into the uniform in-band
        // fragment the core's parser understands.
        if let Some(call) = message["tool_calls"].get(0) {
            let name = call["function"]["name"].as_str().unwrap_or_default();
            let arguments: Value = call["function"]["arguments"]
                .as_str()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_else(|| json!({}));
            let fragment = json!({ "tool_call": { "name": name, "parameters": arguments } });
            return Ok(Message::assistant(fragment.to_string()));
        }

        let content = message["content"].as_str().unwrap_or_default().to_string();
        Ok(Message::assistant(content))
    }
}

#[async_trait]
impl ResearchClient for XaiClient {
    async fn research_once(&self, query: &str) -> Result<ResearchFinding, CollaboratorError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": RESEARCH_SYSTEM },
                { "role": "user", "content": query },
            ],
            "tools": [ { "type": "web_search" } ],
            "temperature": 0.7,
        });
        let value = self.chat(body).await?;
        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();

        let result = extract_json(content).unwrap_or_else(|| json!({}));
        let take = result["take"].as_str().unwrap_or_default().to_string();
        let explanation = result["explanation"].as_str().unwrap_or_default().to_string();
        let image_prompt = result["image_prompt"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Infographic: {}", query));

        // Findings survive without the infographic.
        let image_url = match self.generate_image(&image_prompt).await {
            Ok(url) => url,
            Err(err) => {
                log::debug!("image generation failed, continuing without: {}", err);
                None
            }
        };

        Ok(ResearchFinding {
            take,
            explanation,
            image_url,
        })
    }
}

impl XaiClient {
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>, CollaboratorError> {
        let body = json!({
            "model": self.image_model,
            "prompt": prompt,
            "response_format": "url",
        });
        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let value: Value = response.json().await?;
        Ok(value["data"][0]["url"].as_str().map(str::to_string))
    }
}

/// Extract the first JSON object embedded in free text.
fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let fragment = &text[start..start + offset + 1];
                    return serde_json::from_str(fragment).ok();
                }
            }
            _ => {}
        }
    }
    None
}
