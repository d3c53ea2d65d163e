mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use tracing::debug;

use client::ClaudeClient;
use types::*;

// =============================================================================
// Claude Agent
// =============================================================================

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> ClaudeClient {
        let client = ClaudeClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Single-shot completion with an explicit system prompt.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .system(system)
            .message(WireMessage::user(user))
            .temperature(0.0);

        let response = self.client().chat(&request).await?;

        response
            .text()
            .ok_or_else(|| anyhow!("No response from Claude"))
    }

    /// Structured extraction via forced tool use against the schema derived
    /// from `T`.
    pub async fn extract<T: DeserializeOwned + JsonSchema>(
        &self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let schema = tool_schema::<T>();

        debug!(model = %self.model, "Claude structured extraction");

        let tool_name = "structured_response";
        let mut request = ChatRequest::new(&self.model)
            .system(system_prompt)
            .message(WireMessage::user(user_prompt))
            .temperature(0.0) // Structured extraction must be deterministic
            .tool(ToolDefinitionWire {
                name: tool_name.to_string(),
                description: "Extract structured data from the input.".to_string(),
                input_schema: schema,
            });
        request.tool_choice = Some(serde_json::json!({
            "type": "tool",
            "name": tool_name,
        }));

        let response = self.client().chat(&request).await?;

        for block in &response.content {
            if let ContentBlock::ToolUse { input } = block {
                return serde_json::from_value(input.clone())
                    .map_err(|e| anyhow!("Failed to deserialize response: {}", e));
            }
        }

        Err(anyhow!("No structured output in Claude response"))
    }
}

/// Tool input schema for `T`, without the meta `$schema` marker the API
/// does not expect.
fn tool_schema<T: JsonSchema>() -> serde_json::Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    if let serde_json::Value::Object(map) = &mut value {
        map.remove("$schema");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_new() {
        let ai = Claude::new("sk-ant-test", "claude-sonnet-4-5-20250929");
        assert_eq!(ai.model(), "claude-sonnet-4-5-20250929");
    }

    #[test]
    fn test_claude_with_base_url() {
        let ai = Claude::new("sk-ant-test", "claude-sonnet-4-5-20250929")
            .with_base_url("https://custom.api.com");
        assert_eq!(ai.base_url, Some("https://custom.api.com".to_string()));
    }

    #[derive(serde::Deserialize, schemars::JsonSchema)]
    struct Sample {
        #[allow(dead_code)]
        value: String,
    }

    #[test]
    fn test_tool_schema_strips_meta() {
        let schema = tool_schema::<Sample>();
        assert!(schema.get("$schema").is_none());
        assert_eq!(schema["type"], "object");
    }
}
