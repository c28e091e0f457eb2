use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;
use crate::llm::{
    ClassificationRequest, ClassificationResponse, SYSTEM_PROMPT, TopicClassifier,
    build_chunk_prompt,
};

/// Default model used when none is configured
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const TOOL_NAME: &str = "submit_topic";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// API root, overridable for tests and proxies
    pub base_url: String,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env(model: Option<&str>) -> Result<Self, PipelineError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            PipelineError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;

        let config = Self::new(api_key, model.unwrap_or(DEFAULT_MODEL).to_string());
        match std::env::var("ANTHROPIC_BASE_URL") {
            Ok(base_url) => Ok(config.with_base_url(&base_url)),
            Err(_) => Ok(config),
        }
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.2,
            max_tokens: 1024,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a message with a forced tool call and return the tool input
    pub async fn send_with_tool(
        &self,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, PipelineError> {
        let tool = Tool {
            name: TOOL_NAME.to_string(),
            description: "Submit the topic label, sentiment score and rationale for the chunk"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "topic_label": {
                        "type": "string",
                        "description": "Main theme of the chunk, at most 2 words"
                    },
                    "sentiment_score": {
                        "type": "number",
                        "minimum": -1.0,
                        "maximum": 1.0,
                        "description": "Tone from -1.0 (very negative) to 1.0 (very positive)"
                    },
                    "rationale": {
                        "type": "string",
                        "description": "One or two sentences explaining the score"
                    }
                },
                "required": ["topic_label", "sentiment_score", "rationale"]
            }),
        };

        let request = AnthropicToolRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
            tools: vec![tool],
            tool_choice: Some(ToolChoice {
                choice_type: "tool".to_string(),
                name: TOOL_NAME.to_string(),
            }),
        };

        let response = self
            .client
            .post(self.config.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                PipelineError::TransientService(format!("failed to reach Anthropic API: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let response: AnthropicResponse = response.json().await.map_err(|e| {
            PipelineError::MalformedResponse(format!("failed to parse Anthropic API response: {e}"))
        })?;

        // Find the tool_use content block
        response
            .content
            .into_iter()
            .find(|c| c.content_type == "tool_use" && c.name.as_deref() == Some(TOOL_NAME))
            .and_then(|c| c.input)
            .ok_or_else(|| PipelineError::MalformedResponse("no tool_use block in response".to_string()))
    }
}

#[async_trait::async_trait]
impl TopicClassifier for AnthropicClient {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResponse, PipelineError> {
        let prompt = build_chunk_prompt(request);
        let input = self.send_with_tool(SYSTEM_PROMPT, &prompt).await?;
        debug!(chunk = request.chunk_index, payload = %input, "classifier tool input");

        serde_json::from_value(input).map_err(|e| {
            PipelineError::MalformedResponse(format!("tool input is not a classification: {e}"))
        })
    }
}

/// Map a non-success HTTP status onto the error taxonomy
fn status_error(status: StatusCode, body: &str) -> PipelineError {
    let message = format!("Anthropic API error: {} - {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
        // 529: API overloaded
        || status.as_u16() == 529
    {
        PipelineError::TransientService(message)
    } else {
        PipelineError::ServiceRejected(message)
    }
}

#[derive(Debug, Serialize)]
struct AnthropicToolRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}
