//! Anthropic Messages API adapter.
//!
//! Assistant turns are replayed as `text` / `tool_use` blocks. Tool results
//! travel as `tool_result` blocks inside a user message; consecutive results
//! share one message, as the API requires.

use super::http::{build_client, endpoint, post_json, token_count};
use super::settings_for;
use crate::config::ProviderSettings;
use async_trait::async_trait;
use relay_application::{ModelProvider, ProviderError};
use relay_domain::{
    ContentBlock, ConversationState, Message, ModelTurn, ProviderId, StopReason, UsageMetrics,
};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    settings: ProviderSettings,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let settings = settings_for(settings, ProviderId::Claude)?;
        Ok(Self {
            client: build_client(settings.timeout)?,
            settings,
        })
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Claude
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn send_turn(
        &self,
        conversation: &ConversationState,
        tools: &[Value],
    ) -> Result<ModelTurn, ProviderError> {
        let body = build_request(
            &self.settings.model,
            self.settings.max_tokens,
            conversation,
            tools,
        );
        debug!(
            "Anthropic request: model={}, messages={}",
            self.settings.model,
            conversation.len()
        );

        let request = self
            .client
            .post(endpoint(&self.settings.base_url, "v1/messages"))
            .header("x-api-key", self.settings.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", API_VERSION);

        parse_response(&post_json(request, &body).await?)
    }
}

pub fn build_request(
    model: &str,
    max_tokens: u32,
    conversation: &ConversationState,
    tools: &[Value],
) -> Value {
    let mut messages: Vec<Value> = Vec::new();
    // Index of the user message collecting the current run of tool results
    let mut open_results: Option<usize> = None;

    for message in conversation.messages() {
        match message {
            Message::User { text } => {
                open_results = None;
                messages.push(json!({ "role": "user", "content": text }));
            }
            Message::Assistant { content } => {
                open_results = None;
                let blocks: Vec<Value> = content
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text(text) if text.is_empty() => None,
                        ContentBlock::Text(text) => Some(json!({ "type": "text", "text": text })),
                        ContentBlock::ToolUse { id, name, input } => Some(json!({
                            "type": "tool_use",
                            "id": id,
                            "name": name,
                            "input": input,
                        })),
                    })
                    .collect();
                messages.push(json!({ "role": "assistant", "content": blocks }));
            }
            Message::ToolResult {
                tool_use_id,
                content,
                is_error,
                ..
            } => {
                let mut block = json!({
                    "type": "tool_result",
                    "tool_use_id": tool_use_id,
                    "content": content,
                });
                if *is_error {
                    block["is_error"] = json!(true);
                }

                match open_results {
                    Some(idx) => {
                        if let Some(blocks) = messages[idx]["content"].as_array_mut() {
                            blocks.push(block);
                        }
                    }
                    None => {
                        open_results = Some(messages.len());
                        messages.push(json!({ "role": "user", "content": [block] }));
                    }
                }
            }
        }
    }

    let mut body = json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": messages,
    });
    if !tools.is_empty() {
        body["tools"] = Value::Array(tools.to_vec());
    }
    body
}

pub fn parse_response(body: &Value) -> Result<ModelTurn, ProviderError> {
    if body.get("type").and_then(Value::as_str) == Some("error") {
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(ProviderError::InvalidResponse(format!(
            "API error: {}",
            message
        )));
    }

    let blocks = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::InvalidResponse("Response has no content array".into()))?;

    let mut content = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                let text = block.get("text").and_then(Value::as_str).unwrap_or("");
                content.push(ContentBlock::Text(text.to_string()));
            }
            Some("tool_use") => {
                let id = block.get("id").and_then(Value::as_str);
                let name = block.get("name").and_then(Value::as_str);
                let (Some(id), Some(name)) = (id, name) else {
                    return Err(ProviderError::InvalidResponse(
                        "tool_use block without id or name".into(),
                    ));
                };
                content.push(ContentBlock::ToolUse {
                    id: id.to_string(),
                    name: name.to_string(),
                    input: block.get("input").cloned().unwrap_or_else(|| json!({})),
                });
            }
            // thinking and other block types carry nothing we replay
            _ => {}
        }
    }

    let mut turn = ModelTurn {
        content,
        usage: UsageMetrics::new(
            token_count(body, "/usage/input_tokens"),
            token_count(body, "/usage/output_tokens"),
        ),
        stop_reason: body
            .get("stop_reason")
            .and_then(Value::as_str)
            .map(StopReason::from_wire),
        model: None,
    };
    if let Some(model) = body.get("model").and_then(Value::as_str) {
        turn = turn.with_model(model);
    }
    Ok(turn)
}

// ==================== Tests ====================
