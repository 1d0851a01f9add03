//! OpenAI-compatible chat completions adapter.
//!
//! Tool calls arrive with their arguments as a JSON-encoded string, and tool
//! results go back as `role: "tool"` messages keyed by `tool_call_id`.

use super::http::{build_client, endpoint, post_json, token_count};
use super::settings_for;
use crate::config::ProviderSettings;
use async_trait::async_trait;
use relay_application::{ModelProvider, ProviderError};
use relay_domain::tool::sanitizer::join_blocks;
use relay_domain::{
    ContentBlock, ConversationState, Message, ModelTurn, ProviderId, StopReason, UsageMetrics,
};
use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value, json};
use tracing::debug;

pub struct OpenAiProvider {
    client: Client,
    settings: ProviderSettings,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let settings = settings_for(settings, ProviderId::OpenAi)?;
        Ok(Self {
            client: build_client(settings.timeout)?,
            settings,
        })
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
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
            "OpenAI request: model={}, messages={}",
            self.settings.model,
            conversation.len()
        );

        let request = chat_request(&self.client, &self.settings);
        parse_response(&post_json(request, &body).await?)
    }
}

/// POST to `chat/completions`; Azure deployments take an `api-key` header
/// and an optional `api-version` query instead of bearer auth.
fn chat_request(client: &Client, settings: &ProviderSettings) -> RequestBuilder {
    let key = settings.api_key.as_deref().unwrap_or_default();
    let request = client.post(endpoint(&settings.base_url, "chat/completions"));

    match &settings.azure {
        Some(azure) => {
            let request = request.header("api-key", key);
            match &azure.api_version {
                Some(version) => request.query(&[("api-version", version)]),
                None => request,
            }
        }
        None => request.bearer_auth(key),
    }
}

pub fn build_request(
    model: &str,
    max_tokens: u32,
    conversation: &ConversationState,
    tools: &[Value],
) -> Value {
    let messages: Vec<Value> = conversation.messages().iter().map(to_wire).collect();

    let mut body = json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": messages,
    });
    if !tools.is_empty() {
        body["tools"] = Value::Array(tools.to_vec());
        body["tool_choice"] = json!("auto");
    }
    body
}

fn to_wire(message: &Message) -> Value {
    match message {
        Message::User { text } => json!({ "role": "user", "content": text }),
        Message::Assistant { content } => {
            let text: String = content.iter().filter_map(|b| b.as_text()).collect();
            let calls: Vec<Value> = content
                .iter()
                .filter_map(|b| b.as_tool_use())
                .map(|(id, name, input)| {
                    // Arguments that never parsed are replayed verbatim
                    let arguments = match input {
                        Value::String(raw) => raw.clone(),
                        other => other.to_string(),
                    };
                    json!({
                        "id": id,
                        "type": "function",
                        "function": { "name": name, "arguments": arguments },
                    })
                })
                .collect();

            let mut wire = Map::new();
            wire.insert("role".into(), json!("assistant"));
            wire.insert(
                "content".into(),
                if text.is_empty() { Value::Null } else { json!(text) },
            );
            if !calls.is_empty() {
                wire.insert("tool_calls".into(), Value::Array(calls));
            }
            Value::Object(wire)
        }
        Message::ToolResult {
            tool_use_id,
            content,
            ..
        } => json!({
            "role": "tool",
            "tool_call_id": tool_use_id,
            "content": join_blocks(content),
        }),
    }
}

pub fn parse_response(body: &Value) -> Result<ModelTurn, ProviderError> {
    let choice = body
        .pointer("/choices/0")
        .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;
    let message = choice
        .get("message")
        .ok_or_else(|| ProviderError::InvalidResponse("Choice has no message".into()))?;

    let mut content = Vec::new();
    if let Some(text) = message.get("content").and_then(Value::as_str)
        && !text.is_empty()
    {
        content.push(ContentBlock::Text(text.to_string()));
    }

    for call in message
        .get("tool_calls")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let id = call.get("id").and_then(Value::as_str).ok_or_else(|| {
            ProviderError::InvalidResponse("Tool call without an id".into())
        })?;
        let name = call
            .pointer("/function/name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::InvalidResponse("Tool call without a name".into()))?;
        let raw_args = call
            .pointer("/function/arguments")
            .and_then(Value::as_str)
            .unwrap_or("");

        content.push(ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input: parse_arguments(raw_args),
        });
    }

    let mut turn = ModelTurn {
        content,
        usage: UsageMetrics::new(
            token_count(body, "/usage/prompt_tokens"),
            token_count(body, "/usage/completion_tokens"),
        ),
        stop_reason: choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(StopReason::from_wire),
        model: None,
    };
    if let Some(model) = body.get("model").and_then(Value::as_str) {
        turn = turn.with_model(model);
    }
    Ok(turn)
}

/// Decode the argument string.
///
/// Unparseable arguments are kept as the raw string so validation reports
/// them to the model as a tool error instead of failing the whole turn.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

// ==================== Tests ====================
