//! Gemini `generateContent` adapter.
//!
//! Gemini does not always assign ids to function calls, so ids are
//! synthesized from the conversation length and the part index. The
//! conversation only grows, which keeps them unique across turns.

use super::http::{build_client, endpoint, post_json, token_count};
use super::settings_for;
use crate::config::ProviderSettings;
use async_trait::async_trait;
use relay_application::{ModelProvider, ProviderError};
use relay_domain::tool::sanitizer::join_blocks;
use relay_domain::{
    ContentBlock, ConversationState, Message, ModelTurn, ProviderId, StopReason, UsageMetrics,
};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

pub struct GeminiProvider {
    client: Client,
    settings: ProviderSettings,
}

impl GeminiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let settings = settings_for(settings, ProviderId::Gemini)?;
        Ok(Self {
            client: build_client(settings.timeout)?,
            settings,
        })
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn send_turn(
        &self,
        conversation: &ConversationState,
        tools: &[Value],
    ) -> Result<ModelTurn, ProviderError> {
        let body = build_request(self.settings.max_tokens, conversation, tools);
        debug!(
            "Gemini request: model={}, contents={}",
            self.settings.model,
            conversation.len()
        );

        let path = format!("models/{}:generateContent", self.settings.model);
        let request = self
            .client
            .post(endpoint(&self.settings.base_url, &path))
            .header(
                "x-goog-api-key",
                self.settings.api_key.as_deref().unwrap_or_default(),
            );

        parse_response(&post_json(request, &body).await?, conversation.len())
    }
}

pub fn build_request(max_tokens: u32, conversation: &ConversationState, tools: &[Value]) -> Value {
    let mut contents: Vec<Value> = Vec::new();
    let mut open_results: Option<usize> = None;

    for message in conversation.messages() {
        match message {
            Message::User { text } => {
                open_results = None;
                contents.push(json!({ "role": "user", "parts": [{ "text": text }] }));
            }
            Message::Assistant { content } => {
                open_results = None;
                let parts: Vec<Value> = content
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text(text) if text.is_empty() => None,
                        ContentBlock::Text(text) => Some(json!({ "text": text })),
                        ContentBlock::ToolUse { name, input, .. } => Some(json!({
                            "functionCall": { "name": name, "args": input }
                        })),
                    })
                    .collect();
                contents.push(json!({ "role": "model", "parts": parts }));
            }
            Message::ToolResult {
                tool_name,
                content,
                is_error,
                ..
            } => {
                let part = json!({
                    "functionResponse": {
                        "name": tool_name,
                        "response": { "content": join_blocks(content), "isError": is_error },
                    }
                });
                match open_results {
                    Some(idx) => {
                        if let Some(parts) = contents[idx]["parts"].as_array_mut() {
                            parts.push(part);
                        }
                    }
                    None => {
                        open_results = Some(contents.len());
                        contents.push(json!({ "role": "user", "parts": [part] }));
                    }
                }
            }
        }
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": { "maxOutputTokens": max_tokens },
    });
    if !tools.is_empty() {
        body["tools"] = json!([{ "functionDeclarations": tools }]);
    }
    body
}

/// Parse a reply; `turn_index` seeds synthesized call ids.
pub fn parse_response(body: &Value, turn_index: usize) -> Result<ModelTurn, ProviderError> {
    let Some(candidate) = body.pointer("/candidates/0") else {
        let reason = body
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
            .map(|r| format!("Prompt blocked: {}", r))
            .unwrap_or_else(|| "No candidates in response".to_string());
        return Err(ProviderError::InvalidResponse(reason));
    };

    let parts = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut content = Vec::with_capacity(parts.len());
    for (idx, part) in parts.iter().enumerate() {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            content.push(ContentBlock::Text(text.to_string()));
        } else if let Some(call) = part.get("functionCall") {
            let name = call.get("name").and_then(Value::as_str).ok_or_else(|| {
                ProviderError::InvalidResponse("functionCall without a name".into())
            })?;
            let id = call
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("gemini-{}-{}", turn_index, idx));
            content.push(ContentBlock::ToolUse {
                id,
                name: name.to_string(),
                input: call.get("args").cloned().unwrap_or_else(|| json!({})),
            });
        }
    }

    let mut turn = ModelTurn {
        content,
        usage: UsageMetrics::new(
            token_count(body, "/usageMetadata/promptTokenCount"),
            token_count(body, "/usageMetadata/candidatesTokenCount"),
        ),
        stop_reason: candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .map(StopReason::from_wire),
        model: None,
    };
    if turn.has_tool_uses() {
        // Gemini reports STOP even when it asks for functions
        turn.stop_reason = Some(StopReason::ToolUse);
    }
    if let Some(model) = body.get("modelVersion").and_then(Value::as_str) {
        turn = turn.with_model(model);
    }
    Ok(turn)
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::{TextBlock, ToolInvocation};

    #[test]
    fn test_request_shape_with_function_responses() {
        let mut state = ConversationState::new("how many tickets in last 3 days");
        state
            .push_assistant(vec![
                ContentBlock::ToolUse {
                    id: "gemini-1-0".into(),
                    name: "get_count".into(),
                    input: json!({ "days": 3 }),
                },
                ContentBlock::ToolUse {
                    id: "gemini-1-1".into(),
                    name: "sync_tickets".into(),
                    input: json!({}),
                },
            ])
            .unwrap();
        for (id, name) in [("gemini-1-0", "get_count"), ("gemini-1-1", "sync_tickets")] {
            let closed = ToolInvocation::open(id, name, json!({}))
                .close(vec![TextBlock::new("42")], false);
            state.push_tool_result(&closed).unwrap();
        }

        let tools = vec![json!({ "name": "get_count", "parameters": { "type": "object" } })];
        let body = build_request(8192, &state, &tools);
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["functionCall"]["args"]["days"], 3);
        let responses = contents[2]["parts"].as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1]["functionResponse"]["name"], "sync_tickets");
        assert_eq!(responses[0]["functionResponse"]["response"]["content"], "42");
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "get_count");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_parse_synthesizes_unique_ids() {
        let body = json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": { "role": "model", "parts": [
                    { "functionCall": { "name": "get_count", "args": { "days": 3 } } },
                    { "functionCall": { "name": "get_count", "args": { "days": 7 } } }
                ]}
            }],
            "usageMetadata": { "promptTokenCount": 30, "candidatesTokenCount": 4 },
            "modelVersion": "gemini-1.5-pro-002"
        });

        let turn = parse_response(&body, 3).unwrap();
        let ids: Vec<&str> = turn.tool_uses().iter().map(|u| u.0).collect();
        assert_eq!(ids, vec!["gemini-3-0", "gemini-3-1"]);
        assert_eq!(turn.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(turn.usage, UsageMetrics::new(30, 4));
        assert_eq!(turn.model.as_deref(), Some("gemini-1.5-pro-002"));
    }

    #[test]
    fn test_parse_keeps_api_ids() {
        let body = json!({
            "candidates": [{ "content": { "parts": [
                { "functionCall": { "id": "fc_9", "name": "get_count" } }
            ]}}]
        });
        let turn = parse_response(&body, 1).unwrap();
        assert_eq!(turn.tool_uses()[0].0, "fc_9");
        assert_eq!(turn.tool_uses()[0].2, &json!({}));
    }

    #[test]
    fn test_parse_text() {
        let body = json!({
            "candidates": [{ "finishReason": "STOP",
                             "content": { "parts": [{ "text": "42 " }, { "text": "tickets." }] } }]
        });
        let turn = parse_response(&body, 1).unwrap();
        assert_eq!(turn.text(), "42 tickets.");
        assert_eq!(turn.stop_reason, Some(StopReason::EndTurn));
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = parse_response(&body, 1).unwrap_err();
        assert_eq!(err.to_string(), "Invalid response: Prompt blocked: SAFETY");
    }
}
