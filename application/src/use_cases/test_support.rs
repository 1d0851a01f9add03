//! Scripted port doubles shared by the use-case tests.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::model_provider::{ModelProvider, ProviderError};
use crate::ports::progress::LoopProgressNotifier;
use crate::ports::tool_executor::{ToolExecutorError, ToolExecutorPort};
use async_trait::async_trait;
use relay_domain::{
    ContentBlock, ConversationState, Message, ModelTurn, ProviderId, ProviderResult,
    RawToolOutput, ToolCatalog, ToolDescriptor, UsageMetrics,
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn get_count_catalog() -> ToolCatalog {
    ToolCatalog::new(vec![
        ToolDescriptor::new("get_count", "Count tickets created in the last N days").with_schema(
            json!({
                "type": "object",
                "properties": { "days": { "type": "number" } },
                "required": ["days"]
            }),
        ),
        ToolDescriptor::new("sync_tickets", "Pull fresh tickets from the ticketing API"),
    ])
    .unwrap()
}

pub(crate) fn text_turn(text: &str) -> ModelTurn {
    ModelTurn::from_text(text).with_usage(UsageMetrics::new(10, 5))
}

pub(crate) fn tool_turn(calls: &[(&str, &str, Value)]) -> ModelTurn {
    ModelTurn::from_blocks(
        calls
            .iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: input.clone(),
            })
            .collect(),
    )
    .with_usage(UsageMetrics::new(10, 5))
}

pub(crate) enum Step {
    Turn(ModelTurn),
    Fail(ProviderError),
    Panic,
}

pub(crate) struct MockProvider {
    id: ProviderId,
    script: Mutex<VecDeque<Step>>,
    /// When set and the script is exhausted, request this tool forever.
    endless_tool: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
    tools_seen: Mutex<Vec<usize>>,
}

impl MockProvider {
    pub(crate) fn new(id: ProviderId, steps: Vec<Step>) -> Self {
        Self {
            id,
            script: Mutex::new(VecDeque::from(steps)),
            endless_tool: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            tools_seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn turns(id: ProviderId, turns: Vec<ModelTurn>) -> Self {
        Self::new(id, turns.into_iter().map(Step::Turn).collect())
    }

    pub(crate) fn endless(id: ProviderId, tool: &str) -> Self {
        Self {
            endless_tool: Some(tool.to_string()),
            ..Self::new(id, Vec::new())
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Conversation snapshots, one per `send_turn` call.
    pub(crate) fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn tools_seen(&self) -> Vec<usize> {
        self.tools_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn send_turn(
        &self,
        conversation: &ConversationState,
        tools: &[Value],
    ) -> Result<ModelTurn, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push(conversation.messages().to_vec());
        self.tools_seen.lock().unwrap().push(tools.len());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Turn(turn)) => Ok(turn),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Panic) => panic!("scripted provider panic"),
            None => match &self.endless_tool {
                Some(tool) => {
                    let id = format!("loop_{}", n);
                    Ok(tool_turn(&[(id.as_str(), tool.as_str(), json!({}))])
                        .with_usage(UsageMetrics::new(1, 1)))
                }
                None => Err(ProviderError::Other("script exhausted".into())),
            },
        }
    }
}

pub(crate) struct MockToolExecutor {
    tools: Vec<ToolDescriptor>,
    outputs: Mutex<HashMap<String, VecDeque<Result<RawToolOutput, ToolExecutorError>>>>,
    calls: Mutex<Vec<(String, Value)>>,
    delay: Duration,
    list_error: bool,
}

impl MockToolExecutor {
    pub(crate) fn new() -> Self {
        Self {
            tools: get_count_catalog().iter().cloned().collect(),
            outputs: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            list_error: false,
        }
    }

    pub(crate) fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn failing_listing() -> Self {
        Self {
            list_error: true,
            ..Self::new()
        }
    }

    /// Queue the next output for `tool`; unscripted calls return "ok".
    pub(crate) fn script(&self, tool: &str, output: Result<RawToolOutput, ToolExecutorError>) {
        self.outputs
            .lock()
            .unwrap()
            .entry(tool.to_string())
            .or_default()
            .push_back(output);
    }

    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutorPort for MockToolExecutor {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolExecutorError> {
        if self.list_error {
            return Err(ToolExecutorError::Unavailable("backend not running".into()));
        }
        Ok(self.tools.clone())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: &Value,
    ) -> Result<RawToolOutput, ToolExecutorError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self
            .outputs
            .lock()
            .unwrap()
            .get_mut(name)
            .and_then(|queue| queue.pop_front());
        scripted.unwrap_or_else(|| Ok(RawToolOutput::success("ok")))
    }
}

#[derive(Default)]
pub(crate) struct RecordingLogger {
    events: Mutex<Vec<(&'static str, Value)>>,
}

impl RecordingLogger {
    pub(crate) fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type, event.payload));
    }
}

#[derive(Default)]
pub(crate) struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl LoopProgressNotifier for RecordingProgress {
    fn on_loop_start(&self, provider: ProviderId) {
        self.events.lock().unwrap().push(format!("start:{}", provider));
    }

    fn on_loop_complete(&self, provider: ProviderId, _result: &ProviderResult) {
        self.events.lock().unwrap().push(format!("done:{}", provider));
    }

    fn on_tool_start(&self, provider: ProviderId, tool_name: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("tool:{}:{}", provider, tool_name));
    }
}
