//! Shared, read-only tool access for concurrent conversation loops.
//!
//! [`ToolContext`] bundles the session catalog, its per-dialect translations
//! and the backend handle. It is built once and shared behind an `Arc`; no
//! loop can mutate it.

use crate::ports::tool_executor::ToolExecutorPort;
use relay_domain::tool::sanitizer::sanitize_error;
use relay_domain::util::preview;
use relay_domain::{
    DefaultToolValidator, Dialect, ToolCatalog, ToolInvocation, ToolValidator, sanitize,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ToolContext {
    catalog: Arc<ToolCatalog>,
    executor: Arc<dyn ToolExecutorPort>,
    validator: Arc<dyn ToolValidator>,
    schemas: HashMap<Dialect, Arc<[Value]>>,
}

impl ToolContext {
    pub fn new(catalog: Arc<ToolCatalog>, executor: Arc<dyn ToolExecutorPort>) -> Self {
        let schemas = Dialect::all()
            .into_iter()
            .map(|dialect| (dialect, Arc::from(catalog.translate_all(dialect))))
            .collect();
        Self {
            catalog,
            executor,
            validator: Arc::new(DefaultToolValidator),
            schemas,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn ToolValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Tool declarations for `dialect`, in catalog order.
    pub fn schemas_for(&self, dialect: Dialect) -> Arc<[Value]> {
        self.schemas
            .get(&dialect)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Run one tool call and close the invocation.
    ///
    /// Never fails: unknown tools, invalid arguments, backend errors and
    /// tool-reported errors all come back as an `is_error` result the model
    /// can read.
    pub async fn invoke(
        &self,
        invocation: ToolInvocation,
        validate: bool,
        size_limit: usize,
    ) -> ToolInvocation {
        let Some(descriptor) = self.catalog.get(&invocation.tool_name) else {
            warn!("Model requested unknown tool '{}'", invocation.tool_name);
            let message = format!("Unknown tool '{}'", invocation.tool_name);
            return invocation.close(sanitize_error(&message, size_limit), true);
        };

        if validate && let Err(reason) = self.validator.validate(descriptor, &invocation.arguments)
        {
            debug!("Rejected call to '{}': {}", invocation.tool_name, reason);
            let message = format!("Invalid arguments: {}", reason);
            return invocation.close(sanitize_error(&message, size_limit), true);
        }

        debug!(
            "Invoking tool '{}' with {}",
            invocation.tool_name,
            preview(&invocation.arguments.to_string(), 120)
        );

        match self
            .executor
            .invoke(&invocation.tool_name, &invocation.arguments)
            .await
        {
            Ok(output) => {
                let content = sanitize(&output.content, size_limit);
                invocation.close(content, output.is_error)
            }
            Err(e) => {
                warn!("Tool '{}' failed: {}", invocation.tool_name, e);
                invocation.close(sanitize_error(&e.to_string(), size_limit), true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::tool_executor::ToolExecutorError;
    use crate::use_cases::test_support::{MockToolExecutor, get_count_catalog};
    use relay_domain::RawToolOutput;
    use serde_json::json;

    fn context(executor: Arc<MockToolExecutor>) -> ToolContext {
        ToolContext::new(Arc::new(get_count_catalog()), executor)
    }

    #[test]
    fn test_schemas_precomputed_per_dialect() {
        let ctx = context(Arc::new(MockToolExecutor::new()));
        assert_eq!(ctx.schemas_for(Dialect::Claude)[0]["name"], "get_count");
        assert_eq!(
            ctx.schemas_for(Dialect::OpenAi)[0]["function"]["name"],
            "get_count"
        );
        assert_eq!(ctx.schemas_for(Dialect::Gemini).len(), 2);
    }

    #[tokio::test]
    async fn test_success_is_sanitized() {
        let executor = Arc::new(MockToolExecutor::new());
        executor.script("get_count", Ok(RawToolOutput::success(json!({ "count": 42 }))));
        let ctx = context(executor.clone());

        let closed = ctx
            .invoke(ToolInvocation::open("c1", "get_count", json!({ "days": 3 })), true, 1_000)
            .await;
        assert!(!closed.is_error());
        assert!(closed.result_text().contains("\"count\": 42"));
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_without_invoking() {
        let executor = Arc::new(MockToolExecutor::new());
        let ctx = context(executor.clone());
        let closed = ctx
            .invoke(ToolInvocation::open("c1", "drop_tables", json!({})), true, 1_000)
            .await;
        assert!(closed.is_error());
        assert_eq!(closed.result_text(), "Tool execution error: Unknown tool 'drop_tables'");
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected_before_backend() {
        let executor = Arc::new(MockToolExecutor::new());
        let ctx = context(executor.clone());
        let closed = ctx
            .invoke(ToolInvocation::open("c1", "get_count", json!({})), true, 1_000)
            .await;
        assert!(closed.is_error());
        assert!(closed.result_text().contains("Missing required parameter 'days'"));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_validation_can_be_disabled() {
        let executor = Arc::new(MockToolExecutor::new());
        let ctx = context(executor.clone());
        let closed = ctx
            .invoke(ToolInvocation::open("c1", "get_count", json!({})), false, 1_000)
            .await;
        assert!(!closed.is_error());
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_error_result() {
        let executor = Arc::new(MockToolExecutor::new());
        executor.script("get_count", Err(ToolExecutorError::Timeout(30)));
        let ctx = context(executor);
        let closed = ctx
            .invoke(ToolInvocation::open("c1", "get_count", json!({ "days": 1 })), true, 1_000)
            .await;
        assert!(closed.is_error());
        assert_eq!(
            closed.result_text(),
            "Tool execution error: Tool call timed out after 30s"
        );
    }

    #[tokio::test]
    async fn test_tool_reported_error_is_flagged() {
        let executor = Arc::new(MockToolExecutor::new());
        executor.script("get_count", Ok(RawToolOutput::error("table missing")));
        let ctx = context(executor);
        let closed = ctx
            .invoke(ToolInvocation::open("c1", "get_count", json!({ "days": 1 })), true, 1_000)
            .await;
        assert!(closed.is_error());
        assert_eq!(closed.result_text(), "table missing");
    }
}
