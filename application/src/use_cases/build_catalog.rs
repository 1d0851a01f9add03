//! Build Catalog use case.
//!
//! Enumerates the backend's tools exactly once per session. Any failure,
//! including a listing with duplicate names, is fatal: no partial catalog is
//! ever handed to a provider.

use crate::error::OrchestratorError;
use crate::ports::tool_executor::ToolExecutorPort;
use relay_domain::ToolCatalog;
use std::sync::Arc;
use tracing::{debug, info};

pub struct BuildCatalogUseCase {
    executor: Arc<dyn ToolExecutorPort>,
}

impl BuildCatalogUseCase {
    pub fn new(executor: Arc<dyn ToolExecutorPort>) -> Self {
        Self { executor }
    }

    pub async fn execute(&self) -> Result<ToolCatalog, OrchestratorError> {
        let tools = self
            .executor
            .list_tools()
            .await
            .map_err(|e| OrchestratorError::CatalogUnavailable(e.to_string()))?;

        let catalog = ToolCatalog::new(tools)
            .map_err(|e| OrchestratorError::CatalogUnavailable(e.to_string()))?;

        info!("Tool catalog ready: {} tools", catalog.len());
        debug!("Tools: {}", catalog.names().join(", "));
        Ok(catalog)
    }
}
