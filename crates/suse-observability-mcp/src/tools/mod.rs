//! SUSE Observability MCP tools
//!
//! Each tool holds a shared handle to the API client and turns one MCP
//! `tools/call` into one or two upstream requests plus formatting:
//! - `topology`: component search with STQL filters
//! - `metrics`: metric discovery, instant/range queries, tables and charts
//! - `monitors`: component monitors and monitor definitions/check states
//! - `traces`: OpenTelemetry traces of a service component
//! - `events`: topology events

pub mod events;
pub mod metrics;
pub mod monitors;
pub mod topology;
pub mod traces;

#[cfg(test)]
pub(crate) mod mock;

pub use events::*;
pub use metrics::*;
pub use monitors::*;
pub use topology::*;
pub use traces::*;

use crate::clients::{ObservabilityApi, ObservabilityError};
use crate::error::ToolError;
use crate::server::{McpServerError, McpServerResult, Tool};
use crate::types::ToolResult;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::error;

/// PromQL evaluation timeout passed to every metric query.
pub const QUERY_TIMEOUT: &str = "30s";

/// Range query resolution when none is given.
pub const DEFAULT_STEP: &str = "1m";

/// Shared client handle held by every tool.
pub type SharedApi = Arc<dyn ObservabilityApi>;

/// Decode tool arguments into a parameter struct.
pub(crate) fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> McpServerResult<T> {
    serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))
}

/// Turn a tool outcome into an MCP result; failures become `isError` results.
pub(crate) fn into_result(action: &str, outcome: Result<String, ToolError>) -> ToolResult {
    match outcome {
        Ok(text) => ToolResult::text(text),
        Err(e) => {
            error!("Failed to {}: {}", action, e);
            ToolResult::error(format!("Failed to {}: {}", action, e))
        }
    }
}

/// Pretty JSON text of an upstream payload.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ObservabilityError::InvalidResponse(e.to_string()).into())
}

/// Get all available MCP tools, bound to one client.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use suse_observability_mcp::clients::{ObservabilityClient, ServiceConfig};
/// use suse_observability_mcp::tools::all_tools;
///
/// let client = ObservabilityClient::new(&ServiceConfig::from_env()).unwrap();
/// let tools = all_tools(Arc::new(client));
/// println!("Available tools: {}", tools.len());
/// ```
pub fn all_tools(client: SharedApi) -> Vec<Arc<dyn Tool>> {
    let mut tools = Vec::new();

    // Topology (2)
    tools.extend(topology_tools(client.clone()));

    // Metrics (5)
    tools.extend(metrics_tools(client.clone()));

    // Monitors (6)
    tools.extend(monitors_tools(client.clone()));

    // Traces (3)
    tools.extend(traces_tools(client.clone()));

    // Events (2)
    tools.extend(events_tools(client));

    tools
}

#[cfg(test)]
mod tests {
    use super::mock::MockApi;
    use super::*;

    fn client() -> SharedApi {
        Arc::new(MockApi::default())
    }

    #[test]
    fn test_all_tools_count() {
        let tools = all_tools(client());
        // 2 topology + 5 metrics + 6 monitors + 3 traces + 2 events
        assert_eq!(tools.len(), 18, "Expected 18 total tools");
    }

    #[test]
    fn test_all_tools_unique_names() {
        let tools = all_tools(client());
        let mut names = std::collections::HashSet::new();

        for tool in tools {
            let def = tool.definition();
            assert!(
                names.insert(def.name.clone()),
                "Duplicate tool name: {}",
                def.name
            );
        }
    }

    #[test]
    fn test_all_tools_have_object_schema() {
        for tool in all_tools(client()) {
            let def = tool.definition();
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            assert!(def.category.is_some(), "{} has no category", def.name);
        }
    }

    #[test]
    fn test_into_result() {
        let ok = into_result("do it", Ok("done".to_string()));
        assert!(!ok.is_error);

        let err = into_result("query metric", Err(ToolError::InvalidFilter));
        assert!(err.is_error);
        assert!(err
            .text_content()
            .starts_with("Failed to query metric: at least one filter"));
    }
}
