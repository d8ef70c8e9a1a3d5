//! Topology MCP tools
//!
//! Component search over the SUSE Observability topology. Filter arguments
//! are compiled into an STQL expression and run as a view snapshot; raw
//! STQL can be run directly with `queryTopology`.

use super::{into_result, parse_args, SharedApi};
use crate::error::ToolError;
use crate::format::{format_components, Component};
use crate::query::{build_query, ComponentFilter};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::time::parse_time;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Tool to search topology components.
///
/// Every filter accepts a comma-separated list; fields are combined with
/// `AND` and can be widened to connected components.
pub struct GetComponentsTool {
    client: SharedApi,
}

impl GetComponentsTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, filter: &ComponentFilter) -> Result<String, ToolError> {
        let query = build_query(filter)?;
        debug!("Topology query: {}", query);

        let components: Vec<Component> = self
            .client
            .snapshot_topology_query(&query, None)
            .await?
            .iter()
            .map(Component::from)
            .collect();

        Ok(format_components(&components, filter, &query))
    }
}

#[async_trait]
impl Tool for GetComponentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "getComponents",
            "Search topology components by name, type, health state, layer, domain or namespace. \
             Returns a table with component names, IDs and health states; use the IDs with the \
             metric, monitor and trace tools.",
        )
        .with_category("topology")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "names": {
                    "type": "string",
                    "description": "Comma-separated component names (e.g. 'checkout,cart')"
                },
                "types": {
                    "type": "string",
                    "description": "Comma-separated component types (e.g. 'pod,service,deployment')"
                },
                "healthstates": {
                    "type": "string",
                    "description": "Comma-separated health states (CLEAR, DEVIATING, CRITICAL, UNKNOWN)"
                },
                "layers": {
                    "type": "string",
                    "description": "Comma-separated layers (e.g. 'Services,Containers')"
                },
                "domains": {
                    "type": "string",
                    "description": "Comma-separated domains; for Kubernetes this is the cluster name"
                },
                "namespace": {
                    "type": "string",
                    "description": "Comma-separated Kubernetes namespaces"
                },
                "with_neighbors": {
                    "type": "boolean",
                    "description": "Also return components connected to the matches",
                    "default": false
                },
                "with_neighbors_levels": {
                    "type": "string",
                    "description": "Neighbor depth: 1-14 or 'all'",
                    "default": "1"
                },
                "with_neighbors_direction": {
                    "type": "string",
                    "enum": ["up", "down", "both"],
                    "description": "Follow dependencies (down), dependents (up) or both",
                    "default": "both"
                }
            },
            "required": []
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "getComponents", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let filter: ComponentFilter = parse_args(args)?;
        Ok(into_result("get components", self.run(&filter).await))
    }
}

/// Tool to run a raw STQL query, optionally at a point in the past.
pub struct QueryTopologyTool {
    client: SharedApi,
}

impl QueryTopologyTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, params: &QueryTopologyParams) -> Result<String, ToolError> {
        let query = params.query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidFilter);
        }
        let at = params.time.as_deref().map(parse_time).transpose()?;

        let components: Vec<Component> = self
            .client
            .snapshot_topology_query(query, at)
            .await?
            .iter()
            .map(Component::from)
            .collect();

        Ok(format_components(&components, &ComponentFilter::default(), query))
    }
}

#[async_trait]
impl Tool for QueryTopologyTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "queryTopology",
            "Run an STQL topology query (e.g. 'type IN (\"pod\") AND healthstate IN \
             (\"CRITICAL\")') and return the matching components",
        )
        .with_category("topology")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The STQL query to execute"
                },
                "time": {
                    "type": "string",
                    "description": "Optional time to run the query at: 'now' or duration ago (e.g. '1h')"
                }
            },
            "required": ["query"]
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "queryTopology", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: QueryTopologyParams = parse_args(args)?;
        Ok(into_result("query topology", self.run(&params).await))
    }
}

#[derive(Debug, Deserialize)]
struct QueryTopologyParams {
    query: String,
    #[serde(default)]
    time: Option<String>,
}

/// Get all topology tools.
pub fn topology_tools(client: SharedApi) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetComponentsTool::new(client.clone())),
        Arc::new(QueryTopologyTool::new(client)),
    ]
}
