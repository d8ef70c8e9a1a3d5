//! Event MCP tools
//!
//! Topology events (changes, deployments, health transitions) for a
//! selection of components over a relative time window.

use super::{into_result, parse_args, to_json, SharedApi};
use crate::clients::types::EventListRequest;
use crate::error::ToolError;
use crate::format::format_events;
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::time::parse_time;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

/// Events returned when no limit is given.
pub const DEFAULT_EVENT_LIMIT: u32 = 50;

fn default_start() -> String {
    "1h".to_string()
}

fn default_end() -> String {
    "now".to_string()
}

fn default_limit() -> u32 {
    DEFAULT_EVENT_LIMIT
}

/// Tool to list events of the components matched by an STQL query.
pub struct ListEventsTool {
    client: SharedApi,
}

impl ListEventsTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, params: ListEventsParams) -> Result<String, ToolError> {
        let start = parse_time(&params.start)?;
        let end = parse_time(&params.end)?;

        let request = EventListRequest {
            start_timestamp_ms: start.timestamp_millis(),
            end_timestamp_ms: end.timestamp_millis(),
            topology_query: params.topology_query,
            limit: params.limit,
            include_connected_components: params.include_connected_components,
            event_types: params.event_types,
            event_categories: params.event_categories,
        };

        let events = self.client.get_events(&request).await?;
        Ok(format_events(&events))
    }
}

#[async_trait]
impl Tool for ListEventsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "listEvents",
            "List topology events (changes, deployments, health changes) for the components \
             matching an STQL query",
        )
        .with_category("events")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "topology_query": {
                    "type": "string",
                    "description": "STQL query selecting the components (e.g. 'name IN (\"checkout\")')"
                },
                "start": {
                    "type": "string",
                    "description": "Start time: 'now' or duration (e.g. '1h')",
                    "default": "1h"
                },
                "end": {
                    "type": "string",
                    "description": "End time: 'now' or duration (e.g. '1h')",
                    "default": "now"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of events to return",
                    "default": DEFAULT_EVENT_LIMIT
                },
                "include_connected_components": {
                    "type": "boolean",
                    "description": "Also include events of connected components",
                    "default": false
                },
                "event_types": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Only return events of these types"
                },
                "event_categories": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Only return events in these categories (e.g. 'Changes', 'Alerts')"
                }
            },
            "required": ["topology_query"]
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "listEvents", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListEventsParams = parse_args(args)?;
        Ok(into_result("list events", self.run(params).await))
    }
}

#[derive(Debug, Deserialize)]
struct ListEventsParams {
    topology_query: String,
    #[serde(default = "default_start")]
    start: String,
    #[serde(default = "default_end")]
    end: String,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    include_connected_components: bool,
    #[serde(default)]
    event_types: Vec<String>,
    #[serde(default)]
    event_categories: Vec<String>,
}

/// Tool to fetch a single event.
pub struct GetEventTool {
    client: SharedApi,
}

impl GetEventTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, params: &GetEventParams) -> Result<String, ToolError> {
        let start = parse_time(&params.start)?;
        let end = parse_time(&params.end)?;
        let event = self
            .client
            .get_event(&params.event_id, start.timestamp_millis(), end.timestamp_millis())
            .await?;
        to_json(&event)
    }
}

#[async_trait]
impl Tool for GetEventTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("getEvent", "Get a single topology event with its full payload")
            .with_category("events")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "event_id": {
                        "type": "string",
                        "description": "The event identifier (see listEvents)"
                    },
                    "start": {
                        "type": "string",
                        "description": "Start of the window the event falls in: 'now' or duration",
                        "default": "1h"
                    },
                    "end": {
                        "type": "string",
                        "description": "End of the window: 'now' or duration",
                        "default": "now"
                    }
                },
                "required": ["event_id"]
            }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "getEvent", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: GetEventParams = parse_args(args)?;
        Ok(into_result("get event", self.run(&params).await))
    }
}

#[derive(Debug, Deserialize)]
struct GetEventParams {
    event_id: String,
    #[serde(default = "default_start")]
    start: String,
    #[serde(default = "default_end")]
    end: String,
}

/// Get all event tools.
pub fn events_tools(client: SharedApi) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListEventsTool::new(client.clone())),
        Arc::new(GetEventTool::new(client)),
    ]
}
