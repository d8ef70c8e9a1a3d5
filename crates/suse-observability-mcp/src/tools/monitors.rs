//! Monitor MCP tools
//!
//! Monitors attached to a component, monitor definitions, and the check
//! states and check statuses monitors produce.

use super::metrics::ComponentParams;
use super::{into_result, parse_args, to_json, SharedApi};
use crate::error::ToolError;
use crate::format::{format_component_monitors, format_timestamp};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

/// Tool to list the monitors of a component.
pub struct ListMonitorsTool {
    client: SharedApi,
}

impl ListMonitorsTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListMonitorsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "listMonitors",
            "List the monitors of a component with their health, remediation hints and queries",
        )
        .with_category("monitors")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "component_id": {
                    "type": "integer",
                    "description": "The ID of the component (see getComponents)"
                }
            },
            "required": ["component_id"]
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "listMonitors", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ComponentParams = parse_args(args)?;
        let outcome = self
            .client
            .get_component(params.component_id)
            .await
            .map(|response| format_component_monitors(&response.node))
            .map_err(ToolError::from);
        Ok(into_result("list monitors", outcome))
    }
}

/// Tool to list every monitor definition.
pub struct ListAllMonitorsTool {
    client: SharedApi,
}

impl ListAllMonitorsTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self) -> Result<String, ToolError> {
        let monitors = self.client.get_monitors().await?;
        to_json(&monitors)
    }
}

#[async_trait]
impl Tool for ListAllMonitorsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("listAllMonitors", "List all monitor definitions")
            .with_category("monitors")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }))
    }

    #[instrument(
        skip(self, _args, context),
        fields(tool = "listAllMonitors", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        _args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        Ok(into_result("list monitors", self.run().await))
    }
}

/// Tool to list monitors with their function, errors and runtime metrics.
pub struct GetMonitorsOverviewTool {
    client: SharedApi,
}

impl GetMonitorsOverviewTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self) -> Result<String, ToolError> {
        let overview = self.client.get_monitors_overview().await?;
        to_json(&overview)
    }
}

#[async_trait]
impl Tool for GetMonitorsOverviewTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "getMonitorsOverview",
            "List all monitors with their function, recent errors and health state counts",
        )
        .with_category("monitors")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }))
    }

    #[instrument(
        skip(self, _args, context),
        fields(tool = "getMonitorsOverview", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        _args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        Ok(into_result("get monitors overview", self.run().await))
    }
}

/// Tool to show one monitor definition.
pub struct GetMonitorDetailsTool {
    client: SharedApi,
}

impl GetMonitorDetailsTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, id_or_urn: &str) -> Result<String, ToolError> {
        let monitor = self.client.get_monitor(id_or_urn).await?;
        to_json(&monitor)
    }
}

#[async_trait]
impl Tool for GetMonitorDetailsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("getMonitorDetails", "Get a monitor definition by ID or URN")
            .with_category("monitors")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "monitorIdOrUrn": {
                        "type": "string",
                        "description": "The monitor identifier (ID or URN)"
                    }
                },
                "required": ["monitorIdOrUrn"]
            }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "getMonitorDetails", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: MonitorParams = parse_args(args)?;
        Ok(into_result(
            "get monitor details",
            self.run(&params.monitor_id_or_urn).await,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonitorParams {
    monitor_id_or_urn: String,
}

/// Tool to list the check states a monitor produced.
pub struct GetMonitorCheckStatesTool {
    client: SharedApi,
}

impl GetMonitorCheckStatesTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, params: &CheckStatesParams) -> Result<String, ToolError> {
        let states = self
            .client
            .get_monitor_check_states(
                &params.monitor_id_or_urn,
                params.health_state.as_deref(),
                params.limit,
                params.timestamp,
            )
            .await?;
        to_json(&states)
    }
}

#[async_trait]
impl Tool for GetMonitorCheckStatesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "getMonitorCheckStates",
            "List the check states a monitor generated, optionally filtered by health state",
        )
        .with_category("monitors")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "monitorIdOrUrn": {
                    "type": "string",
                    "description": "The monitor identifier (ID or URN)"
                },
                "healthState": {
                    "type": "string",
                    "description": "Filter by health state (e.g., CRITICAL, DEVIATING, CLEAR, UNKNOWN)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of states to return"
                },
                "timestamp": {
                    "type": "integer",
                    "description": "Timestamp for the query in milliseconds"
                }
            },
            "required": ["monitorIdOrUrn"]
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "getMonitorCheckStates", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: CheckStatesParams = parse_args(args)?;
        Ok(into_result(
            "get monitor check states",
            self.run(&params).await,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckStatesParams {
    monitor_id_or_urn: String,
    #[serde(default)]
    health_state: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Tool to explain one check status.
///
/// Prefixes the raw status with a short summary of which monitor fired,
/// when, and why.
pub struct GetMonitorCheckStatusTool {
    client: SharedApi,
}

impl GetMonitorCheckStatusTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, params: &CheckStatusParams) -> Result<String, ToolError> {
        let status = self
            .client
            .get_monitor_check_status(params.check_status_id, params.topology_time)
            .await?;

        let summary = format!(
            "Check Status for Monitor '{}' (Health: {})\nTriggered at: {}\nMessage: {}",
            status.monitor_name,
            status.health,
            format_timestamp(status.triggered_timestamp),
            status.message
        );
        Ok(format!("{}\n\n{}", summary, to_json(&status)?))
    }
}

#[async_trait]
impl Tool for GetMonitorCheckStatusTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "getMonitorCheckStatus",
            "Get a monitor check status with the monitor name, health, trigger time and message",
        )
        .with_category("monitors")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "checkStatusId": {
                    "type": "integer",
                    "description": "The check status ID"
                },
                "topologyTime": {
                    "type": "integer",
                    "description": "Timestamp for topology query in milliseconds"
                }
            },
            "required": ["checkStatusId"]
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "getMonitorCheckStatus", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: CheckStatusParams = parse_args(args)?;
        Ok(into_result(
            "get monitor check status",
            self.run(&params).await,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckStatusParams {
    check_status_id: i64,
    #[serde(default)]
    topology_time: Option<i64>,
}

/// Get all monitor tools.
pub fn monitors_tools(client: SharedApi) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListMonitorsTool::new(client.clone())),
        Arc::new(ListAllMonitorsTool::new(client.clone())),
        Arc::new(GetMonitorsOverviewTool::new(client.clone())),
        Arc::new(GetMonitorDetailsTool::new(client.clone())),
        Arc::new(GetMonitorCheckStatesTool::new(client.clone())),
        Arc::new(GetMonitorCheckStatusTool::new(client)),
    ]
}
