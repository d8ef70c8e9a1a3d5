//! Trace MCP tools
//!
//! Traces are looked up through the OpenTelemetry service component that
//! produced them: the component's `service.name` and `service.namespace`
//! tags become span attribute filters.

use super::metrics::ComponentParams;
use super::{into_result, parse_args, to_json, SharedApi};
use crate::clients::types::{
    ServiceAttributes, SpanAttributeFilter, TraceQueryRequest, TracesRequestBody,
};
use crate::error::ToolError;
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// STQL selection of all OpenTelemetry service components.
pub const OTEL_SERVICES_QUERY: &str =
    r#"(label IN ("stackpack:open-telemetry") AND type IN ("otel service"))"#;

/// Traces returned per listing.
pub const TRACE_PAGE_SIZE: u32 = 20;

/// Tool to list recent trace IDs of a service component.
pub struct ListTracesTool {
    client: SharedApi,
}

impl ListTracesTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, component_id: i64) -> Result<String, ToolError> {
        let services = self
            .client
            .snapshot_topology_query(OTEL_SERVICES_QUERY, None)
            .await?;
        let component = services
            .iter()
            .find(|c| c.id == component_id)
            .ok_or_else(|| ToolError::NotFound(format!("Component {} not found", component_id)))?;

        let service = (
            component.tag("service.name"),
            component.tag("service.namespace"),
        );
        let (name, namespace) = match service {
            (Some(name), Some(namespace)) if !name.is_empty() && !namespace.is_empty() => {
                (name, namespace)
            }
            _ => {
                return Err(ToolError::NotFound(format!(
                    "Component {} has no service name and namespace defined",
                    component_id
                )))
            }
        };
        debug!("Listing traces of service {}/{}", namespace, name);

        let end = Utc::now();
        let start = end - Duration::hours(1);
        let request = TraceQueryRequest {
            start_ms: start.timestamp_millis(),
            end_ms: end.timestamp_millis(),
            page: 0,
            page_size: TRACE_PAGE_SIZE,
            body: TracesRequestBody {
                primary_span_filter: SpanAttributeFilter {
                    attributes: ServiceAttributes {
                        service_name: vec![name.to_string()],
                        service_namespace: vec![namespace.to_string()],
                    },
                },
                ..Default::default()
            },
        };

        let response = self.client.query_traces(&request).await?;
        let ids: Vec<&str> = response.traces.iter().map(|t| t.trace_id.as_str()).collect();
        to_json(&ids)
    }
}

#[async_trait]
impl Tool for ListTracesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "listTraces",
            "List the IDs of traces recorded in the last hour for an OpenTelemetry service \
             component",
        )
        .with_category("traces")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "component_id": {
                    "type": "integer",
                    "description": "The ID of the component to list bound traces for"
                }
            },
            "required": ["component_id"]
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "listTraces", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ComponentParams = parse_args(args)?;
        Ok(into_result("list traces", self.run(params.component_id).await))
    }
}

/// Tool to fetch a trace with all its spans.
pub struct GetTraceTool {
    client: SharedApi,
}

impl GetTraceTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, trace_id: &str) -> Result<String, ToolError> {
        let trace = self.client.get_trace(trace_id).await?;
        to_json(&trace)
    }
}

#[async_trait]
impl Tool for GetTraceTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("getTrace", "Get a trace with all its spans")
            .with_category("traces")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "trace_id": {
                        "type": "string",
                        "description": "The ID of the trace to retrieve and inspect"
                    }
                },
                "required": ["trace_id"]
            }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "getTrace", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: GetTraceParams = parse_args(args)?;
        Ok(into_result("get trace", self.run(&params.trace_id).await))
    }
}

#[derive(Debug, Deserialize)]
struct GetTraceParams {
    trace_id: String,
}

/// Tool to fetch a single span of a trace.
pub struct GetTraceSpanTool {
    client: SharedApi,
}

impl GetTraceSpanTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, params: &GetTraceSpanParams) -> Result<String, ToolError> {
        let span = self
            .client
            .get_trace_span(&params.trace_id, &params.span_id)
            .await?;
        to_json(&span)
    }
}

#[async_trait]
impl Tool for GetTraceSpanTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "getTraceSpan",
            "Get a single span of a trace with its attributes, events and links",
        )
        .with_category("traces")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "trace_id": {
                    "type": "string",
                    "description": "The ID of the trace the span belongs to"
                },
                "span_id": {
                    "type": "string",
                    "description": "The ID of the span to retrieve"
                }
            },
            "required": ["trace_id", "span_id"]
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "getTraceSpan", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: GetTraceSpanParams = parse_args(args)?;
        Ok(into_result("get trace span", self.run(&params).await))
    }
}

#[derive(Debug, Deserialize)]
struct GetTraceSpanParams {
    trace_id: String,
    span_id: String,
}

/// Get all trace tools.
pub fn traces_tools(client: SharedApi) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListTracesTool::new(client.clone())),
        Arc::new(GetTraceTool::new(client.clone())),
        Arc::new(GetTraceSpanTool::new(client)),
    ]
}
