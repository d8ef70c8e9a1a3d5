//! # SUSE Observability MCP
//!
//! This crate provides an MCP (Model Context Protocol) server that lets AI
//! assistants explore a SUSE Observability installation: topology
//! components, metrics, monitors, traces and events.
//!
//! ## Overview
//!
//! The suse-observability-mcp crate handles:
//! - **Query building**: comma-separated filter arguments compiled into STQL
//! - **Metric normalization**: Prometheus-style results decoded into series
//! - **Presentation**: Markdown tables and ASCII charts for LLM consumption
//! - **JSON-RPC**: MCP protocol over stdio or HTTP
//! - **Client**: HTTP client for the SUSE Observability API
//!
//! ## MCP Protocol
//!
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `ping`: Liveness check
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//!
//! Notifications are accepted and never answered.
//!
//! ## Available Tools
//!
//! ### Topology
//! - `getComponents`: Search components by name, type, health, layer, domain or namespace
//! - `queryTopology`: Run a raw STQL query, optionally in the past
//!
//! ### Metrics
//! - `listMetrics`: Metrics bound to a component
//! - `listMetricNames`: Metric names, optionally regex-filtered
//! - `queryMetric`: Instant PromQL query as a table
//! - `getMetrics`: Range PromQL query as ASCII charts
//! - `getMetricsTable`: Range PromQL query as a table
//!
//! ### Monitors
//! - `listMonitors`: Monitors of a component
//! - `listAllMonitors`: All monitor definitions
//! - `getMonitorsOverview`: Monitors with their function, errors and runtime metrics
//! - `getMonitorDetails`: One monitor definition
//! - `getMonitorCheckStates`: Check states produced by a monitor
//! - `getMonitorCheckStatus`: One check status with a summary
//!
//! ### Traces
//! - `listTraces`: Recent trace IDs of an OpenTelemetry service component
//! - `getTrace`: A trace with its spans
//! - `getTraceSpan`: A single span of a trace
//!
//! ### Events
//! - `listEvents`: Topology events for an STQL selection
//! - `getEvent`: One event
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use suse_observability_mcp::{
//!     all_tools, McpRequest, McpServer, ObservabilityClient, ServiceConfig,
//! };
//!
//! async fn setup() -> anyhow::Result<()> {
//!     let config = ServiceConfig::from_env();
//!     config.validate()?;
//!     let client = ObservabilityClient::new(&config)?;
//!
//!     let server = McpServer::observability();
//!     server.register_tools(all_tools(Arc::new(client))).await;
//!
//!     let request: McpRequest =
//!         serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)?;
//!     if let Some(response) = server.handle_request(request).await {
//!         println!("{}", serde_json::to_string(&response)?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod clients;
pub mod error;
pub mod format;
pub mod metrics;
pub mod query;
pub mod server;
pub mod time;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export main types
pub use error::ToolError;
pub use server::{McpServer, McpServerError, McpServerResult, Tool, ToolContext};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities, ServerInfo,
    ToolCall, ToolCapabilities, ToolDefinition, ToolResult,
};

// Re-export the building blocks
pub use format::{format_charts, format_metrics_table, ChartOptions};
pub use metrics::{normalize, normalize_response, MetricPoint, MetricSeries};
pub use query::{build_query, ComponentFilter};
pub use time::parse_time;

// Re-export tool collections
pub use tools::{
    all_tools, events_tools, metrics_tools, monitors_tools, topology_tools, traces_tools,
};

// Re-export the API client
pub use clients::{ObservabilityApi, ObservabilityClient, ObservabilityError, ServiceConfig};
