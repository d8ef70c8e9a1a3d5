//! Metrics MCP tools
//!
//! Metric discovery and PromQL queries. Instant and range results are
//! normalized into series and rendered as Markdown tables or ASCII charts.

use super::{into_result, parse_args, SharedApi, DEFAULT_STEP, QUERY_TIMEOUT};
use crate::error::ToolError;
use crate::format::{format_bound_metrics, format_charts, format_metrics_table, ChartOptions};
use crate::metrics::{normalize_response, MetricSeries};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::time::parse_time;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Tool to list the metrics bound to a component.
///
/// Bound metrics are the curated queries SUSE Observability associates
/// with a component type; they are a good starting point for `queryMetric`.
pub struct ListMetricsTool {
    client: SharedApi,
}

impl ListMetricsTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListMetricsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "listMetrics",
            "List the metrics bound to a component with their units and PromQL queries",
        )
        .with_category("metrics")
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
        fields(tool = "listMetrics", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ComponentParams = parse_args(args)?;

        let end = Utc::now();
        let start = end - Duration::hours(1);
        let outcome = self
            .client
            .get_bound_metrics_with_data(params.component_id, start, end)
            .await
            .map(|response| format_bound_metrics(params.component_id, &response))
            .map_err(ToolError::from);

        Ok(into_result("list metrics", outcome))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComponentParams {
    pub(crate) component_id: i64,
}

/// Tool to list metric names, optionally filtered by a regex.
pub struct ListMetricNamesTool {
    client: SharedApi,
}

impl ListMetricNamesTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, params: &ListMetricNamesParams) -> Result<String, ToolError> {
        let filter = params
            .filter
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(Regex::new)
            .transpose()
            .map_err(|e| ToolError::InvalidRegex(e.to_string()))?;

        let end = Utc::now();
        let start = end - Duration::hours(1);
        let names = self.client.list_metric_names(start, end).await?;

        let matching: Vec<String> = names
            .into_iter()
            .filter(|name| filter.as_ref().map_or(true, |re| re.is_match(name)))
            .collect();
        debug!("{} metric names match", matching.len());

        if matching.is_empty() {
            return Ok("No metrics found.".to_string());
        }
        Ok(matching.join(", "))
    }
}

#[async_trait]
impl Tool for ListMetricNamesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "listMetricNames",
            "List the names of metrics with data in the last hour",
        )
        .with_category("metrics")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "filter": {
                    "type": "string",
                    "description": "Optional regex filter to search for specific metrics"
                }
            },
            "required": []
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "listMetricNames", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListMetricNamesParams = parse_args(args)?;
        Ok(into_result("list metric names", self.run(&params).await))
    }
}

#[derive(Debug, Deserialize)]
struct ListMetricNamesParams {
    #[serde(default)]
    filter: Option<String>,
}

/// Tool to run an instant PromQL query.
pub struct QueryMetricTool {
    client: SharedApi,
}

impl QueryMetricTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }

    async fn run(&self, query: &str) -> Result<String, ToolError> {
        let response = self
            .client
            .query_metric(query, Utc::now(), QUERY_TIMEOUT)
            .await?;
        let series = normalize_response(&response)?;
        Ok(format_metrics_table(&series))
    }
}

#[async_trait]
impl Tool for QueryMetricTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "queryMetric",
            "Evaluate a PromQL query at the current time and return the result as a table",
        )
        .with_category("metrics")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The PromQL query to execute"
                }
            },
            "required": ["query"]
        }))
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "queryMetric", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: QueryMetricParams = parse_args(args)?;
        Ok(into_result("query metric", self.run(&params.query).await))
    }
}

#[derive(Debug, Deserialize)]
struct QueryMetricParams {
    query: String,
}

#[derive(Debug, Deserialize)]
struct RangeQueryParams {
    query: String,
    start: String,
    end: String,
    #[serde(default)]
    step: Option<String>,
}

fn range_query_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The PromQL query to execute"
            },
            "start": {
                "type": "string",
                "description": "Start time: 'now' or duration (e.g. '1h')"
            },
            "end": {
                "type": "string",
                "description": "End time: 'now' or duration (e.g. '1h')"
            },
            "step": {
                "type": "string",
                "description": "Query resolution step width in duration format or float number of seconds",
                "default": DEFAULT_STEP
            }
        },
        "required": ["query", "start", "end"]
    })
}

/// Run a range query and normalize its series.
async fn range_query(
    client: &SharedApi,
    params: &RangeQueryParams,
) -> Result<Vec<MetricSeries>, ToolError> {
    let start = parse_time(&params.start)?;
    let end = parse_time(&params.end)?;
    let step = params
        .step
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_STEP);

    let response = client
        .query_range_metric(&params.query, start, end, step, QUERY_TIMEOUT)
        .await?;
    normalize_response(&response)
}

/// Tool to chart a PromQL query over a time range.
pub struct GetMetricsTool {
    client: SharedApi,
}

impl GetMetricsTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetMetricsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "getMetrics",
            "Query a metric over a time range and draw one ASCII chart per series",
        )
        .with_category("metrics")
        .with_schema(range_query_schema())
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "getMetrics", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: RangeQueryParams = parse_args(args)?;
        let outcome = range_query(&self.client, &params)
            .await
            .map(|series| format_charts(&series, ChartOptions::default()));
        Ok(into_result("query range metric", outcome))
    }
}

/// Tool to tabulate a PromQL query over a time range.
pub struct GetMetricsTableTool {
    client: SharedApi,
}

impl GetMetricsTableTool {
    pub fn new(client: SharedApi) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetMetricsTableTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "getMetricsTable",
            "Query a metric over a time range and return every sample as a table row",
        )
        .with_category("metrics")
        .with_schema(range_query_schema())
    }

    #[instrument(
        skip(self, args, context),
        fields(tool = "getMetricsTable", request_id = ?context.request_id)
    )]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: RangeQueryParams = parse_args(args)?;
        let outcome = range_query(&self.client, &params)
            .await
            .map(|series| format_metrics_table(&series));
        Ok(into_result("query range metric", outcome))
    }
}

/// Get all metrics tools.
pub fn metrics_tools(client: SharedApi) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListMetricsTool::new(client.clone())),
        Arc::new(ListMetricNamesTool::new(client.clone())),
        Arc::new(QueryMetricTool::new(client.clone())),
        Arc::new(GetMetricsTool::new(client.clone())),
        Arc::new(GetMetricsTableTool::new(client)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::types::{BoundMetric, BoundMetricsResponse, BoundQuery, MetricQueryResponse};
    use crate::server::McpServerError;
    use crate::tools::mock::MockApi;
    use serde_json::json;

    fn ctx() -> ToolContext {
        ToolContext::empty()
    }

    fn response(data: serde_json::Value) -> MetricQueryResponse {
        serde_json::from_value(json!({"status": "success", "data": data})).unwrap()
    }

    fn matrix() -> MetricQueryResponse {
        response(json!({
            "resultType": "matrix",
            "result": [{
                "metric": {"__name__": "cpu_usage", "pod": "web-1"},
                "values": [[1700000000, "1"], [1700000060, "2"], [1700000120, "3"]]
            }]
        }))
    }

    #[test]
    fn test_all_metrics_tools() {
        let tools = metrics_tools(Arc::new(MockApi::default()));
        let names: Vec<_> = tools.iter().map(|t| t.definition().name).collect();
        assert_eq!(
            names,
            vec!["listMetrics", "listMetricNames", "queryMetric", "getMetrics", "getMetricsTable"]
        );
    }

    #[tokio::test]
    async fn test_list_metrics() {
        let mock = Arc::new(MockApi {
            bound_metrics: BoundMetricsResponse {
                bound_metrics: vec![BoundMetric {
                    name: "cpu_usage".to_string(),
                    unit: "percent".to_string(),
                    bound_queries: vec![BoundQuery {
                        expression: "avg(cpu_usage)".to_string(),
                        alias: String::new(),
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        });
        let tool = ListMetricsTool::new(mock.clone());

        let result = tool.execute(json!({"component_id": 123}), &ctx()).await.unwrap();

        assert!(!result.is_error);
        assert!(result.text_content().contains("| cpu_usage | percent | avg(cpu_usage) |"));
        assert_eq!(mock.calls(), vec!["get_bound_metrics_with_data: 123 span=3600s"]);
    }

    #[tokio::test]
    async fn test_list_metrics_requires_component_id() {
        let tool = ListMetricsTool::new(Arc::new(MockApi::default()));
        let result = tool.execute(json!({}), &ctx()).await;
        assert!(matches!(result, Err(McpServerError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_list_metric_names_filtered() {
        let mock = Arc::new(MockApi {
            metric_names: vec![
                "cpu_usage".to_string(),
                "memory_usage".to_string(),
                "cpu_throttled".to_string(),
            ],
            ..Default::default()
        });
        let tool = ListMetricNamesTool::new(mock);

        let all = tool.execute(json!({}), &ctx()).await.unwrap();
        assert_eq!(all.text_content(), "cpu_usage, memory_usage, cpu_throttled");

        let cpu = tool.execute(json!({"filter": "^cpu_"}), &ctx()).await.unwrap();
        assert_eq!(cpu.text_content(), "cpu_usage, cpu_throttled");

        let none = tool.execute(json!({"filter": "^disk"}), &ctx()).await.unwrap();
        assert_eq!(none.text_content(), "No metrics found.");
    }

    #[tokio::test]
    async fn test_list_metric_names_invalid_regex() {
        let mock = Arc::new(MockApi::default());
        let tool = ListMetricNamesTool::new(mock.clone());
        let result = tool.execute(json!({"filter": "(unclosed"}), &ctx()).await.unwrap();
        assert!(result.is_error);
        assert!(result.text_content().contains("invalid regex filter"));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_metric() {
        let mock = Arc::new(MockApi {
            metric_response: response(json!({
                "resultType": "vector",
                "result": [{
                    "metric": {"__name__": "up", "job": "api"},
                    "value": [1700000000, "1"]
                }]
            })),
            ..Default::default()
        });
        let tool = QueryMetricTool::new(mock.clone());

        let result = tool.execute(json!({"query": "up"}), &ctx()).await.unwrap();

        assert!(!result.is_error);
        let text = result.text_content();
        assert!(text.contains("| Timestamp | Value | job |"));
        assert!(text.contains("| 2023-11-14T22:13:20.000Z | 1 | api |"));
        assert_eq!(mock.calls(), vec!["query_metric: up timeout=30s"]);
    }

    #[tokio::test]
    async fn test_query_metric_empty_vector() {
        let mock = Arc::new(MockApi {
            metric_response: response(json!({"resultType": "vector", "result": []})),
            ..Default::default()
        });
        let tool = QueryMetricTool::new(mock);
        let result = tool.execute(json!({"query": "absent"}), &ctx()).await.unwrap();
        assert_eq!(result.text_content(), "No data found.");
    }

    #[tokio::test]
    async fn test_query_metric_unsupported_type() {
        let mock = Arc::new(MockApi {
            metric_response: response(json!({"resultType": "histogram", "result": []})),
            ..Default::default()
        });
        let tool = QueryMetricTool::new(mock);
        let result = tool.execute(json!({"query": "x"}), &ctx()).await.unwrap();
        assert!(result.is_error);
        assert!(result.text_content().contains("unsupported metric result type: histogram"));
    }

    #[tokio::test]
    async fn test_query_metric_upstream_failure() {
        let tool = QueryMetricTool::new(Arc::new(MockApi::failing()));
        let result = tool.execute(json!({"query": "up"}), &ctx()).await.unwrap();
        assert!(result.is_error);
        assert_eq!(result.text_content(), "Failed to query metric: API error (500): boom");
    }

    #[tokio::test]
    async fn test_get_metrics_chart() {
        let mock = Arc::new(MockApi {
            metric_response: matrix(),
            ..Default::default()
        });
        let tool = GetMetricsTool::new(mock.clone());

        let result = tool
            .execute(json!({"query": "cpu_usage", "start": "1h", "end": "now"}), &ctx())
            .await
            .unwrap();

        assert!(!result.is_error);
        let text = result.text_content();
        assert!(text.contains(" Metrics "));
        assert!(text.contains("│ cpu_usage │"));
        assert_eq!(text.matches('•').count(), 3);
        assert_eq!(
            mock.calls(),
            vec!["query_range_metric: cpu_usage step=1m timeout=30s span=3600s"]
        );
    }

    #[tokio::test]
    async fn test_get_metrics_table_with_step() {
        let mock = Arc::new(MockApi {
            metric_response: matrix(),
            ..Default::default()
        });
        let tool = GetMetricsTableTool::new(mock.clone());

        let result = tool
            .execute(
                json!({"query": "cpu_usage", "start": "30m", "end": "now", "step": "5m"}),
                &ctx(),
            )
            .await
            .unwrap();

        assert!(!result.is_error);
        let text = result.text_content();
        assert!(text.contains("| Timestamp | Value | pod |"));
        assert_eq!(text.lines().count(), 5);
        assert_eq!(
            mock.calls(),
            vec!["query_range_metric: cpu_usage step=5m timeout=30s span=1800s"]
        );
    }

    #[tokio::test]
    async fn test_get_metrics_invalid_time() {
        let mock = Arc::new(MockApi::default());
        let tool = GetMetricsTool::new(mock.clone());

        let result = tool
            .execute(json!({"query": "up", "start": "yesterday", "end": "now"}), &ctx())
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.text_content().contains("invalid time format: yesterday"));
        assert!(mock.calls().is_empty());
    }
}
