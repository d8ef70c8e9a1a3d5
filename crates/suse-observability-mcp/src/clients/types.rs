//! SUSE Observability API data transfer objects.
//!
//! Field names follow the upstream JSON (camelCase). Timestamp units are
//! noted per field since the API is not consistent about them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upstream error message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMsg {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub error_code: i64,
}

/// Error body returned by several endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResp {
    #[serde(default)]
    pub errors: Vec<ErrorMsg>,
}

/// `GET /api/server/info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(default)]
    pub version: ServerVersion,

    #[serde(default)]
    pub deployment_mode: String,
}

/// Platform version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerVersion {
    #[serde(default)]
    pub major: i64,
    #[serde(default)]
    pub minor: i64,
    #[serde(default)]
    pub patch: i64,
    #[serde(default)]
    pub diff: String,
    #[serde(default)]
    pub commit: String,
    #[serde(default)]
    pub is_dev: bool,
}

impl ServerVersion {
    /// `major.minor.patch`.
    pub fn semver(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Response of `metrics/query` and `metrics/query_range`.
///
/// `data` is kept untyped; its shape depends on `data.resultType` and is
/// decoded by [`crate::metrics::normalize`]. Sample timestamps are seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricQueryResponse {
    #[serde(default)]
    pub status: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<ErrorMsg>,

    #[serde(default)]
    pub data: serde_json::Value,
}

/// Response of `metrics/label/__name__/values`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelValuesResponse {
    #[serde(default)]
    pub data: Vec<String>,
}

/// `GET /api/components/{id}/boundMetricsWithData`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundMetricsResponse {
    #[serde(rename = "_type", default)]
    pub kind: String,

    #[serde(default)]
    pub bound_metrics: Vec<BoundMetric>,
}

/// A metric pre-associated with a component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundMetric {
    #[serde(rename = "_type", default)]
    pub kind: String,

    #[serde(default)]
    pub bound_queries: Vec<BoundQuery>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub unit: String,
}

/// PromQL expression of a bound metric.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundQuery {
    #[serde(default)]
    pub expression: String,

    #[serde(default)]
    pub alias: String,
}

/// Body of `POST /api/snapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshotRequest {
    #[serde(rename = "_type")]
    pub kind: String,
    pub metadata: ViewSnapshotMetadata,
    pub query: String,
    pub query_version: String,
}

impl ViewSnapshotRequest {
    /// Snapshot request for an STQL query with the default view metadata.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            kind: "ViewSnapshotRequest".to_string(),
            metadata: ViewSnapshotMetadata::default(),
            query: query.into(),
            query_version: "0.0.1".to_string(),
        }
    }
}

/// View options of a snapshot request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshotMetadata {
    #[serde(rename = "_type")]
    pub kind: String,
    pub show_full_component: bool,
    pub grouping_enabled: bool,
    pub show_indirect_relations: bool,
    pub min_group_size: u32,
    pub grouped_by_layer: bool,
    pub grouped_by_domain: bool,
    pub grouped_by_relation: bool,
    pub show_cause: String,
    pub auto_grouping: bool,
    pub connected_components: bool,
    pub neighboring_components: bool,

    /// Milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_time: Option<i64>,
}

impl Default for ViewSnapshotMetadata {
    fn default() -> Self {
        Self {
            kind: "QueryMetadata".to_string(),
            show_full_component: false,
            grouping_enabled: false,
            show_indirect_relations: false,
            min_group_size: 2,
            grouped_by_layer: false,
            grouped_by_domain: false,
            grouped_by_relation: false,
            show_cause: "NONE".to_string(),
            auto_grouping: false,
            connected_components: false,
            neighboring_components: false,
            query_time: None,
        }
    }
}

/// Envelope of a snapshot response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySnapshotResult {
    #[serde(default)]
    pub view_snapshot_response: ViewSnapshotResponse,
}

/// Components matched by a snapshot query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshotResponse {
    #[serde(rename = "_type", default)]
    pub kind: String,

    #[serde(default)]
    pub components: Vec<ViewComponent>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<ErrorMsg>,
}

/// Component as returned in a view snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewComponent {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Milliseconds since the epoch.
    #[serde(default)]
    pub last_update_timestamp: i64,

    #[serde(rename = "type", default)]
    pub type_id: i64,

    #[serde(default)]
    pub layer: i64,

    #[serde(default)]
    pub domain: i64,

    #[serde(default)]
    pub state: ComponentState,

    #[serde(default)]
    pub identifiers: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl ViewComponent {
    /// Value of the first `key:value` tag with the given key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.iter().find_map(|tag| {
            let (k, v) = tag.split_once(':')?;
            (k == key).then_some(v)
        })
    }
}

/// Health state block of a component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentState {
    #[serde(default)]
    pub health_state: Option<String>,

    #[serde(default)]
    pub propagated_health_state: Option<String>,
}

/// `GET /api/components/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentResponse {
    #[serde(default)]
    pub node: ComponentNode,
}

/// Component details including its synced check states.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    /// Loosely typed; see [`CheckStateView`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub synced_check_states: Vec<serde_json::Value>,
}

/// The parts of a synced check state the monitor table shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckStateView {
    pub name: String,
    pub health: String,
    pub remediation_hint: Option<String>,
    pub queries: Vec<String>,
}

impl CheckStateView {
    /// Extract the displayed fields from a raw synced check state.
    ///
    /// Queries live under `data.displayTimeSeries[].queries[].query`.
    pub fn from_value(raw: &serde_json::Value) -> Self {
        let text = |v: Option<&serde_json::Value>| {
            v.and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let data = raw.get("data");
        let queries = data
            .and_then(|d| d.get("displayTimeSeries"))
            .and_then(serde_json::Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|series| series.get("queries").and_then(serde_json::Value::as_array))
            .flatten()
            .filter_map(|q| q.get("query").and_then(serde_json::Value::as_str))
            .map(str::to_string)
            .collect();

        Self {
            name: text(raw.get("name")),
            health: text(raw.get("health")),
            remediation_hint: data
                .and_then(|d| d.get("remediationHint"))
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            queries,
        }
    }
}

/// `GET /api/monitors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorList {
    #[serde(default)]
    pub monitors: Vec<Monitor>,
}

/// Monitor definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub function_id: i64,

    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_hint: Option<String>,

    #[serde(default)]
    pub interval_seconds: i64,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub runtime_status: String,

    /// Milliseconds since the epoch.
    #[serde(default)]
    pub last_update_timestamp: i64,
}

/// `GET /api/monitors/overview`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorOverviewList {
    #[serde(default)]
    pub monitors: Vec<MonitorOverview>,
}

/// A monitor together with its function and runtime data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorOverview {
    pub monitor: Monitor,

    #[serde(default)]
    pub function: MonitorFunction,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<MonitorError>,

    #[serde(default)]
    pub runtime_metrics: MonitorRuntimeMetrics,
}

/// Function a monitor runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorFunction {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Error a monitor reported while running.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorError {
    #[serde(default)]
    pub error: String,

    #[serde(default)]
    pub count: i64,

    #[serde(default)]
    pub level: String,
}

/// Health state counts and run times of a monitor. Timestamps are milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorRuntimeMetrics {
    #[serde(default)]
    pub health_states_count: i64,
    #[serde(default)]
    pub unmapped_health_states_count: i64,
    #[serde(default)]
    pub unknown_count: i64,
    #[serde(default)]
    pub clear_count: i64,
    #[serde(default)]
    pub deviating_count: i64,
    #[serde(default)]
    pub critical_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_run_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failed_run_timestamp: Option<i64>,
    #[serde(default)]
    pub group_count: i64,
}

/// `GET /api/monitors/{id}/checkStates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorCheckStates {
    #[serde(default)]
    pub states: Vec<ViewCheckState>,
}

/// Check state produced by a monitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCheckState {
    #[serde(default)]
    pub check_state_id: String,

    #[serde(default)]
    pub topology_element_id: i64,

    #[serde(default)]
    pub topology_element_id_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub health: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /api/monitor/checkStatus/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorCheckStatus {
    pub id: i64,

    #[serde(default)]
    pub check_state_id: String,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default)]
    pub health: String,

    /// Milliseconds since the epoch.
    #[serde(default)]
    pub triggered_timestamp: i64,

    #[serde(default)]
    pub metrics: Vec<serde_json::Value>,

    #[serde(default)]
    pub component: serde_json::Value,

    #[serde(default)]
    pub monitor_id: serde_json::Value,

    #[serde(default)]
    pub monitor_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub troubleshooting_steps: Option<String>,

    /// Milliseconds since the epoch.
    #[serde(default)]
    pub topology_time: i64,
}

/// Trace search for `POST /api/traces/query`.
///
/// `start_ms`/`end_ms` and paging travel as query parameters; `body` as JSON.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceQueryRequest {
    pub start_ms: i64,
    pub end_ms: i64,
    pub page: u32,
    pub page_size: u32,
    pub body: TracesRequestBody,
}

/// JSON body of a trace query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracesRequestBody {
    pub primary_span_filter: SpanAttributeFilter,
    pub secondary_span_filter: SpanAttributeFilter,
    pub sort_by: Vec<serde_json::Value>,
}

/// Span attribute constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanAttributeFilter {
    pub attributes: ServiceAttributes,
}

/// OpenTelemetry service attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceAttributes {
    #[serde(rename = "service.name", default, skip_serializing_if = "Vec::is_empty")]
    pub service_name: Vec<String>,

    #[serde(rename = "service.namespace", default, skip_serializing_if = "Vec::is_empty")]
    pub service_namespace: Vec<String>,
}

/// Page of trace references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceQueryResponse {
    #[serde(default)]
    pub traces: Vec<TraceRef>,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub matches_total: u64,
}

/// Reference to a trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRef {
    pub trace_id: String,

    #[serde(default)]
    pub span_id: Option<String>,
}

/// `GET /api/traces/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub trace_id: String,

    #[serde(default)]
    pub spans: Vec<Span>,
}

/// Span start/end instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanTime {
    /// Milliseconds since the epoch.
    pub timestamp: i64,

    #[serde(default)]
    pub offset_nanos: i64,
}

/// A single span of a trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    #[serde(default)]
    pub start_time: SpanTime,
    #[serde(default)]
    pub end_time: SpanTime,
    #[serde(default)]
    pub duration_nanos: i64,
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub span_id: String,
    #[serde(default)]
    pub parent_span_id: Option<String>,
    #[serde(default)]
    pub span_name: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub span_kind: String,
    #[serde(default)]
    pub span_parent_type: String,
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
    #[serde(default)]
    pub span_attributes: HashMap<String, String>,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub scope_name: Option<String>,
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
    #[serde(default)]
    pub links: Vec<serde_json::Value>,
}

/// Body of `POST /api/events`. All timestamps are milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListRequest {
    pub start_timestamp_ms: i64,
    pub end_timestamp_ms: i64,
    pub topology_query: String,
    pub limit: u32,

    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub include_connected_components: bool,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub event_types: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub event_categories: Vec<String>,
}

/// Page of events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventItemsWithTotal {
    #[serde(default)]
    pub items: Vec<TopologyEvent>,

    #[serde(default)]
    pub total: i64,
}

/// A topology event (change, deployment, alert, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyEvent {
    pub identifier: String,

    #[serde(default)]
    pub element_identifiers: Vec<String>,

    #[serde(default)]
    pub elements: Vec<serde_json::Value>,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(default)]
    pub event_type: String,

    /// Milliseconds since the epoch.
    #[serde(default)]
    pub event_time: i64,

    /// Milliseconds since the epoch.
    #[serde(default)]
    pub processed_time: i64,

    #[serde(default)]
    pub tags: Vec<EventTag>,
}

/// Key/value tag on an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTag {
    pub key: String,
    pub value: String,
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
