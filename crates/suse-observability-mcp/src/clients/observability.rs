//! SUSE Observability API client.
//!
//! HTTP client for the SUSE Observability (StackState) REST API. Provides
//! methods for metric queries, topology snapshots, component details,
//! monitors, traces and events.
//!
//! Tools depend on the [`ObservabilityApi`] trait rather than on the
//! concrete client, so tests can substitute an in-memory implementation.

use super::config::{ServiceConfig, ServiceEndpoint};
use super::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

/// SUSE Observability client errors.
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The API accepted the request but reported a query failure.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,
}

/// Operations the tools need from SUSE Observability.
#[async_trait]
pub trait ObservabilityApi: Send + Sync {
    /// Server version and deployment mode.
    async fn server_info(&self) -> Result<ServerInfo, ObservabilityError>;

    /// Names of all metrics with samples in the range.
    async fn list_metric_names(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, ObservabilityError>;

    /// Instant PromQL query.
    async fn query_metric(
        &self,
        query: &str,
        at: DateTime<Utc>,
        timeout: &str,
    ) -> Result<MetricQueryResponse, ObservabilityError>;

    /// PromQL query over a time range.
    async fn query_range_metric(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: &str,
        timeout: &str,
    ) -> Result<MetricQueryResponse, ObservabilityError>;

    /// Metrics bound to a component.
    async fn get_bound_metrics_with_data(
        &self,
        component_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BoundMetricsResponse, ObservabilityError>;

    /// Components matching an STQL query, at `at` or the current time.
    async fn snapshot_topology_query(
        &self,
        query: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<Vec<ViewComponent>, ObservabilityError>;

    /// Component details including synced check states.
    async fn get_component(&self, component_id: i64)
        -> Result<ComponentResponse, ObservabilityError>;

    /// All monitor definitions.
    async fn get_monitors(&self) -> Result<MonitorList, ObservabilityError>;

    /// All monitors with their function and runtime data.
    async fn get_monitors_overview(&self) -> Result<MonitorOverviewList, ObservabilityError>;

    /// A monitor by ID or URN.
    async fn get_monitor(&self, id_or_urn: &str) -> Result<Monitor, ObservabilityError>;

    /// Check states produced by a monitor.
    async fn get_monitor_check_states(
        &self,
        id_or_urn: &str,
        health_state: Option<&str>,
        limit: Option<u32>,
        timestamp_ms: Option<i64>,
    ) -> Result<MonitorCheckStates, ObservabilityError>;

    /// Check status details.
    async fn get_monitor_check_status(
        &self,
        check_status_id: i64,
        topology_time_ms: Option<i64>,
    ) -> Result<MonitorCheckStatus, ObservabilityError>;

    /// Search traces.
    async fn query_traces(
        &self,
        request: &TraceQueryRequest,
    ) -> Result<TraceQueryResponse, ObservabilityError>;

    /// A trace with all its spans.
    async fn get_trace(&self, trace_id: &str) -> Result<Trace, ObservabilityError>;

    /// A single span of a trace.
    async fn get_trace_span(&self, trace_id: &str, span_id: &str)
        -> Result<Span, ObservabilityError>;

    /// Events for a topology selection.
    async fn get_events(
        &self,
        request: &EventListRequest,
    ) -> Result<EventItemsWithTotal, ObservabilityError>;

    /// A single event.
    async fn get_event(
        &self,
        event_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<TopologyEvent, ObservabilityError>;
}

/// SUSE Observability API client.
#[derive(Clone)]
pub struct ObservabilityClient {
    /// HTTP client instance.
    client: Client,

    /// Endpoint and credentials.
    endpoint: ServiceEndpoint,
}

impl ObservabilityClient {
    /// Create a client from configuration.
    pub fn new(config: &ServiceConfig) -> Result<Self, ObservabilityError> {
        config
            .endpoint
            .parsed_url()
            .map_err(|e| ObservabilityError::InvalidConfig(e.to_string()))?;

        let mut builder = Client::builder().timeout(config.timeout());
        if !config.verify_tls {
            warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build()?;

        let mut endpoint = config.endpoint.clone();
        endpoint.base_url = endpoint.base_url.trim().trim_end_matches('/').to_string();

        Ok(Self { client, endpoint })
    }

    /// Endpoint this client talks to.
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Start a request with content type and token header set.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint.url(path);
        debug!("{} {}", method, url);
        let mut request = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json");

        if let Some(ref token) = self.endpoint.token {
            request = request.header(self.endpoint.token_kind.header(), token);
        }
        request
    }

    /// Send a request, mapping 404 to [`ObservabilityError::NotFound`].
    async fn fetch<T>(&self, request: RequestBuilder, what: &str) -> Result<T, ObservabilityError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ObservabilityError::NotFound(what.to_string()));
        }

        self.handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T, ObservabilityError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            error!("SUSE Observability authentication failed ({})", status.as_u16());
            return Err(ObservabilityError::AuthenticationFailed);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            warn!("SUSE Observability API error ({}): {}", status.as_u16(), message);
            return Err(ObservabilityError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ObservabilityError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ObservabilityApi for ObservabilityClient {
    #[instrument(skip(self))]
    async fn server_info(&self) -> Result<ServerInfo, ObservabilityError> {
        let request = self.request(Method::GET, "server/info");
        self.fetch(request, "server info").await
    }

    #[instrument(skip(self))]
    async fn list_metric_names(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, ObservabilityError> {
        let request = self
            .request(Method::GET, "metrics/label/__name__/values")
            .query(&[
                ("start", start.timestamp_millis().to_string()),
                ("end", end.timestamp_millis().to_string()),
            ]);
        let response: LabelValuesResponse = self.fetch(request, "metric names").await?;
        Ok(response.data)
    }

    #[instrument(skip(self))]
    async fn query_metric(
        &self,
        query: &str,
        at: DateTime<Utc>,
        timeout: &str,
    ) -> Result<MetricQueryResponse, ObservabilityError> {
        debug!("Running instant metric query");
        let request = self.request(Method::GET, "metrics/query").query(&[
            ("query", query.to_string()),
            ("timeout", timeout.to_string()),
            ("time", at.timestamp_millis().to_string()),
        ]);
        self.fetch(request, "metric query").await
    }

    #[instrument(skip(self))]
    async fn query_range_metric(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: &str,
        timeout: &str,
    ) -> Result<MetricQueryResponse, ObservabilityError> {
        debug!("Running range metric query");
        let request = self.request(Method::GET, "metrics/query_range").query(&[
            ("query", query.to_string()),
            ("timeout", timeout.to_string()),
            ("step", step.to_string()),
            ("start", start.timestamp_millis().to_string()),
            ("end", end.timestamp_millis().to_string()),
        ]);
        self.fetch(request, "metric range query").await
    }

    #[instrument(skip(self))]
    async fn get_bound_metrics_with_data(
        &self,
        component_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BoundMetricsResponse, ObservabilityError> {
        let request = self
            .request(
                Method::GET,
                &format!("components/{}/boundMetricsWithData", component_id),
            )
            .query(&[
                ("startSeconds", start.timestamp().to_string()),
                ("endSeconds", end.timestamp().to_string()),
            ]);
        self.fetch(request, &format!("component {}", component_id))
            .await
    }

    #[instrument(skip(self), fields(query = %query))]
    async fn snapshot_topology_query(
        &self,
        query: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<Vec<ViewComponent>, ObservabilityError> {
        debug!("Running topology snapshot query");
        let mut body = ViewSnapshotRequest::new(query);
        body.metadata.query_time = at.map(|t| t.timestamp_millis());
        let response = self.request(Method::POST, "snapshot").json(&body).send().await?;
        let status = response.status();

        let auth_failure = matches!(
            status,
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
        );

        if !status.is_success() && !auth_failure {
            let text = response.text().await.unwrap_or_default();
            let parsed: ErrorResp = serde_json::from_str(&text).unwrap_or_default();
            if let Some(first) = parsed.errors.first() {
                warn!("Topology snapshot rejected: {}", first.message);
                return Err(ObservabilityError::QueryFailed(first.message.clone()));
            }
            warn!("SUSE Observability API error ({}): {}", status.as_u16(), text);
            return Err(ObservabilityError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let result: QuerySnapshotResult = self.handle_response(response).await?;
        let snapshot = result.view_snapshot_response;
        if let Some(first) = snapshot.errors.first() {
            return Err(ObservabilityError::QueryFailed(first.message.clone()));
        }
        Ok(snapshot.components)
    }

    #[instrument(skip(self))]
    async fn get_component(
        &self,
        component_id: i64,
    ) -> Result<ComponentResponse, ObservabilityError> {
        let request = self.request(Method::GET, &format!("components/{}", component_id));
        self.fetch(request, &format!("component {}", component_id))
            .await
    }

    #[instrument(skip(self))]
    async fn get_monitors(&self) -> Result<MonitorList, ObservabilityError> {
        let request = self.request(Method::GET, "monitors");
        self.fetch(request, "monitors").await
    }

    #[instrument(skip(self))]
    async fn get_monitors_overview(&self) -> Result<MonitorOverviewList, ObservabilityError> {
        let request = self.request(Method::GET, "monitors/overview");
        self.fetch(request, "monitors overview").await
    }

    #[instrument(skip(self))]
    async fn get_monitor(&self, id_or_urn: &str) -> Result<Monitor, ObservabilityError> {
        let request = self.request(Method::GET, &format!("monitors/{}", id_or_urn));
        self.fetch(request, &format!("monitor {}", id_or_urn)).await
    }

    #[instrument(skip(self))]
    async fn get_monitor_check_states(
        &self,
        id_or_urn: &str,
        health_state: Option<&str>,
        limit: Option<u32>,
        timestamp_ms: Option<i64>,
    ) -> Result<MonitorCheckStates, ObservabilityError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(health) = health_state.filter(|h| !h.is_empty()) {
            params.push(("healthState", health.to_string()));
        }
        if let Some(limit) = limit.filter(|l| *l > 0) {
            params.push(("limit", limit.to_string()));
        }
        if let Some(ts) = timestamp_ms.filter(|t| *t > 0) {
            params.push(("timestamp", ts.to_string()));
        }

        let request = self
            .request(Method::GET, &format!("monitors/{}/checkStates", id_or_urn))
            .query(&params);
        self.fetch(request, &format!("monitor {}", id_or_urn)).await
    }

    #[instrument(skip(self))]
    async fn get_monitor_check_status(
        &self,
        check_status_id: i64,
        topology_time_ms: Option<i64>,
    ) -> Result<MonitorCheckStatus, ObservabilityError> {
        let mut request = self.request(
            Method::GET,
            &format!("monitor/checkStatus/{}", check_status_id),
        );
        if let Some(ts) = topology_time_ms.filter(|t| *t > 0) {
            request = request.query(&[("topologyTime", ts.to_string())]);
        }
        self.fetch(request, &format!("check status {}", check_status_id))
            .await
    }

    #[instrument(skip(self, request))]
    async fn query_traces(
        &self,
        request: &TraceQueryRequest,
    ) -> Result<TraceQueryResponse, ObservabilityError> {
        let http = self
            .request(Method::POST, "traces/query")
            .query(&[
                ("start", request.start_ms.to_string()),
                ("end", request.end_ms.to_string()),
                ("page", request.page.to_string()),
                ("pageSize", request.page_size.to_string()),
            ])
            .json(&request.body);
        self.fetch(http, "traces").await
    }

    #[instrument(skip(self))]
    async fn get_trace(&self, trace_id: &str) -> Result<Trace, ObservabilityError> {
        let request = self.request(Method::GET, &format!("traces/{}", trace_id));
        self.fetch(request, &format!("trace {}", trace_id)).await
    }

    #[instrument(skip(self))]
    async fn get_trace_span(
        &self,
        trace_id: &str,
        span_id: &str,
    ) -> Result<Span, ObservabilityError> {
        let request = self.request(
            Method::GET,
            &format!("traces/{}/spans/{}", trace_id, span_id),
        );
        self.fetch(request, &format!("span {} of trace {}", span_id, trace_id))
            .await
    }

    #[instrument(skip(self, request), fields(query = %request.topology_query))]
    async fn get_events(
        &self,
        request: &EventListRequest,
    ) -> Result<EventItemsWithTotal, ObservabilityError> {
        let http = self.request(Method::POST, "events").json(request);
        self.fetch(http, "events").await
    }

    #[instrument(skip(self))]
    async fn get_event(
        &self,
        event_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<TopologyEvent, ObservabilityError> {
        let request = self
            .request(Method::GET, &format!("events/{}", event_id))
            .query(&[
                ("startTimestampMs", start_ms.to_string()),
                ("endTimestampMs", end_ms.to_string()),
            ]);
        self.fetch(request, &format!("event {}", event_id)).await
    }
}
