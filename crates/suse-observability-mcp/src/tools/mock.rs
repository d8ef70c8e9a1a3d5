//! In-memory `ObservabilityApi` for tool tests.

use crate::clients::types::*;
use crate::clients::{ObservabilityApi, ObservabilityError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Canned responses plus a log of what the tools asked for.
#[derive(Default)]
pub struct MockApi {
    pub metric_names: Vec<String>,
    pub metric_response: MetricQueryResponse,
    pub bound_metrics: BoundMetricsResponse,
    pub components: Vec<ViewComponent>,
    pub component: Option<ComponentResponse>,
    pub monitors: MonitorList,
    pub monitors_overview: MonitorOverviewList,
    pub check_status: MonitorCheckStatus,
    pub traces: TraceQueryResponse,
    pub events: EventItemsWithTotal,

    /// Every call fails with a 500 when set.
    pub fail: bool,

    /// `method: argument` for every call.
    pub calls: Mutex<Vec<String>>,

    /// Last trace query body.
    pub trace_request: Mutex<Option<TraceQueryRequest>>,

    /// Last event list request.
    pub event_request: Mutex<Option<EventListRequest>>,
}

impl MockApi {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ObservabilityError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(ObservabilityError::ApiError {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ObservabilityApi for MockApi {
    async fn server_info(&self) -> Result<ServerInfo, ObservabilityError> {
        self.record("server_info".to_string())?;
        Ok(ServerInfo::default())
    }

    async fn list_metric_names(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<String>, ObservabilityError> {
        self.record("list_metric_names".to_string())?;
        Ok(self.metric_names.clone())
    }

    async fn query_metric(
        &self,
        query: &str,
        _at: DateTime<Utc>,
        timeout: &str,
    ) -> Result<MetricQueryResponse, ObservabilityError> {
        self.record(format!("query_metric: {} timeout={}", query, timeout))?;
        Ok(self.metric_response.clone())
    }

    async fn query_range_metric(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: &str,
        timeout: &str,
    ) -> Result<MetricQueryResponse, ObservabilityError> {
        self.record(format!(
            "query_range_metric: {} step={} timeout={} span={}s",
            query,
            step,
            timeout,
            (end - start).num_seconds()
        ))?;
        Ok(self.metric_response.clone())
    }

    async fn get_bound_metrics_with_data(
        &self,
        component_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BoundMetricsResponse, ObservabilityError> {
        self.record(format!(
            "get_bound_metrics_with_data: {} span={}s",
            component_id,
            (end - start).num_seconds()
        ))?;
        Ok(self.bound_metrics.clone())
    }

    async fn snapshot_topology_query(
        &self,
        query: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<Vec<ViewComponent>, ObservabilityError> {
        match at {
            Some(at) => self.record(format!(
                "snapshot_topology_query: {} at={}",
                query,
                at.timestamp_millis()
            ))?,
            None => self.record(format!("snapshot_topology_query: {}", query))?,
        }
        Ok(self.components.clone())
    }

    async fn get_component(
        &self,
        component_id: i64,
    ) -> Result<ComponentResponse, ObservabilityError> {
        self.record(format!("get_component: {}", component_id))?;
        self.component
            .clone()
            .ok_or_else(|| ObservabilityError::NotFound(format!("component {}", component_id)))
    }

    async fn get_monitors(&self) -> Result<MonitorList, ObservabilityError> {
        self.record("get_monitors".to_string())?;
        Ok(self.monitors.clone())
    }

    async fn get_monitors_overview(&self) -> Result<MonitorOverviewList, ObservabilityError> {
        self.record("get_monitors_overview".to_string())?;
        Ok(self.monitors_overview.clone())
    }

    async fn get_monitor(&self, id_or_urn: &str) -> Result<Monitor, ObservabilityError> {
        self.record(format!("get_monitor: {}", id_or_urn))?;
        self.monitors
            .monitors
            .iter()
            .find(|m| m.id.to_string() == id_or_urn || m.identifier.as_deref() == Some(id_or_urn))
            .cloned()
            .ok_or_else(|| ObservabilityError::NotFound(format!("monitor {}", id_or_urn)))
    }

    async fn get_monitor_check_states(
        &self,
        id_or_urn: &str,
        health_state: Option<&str>,
        limit: Option<u32>,
        timestamp_ms: Option<i64>,
    ) -> Result<MonitorCheckStates, ObservabilityError> {
        self.record(format!(
            "get_monitor_check_states: {} {:?} {:?} {:?}",
            id_or_urn, health_state, limit, timestamp_ms
        ))?;
        Ok(MonitorCheckStates::default())
    }

    async fn get_monitor_check_status(
        &self,
        check_status_id: i64,
        topology_time_ms: Option<i64>,
    ) -> Result<MonitorCheckStatus, ObservabilityError> {
        self.record(format!(
            "get_monitor_check_status: {} {:?}",
            check_status_id, topology_time_ms
        ))?;
        Ok(self.check_status.clone())
    }

    async fn query_traces(
        &self,
        request: &TraceQueryRequest,
    ) -> Result<TraceQueryResponse, ObservabilityError> {
        self.record("query_traces".to_string())?;
        *self.trace_request.lock().unwrap() = Some(request.clone());
        Ok(self.traces.clone())
    }

    async fn get_trace(&self, trace_id: &str) -> Result<Trace, ObservabilityError> {
        self.record(format!("get_trace: {}", trace_id))?;
        Ok(Trace {
            trace_id: trace_id.to_string(),
            spans: Vec::new(),
        })
    }

    async fn get_trace_span(
        &self,
        trace_id: &str,
        span_id: &str,
    ) -> Result<Span, ObservabilityError> {
        self.record(format!("get_trace_span: {} {}", trace_id, span_id))?;
        Ok(Span {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            ..Default::default()
        })
    }

    async fn get_events(
        &self,
        request: &EventListRequest,
    ) -> Result<EventItemsWithTotal, ObservabilityError> {
        self.record(format!("get_events: {}", request.topology_query))?;
        *self.event_request.lock().unwrap() = Some(request.clone());
        Ok(self.events.clone())
    }

    async fn get_event(
        &self,
        event_id: &str,
        _start_ms: i64,
        _end_ms: i64,
    ) -> Result<TopologyEvent, ObservabilityError> {
        self.record(format!("get_event: {}", event_id))?;
        self.events
            .items
            .iter()
            .find(|e| e.identifier == event_id)
            .cloned()
            .ok_or_else(|| ObservabilityError::NotFound(format!("event {}", event_id)))
    }
}
