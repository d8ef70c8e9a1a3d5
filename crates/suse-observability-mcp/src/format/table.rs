//! Markdown table rendering.

use crate::clients::types::{
    BoundMetricsResponse, CheckStateView, ComponentNode, EventItemsWithTotal, ViewComponent,
};
use crate::metrics::{MetricSeries, NAME_LABEL};
use crate::query::ComponentFilter;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;

/// Returned instead of an empty metric table.
pub const NO_DATA: &str = "No data found.";

/// Cell text for a missing value.
pub const PLACEHOLDER: &str = "-";

/// Simplified component view used by the component table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: i64,
    pub name: String,
    pub state: Option<String>,
}

impl From<&ViewComponent> for Component {
    fn from(c: &ViewComponent) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            state: c
                .state
                .health_state
                .clone()
                .filter(|s| !s.is_empty()),
        }
    }
}

/// Minimal Markdown table builder.
#[derive(Debug, Default)]
pub struct MarkdownTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push('|');
        for header in &self.headers {
            out.push_str(&format!(" {} |", escape_cell(header)));
        }
        out.push('\n');
        out.push('|');
        for _ in &self.headers {
            out.push_str("---|");
        }
        out.push('\n');
        for row in &self.rows {
            out.push('|');
            for i in 0..self.headers.len() {
                let cell = row.get(i).map(String::as_str).unwrap_or(PLACEHOLDER);
                out.push_str(&format!(" {} |", escape_cell(cell)));
            }
            out.push('\n');
        }
        out
    }
}

/// Keep a value on one line and inside its cell.
pub fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// RFC 3339 UTC with millisecond precision, e.g. `2023-11-14T22:13:20.000Z`.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| timestamp_ms.to_string())
}

/// Render series as `Timestamp | Value | <labels...>`, one row per point.
pub fn format_metrics_table(series: &[MetricSeries]) -> String {
    if series.is_empty() {
        return NO_DATA.to_string();
    }

    let label_keys: BTreeSet<&str> = series
        .iter()
        .flat_map(|s| s.labels.keys().map(String::as_str))
        .filter(|k| *k != NAME_LABEL)
        .collect();

    let mut table = MarkdownTable::new(
        ["Timestamp", "Value"]
            .into_iter()
            .chain(label_keys.iter().copied()),
    );

    for s in series {
        for point in &s.points {
            let mut row = vec![format_timestamp(point.timestamp_ms), point.value.to_string()];
            for key in &label_keys {
                row.push(
                    s.labels
                        .get(*key)
                        .cloned()
                        .unwrap_or_else(|| PLACEHOLDER.to_string()),
                );
            }
            table.push_row(row);
        }
    }

    table.render()
}

/// Render a topology query result: summary line plus `Name | ID | State`.
pub fn format_components(
    components: &[Component],
    filter: &ComponentFilter,
    query: &str,
) -> String {
    if components.is_empty() {
        return format!("No components found for query: `{}`", query);
    }

    let mut summary = format!("Found {} component(s)", components.len());
    let applied: Vec<String> = filter
        .applied()
        .into_iter()
        .map(|(key, value)| format!("{}=`{}`", key, value))
        .collect();
    if !applied.is_empty() {
        summary.push_str(&format!(" matching {}", applied.join(", ")));
    }
    if filter.with_neighbors {
        summary.push_str(" (including neighbors)");
    }

    let mut table = MarkdownTable::new(["Name", "ID", "State"]);
    for c in components {
        table.push_row(vec![
            c.name.clone(),
            c.id.to_string(),
            c.state.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
        ]);
    }

    format!("{}\nQuery: `{}`\n\n{}", summary, query, table.render())
}

/// Render the metrics bound to a component, one row per query expression.
pub fn format_bound_metrics(component_id: i64, response: &BoundMetricsResponse) -> String {
    let mut table = MarkdownTable::new(["Name", "Unit", "Query"]);
    for metric in &response.bound_metrics {
        let unit = if metric.unit.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            metric.unit.clone()
        };
        if metric.bound_queries.is_empty() {
            table.push_row(vec![metric.name.clone(), unit.clone(), PLACEHOLDER.to_string()]);
        }
        for query in &metric.bound_queries {
            table.push_row(vec![metric.name.clone(), unit.clone(), query.expression.clone()]);
        }
    }

    if table.is_empty() {
        return format!("No bound metrics found for component {}.", component_id);
    }
    format!(
        "Bound metrics for component {}:\n\n{}",
        component_id,
        table.render()
    )
}

/// Render the monitors (synced check states) of a component.
pub fn format_component_monitors(node: &ComponentNode) -> String {
    if node.synced_check_states.is_empty() {
        return format!("No monitors found for component {} ({}).", node.name, node.id);
    }

    let mut table = MarkdownTable::new(["Monitor", "Health", "Remediation", "Queries"]);
    for raw in &node.synced_check_states {
        let view = CheckStateView::from_value(raw);
        let queries = if view.queries.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            view.queries
                .iter()
                .map(|q| format!("`{}`", q))
                .collect::<Vec<_>>()
                .join("<br>")
        };
        table.push_row(vec![
            view.name,
            view.health,
            view.remediation_hint
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            queries,
        ]);
    }

    format!(
        "Monitors for component {} ({}):\n\n{}",
        node.name,
        node.id,
        table.render()
    )
}

/// Render an event page as `Time | Name | Category | Type | Source | Identifier`.
pub fn format_events(events: &EventItemsWithTotal) -> String {
    if events.items.is_empty() {
        return "No events found.".to_string();
    }

    let mut table =
        MarkdownTable::new(["Time", "Name", "Category", "Type", "Source", "Identifier"]);
    for event in &events.items {
        table.push_row(vec![
            format_timestamp(event.event_time),
            event.name.clone(),
            event.category.clone(),
            event.event_type.clone(),
            event.source.clone(),
            event.identifier.clone(),
        ]);
    }

    format!(
        "Showing {} of {} event(s):\n\n{}",
        events.items.len(),
        events.total,
        table.render()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::types::{BoundMetric, BoundQuery, TopologyEvent};
    use crate::metrics::MetricPoint;
    use std::collections::BTreeMap;

    fn series(name: &str, labels: &[(&str, &str)], points: &[(i64, f64)]) -> MetricSeries {
        MetricSeries {
            name: name.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            points: points
                .iter()
                .map(|(t, v)| MetricPoint {
                    timestamp_ms: *t,
                    value: *v,
                })
                .collect(),
        }
    }

    /// Parse the body rows of a metric table back into (timestamp_ms, value, labels).
    fn parse_rows(table: &str) -> Vec<(i64, f64, BTreeMap<String, String>)> {
        let mut lines = table.lines();
        let header: Vec<String> = lines
            .next()
            .unwrap()
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim().to_string())
            .collect();
        lines.next();

        lines
            .map(|line| {
                let cells: Vec<&str> = line.trim_matches('|').split('|').map(str::trim).collect();
                let ts = DateTime::parse_from_rfc3339(cells[0])
                    .unwrap()
                    .timestamp_millis();
                let value: f64 = cells[1].parse().unwrap();
                let labels = header[2..]
                    .iter()
                    .zip(&cells[2..])
                    .filter(|(_, v)| **v != PLACEHOLDER)
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect();
                (ts, value, labels)
            })
            .collect()
    }

    #[test]
    fn test_empty_series_list() {
        let out = format_metrics_table(&[]);
        assert_eq!(out, "No data found.");
        assert!(!out.contains('|'));
    }

    #[test]
    fn test_columns_sorted_and_placeholders() {
        let data = vec![
            series("cpu", &[("pod", "a"), ("namespace", "shop")], &[(1_700_000_000_000, 1.5)]),
            series("cpu", &[("zone", "eu")], &[(1_700_000_060_000, 2.0)]),
        ];
        let out = format_metrics_table(&data);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "| Timestamp | Value | namespace | pod | zone |");
        assert_eq!(lines[1], "|---|---|---|---|---|");
        assert_eq!(
            lines[2],
            "| 2023-11-14T22:13:20.000Z | 1.5 | shop | a | - |"
        );
        assert_eq!(lines[3], "| 2023-11-14T22:14:20.000Z | 2 | - | - | eu |");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_round_trip() {
        let data = vec![
            series(
                "http_requests",
                &[("method", "GET"), ("code", "200")],
                &[
                    (1_700_000_000_000, 0.1),
                    (1_700_000_015_500, 123456.789),
                    (1_700_000_030_000, -3.25),
                ],
            ),
            series("http_requests", &[("method", "POST")], &[(1_700_000_000_000, 42.0)]),
        ];
        let parsed = parse_rows(&format_metrics_table(&data));

        let expected: Vec<(i64, f64, BTreeMap<String, String>)> = data
            .iter()
            .flat_map(|s| {
                s.points
                    .iter()
                    .map(move |p| (p.timestamp_ms, p.value, s.labels.clone()))
            })
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_pipes_escaped() {
        let data = vec![series("m", &[("path", "a|b")], &[(0, 1.0)])];
        let out = format_metrics_table(&data);
        assert!(out.contains("a\\|b"));
    }

    #[test]
    fn test_components_table() {
        let components = vec![
            Component {
                id: 1,
                name: "service-a".to_string(),
                state: Some("CLEAR".to_string()),
            },
            Component {
                id: 2,
                name: "service-b".to_string(),
                state: None,
            },
        ];
        let filter = ComponentFilter {
            names: "service-a,service-b".to_string(),
            types: "service".to_string(),
            ..Default::default()
        };
        let out = format_components(&components, &filter, "q");
        assert!(out.starts_with(
            "Found 2 component(s) matching names=`service-a,service-b`, types=`service`"
        ));
        assert!(out.contains("Query: `q`"));
        assert!(out.contains("| Name | ID | State |"));
        assert!(out.contains("| service-a | 1 | CLEAR |"));
        assert!(out.contains("| service-b | 2 | - |"));
    }

    #[test]
    fn test_components_empty() {
        let out = format_components(&[], &ComponentFilter::default(), r#"name IN ("x")"#);
        assert_eq!(out, r#"No components found for query: `name IN ("x")`"#);
    }

    #[test]
    fn test_component_from_view() {
        let view: ViewComponent = serde_json::from_value(serde_json::json!({
            "id": 9,
            "name": "redis",
            "state": {"healthState": ""}
        }))
        .unwrap();
        let component = Component::from(&view);
        assert_eq!(component.id, 9);
        assert_eq!(component.state, None);
    }

    #[test]
    fn test_bound_metrics() {
        let response = BoundMetricsResponse {
            kind: String::new(),
            bound_metrics: vec![BoundMetric {
                kind: String::new(),
                name: "cpu_usage".to_string(),
                unit: "percent".to_string(),
                bound_queries: vec![BoundQuery {
                    expression: "avg(cpu_usage)".to_string(),
                    alias: String::new(),
                }],
            }],
        };
        let out = format_bound_metrics(123, &response);
        assert!(out.contains("| cpu_usage | percent | avg(cpu_usage) |"));

        let empty = format_bound_metrics(456, &BoundMetricsResponse::default());
        assert_eq!(empty, "No bound metrics found for component 456.");
    }

    #[test]
    fn test_component_monitors() {
        let node = ComponentNode {
            id: 5,
            name: "api".to_string(),
            synced_check_states: vec![serde_json::json!({
                "name": "High CPU",
                "health": "CRITICAL",
                "data": {
                    "remediationHint": "Check logs",
                    "displayTimeSeries": [{"queries": [{"query": "avg(cpu)"}]}]
                }
            })],
        };
        let out = format_component_monitors(&node);
        assert!(out.contains("| High CPU | CRITICAL | Check logs | `avg(cpu)` |"));

        let empty = ComponentNode {
            id: 5,
            name: "api".to_string(),
            synced_check_states: vec![],
        };
        assert!(format_component_monitors(&empty).starts_with("No monitors found"));
    }

    #[test]
    fn test_events() {
        let events = EventItemsWithTotal {
            items: vec![TopologyEvent {
                identifier: "ev-1".to_string(),
                name: "Deployment updated".to_string(),
                category: "Changes".to_string(),
                event_type: "Kubernetes".to_string(),
                source: "k8s".to_string(),
                event_time: 1_700_000_000_000,
                ..Default::default()
            }],
            total: 3,
        };
        let out = format_events(&events);
        assert!(out.starts_with("Showing 1 of 3 event(s)"));
        assert!(out.contains(
            "| 2023-11-14T22:13:20.000Z | Deployment updated | Changes | Kubernetes | k8s | ev-1 |"
        ));
        assert_eq!(format_events(&EventItemsWithTotal::default()), "No events found.");
    }
}
