//! Metric response normalizer.
//!
//! The metrics API answers in the Prometheus result format, whose shape
//! depends on the `resultType` discriminator:
//!
//! | resultType        | result                                                  |
//! |-------------------|---------------------------------------------------------|
//! | `scalar`/`string` | `[ts, "value"]`                                         |
//! | `vector`          | `[{"metric": {labels}, "value": [ts, "value"]}, ...]`   |
//! | `matrix`          | `[{"metric": {labels}, "values": [[ts, "value"], ...]}]` |
//!
//! This module decodes that payload into a flat list of [`MetricSeries`].
//! The untyped JSON never leaves this module.
//!
//! Upstream timestamps are seconds (possibly fractional); points carry
//! milliseconds since the epoch.

use crate::clients::types::MetricQueryResponse;
use crate::clients::ObservabilityError;
use crate::error::ToolError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Label carrying the metric name.
pub const NAME_LABEL: &str = "__name__";

/// Series name used when the `__name__` label is absent or empty.
pub const FALLBACK_SERIES_NAME: &str = "metric";

/// A single sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricPoint {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub value: f64,
}

/// A named time series with its labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub name: String,

    /// Labels without `__name__`.
    pub labels: BTreeMap<String, String>,

    /// Points in the order the API returned them.
    pub points: Vec<MetricPoint>,
}

/// Prometheus result type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Scalar,
    String,
    Vector,
    Matrix,
}

impl ResultType {
    fn parse(raw: &str) -> Result<Self, ToolError> {
        match raw {
            "scalar" => Ok(ResultType::Scalar),
            "string" => Ok(ResultType::String),
            "vector" => Ok(ResultType::Vector),
            "matrix" => Ok(ResultType::Matrix),
            other => Err(ToolError::UnsupportedResultType(other.to_string())),
        }
    }
}

/// Normalize a full query response, surfacing upstream query errors first.
pub fn normalize_response(response: &MetricQueryResponse) -> Result<Vec<MetricSeries>, ToolError> {
    if response.status.eq_ignore_ascii_case("error") || !response.errors.is_empty() {
        let messages: Vec<&str> = response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        let message = if messages.is_empty() {
            "metric query failed".to_string()
        } else {
            messages.join("; ")
        };
        return Err(ObservabilityError::QueryFailed(message).into());
    }
    normalize(&response.data)
}

/// Normalize the `data` object of a metric query response.
pub fn normalize(data: &Value) -> Result<Vec<MetricSeries>, ToolError> {
    let result_type = match data.get("resultType") {
        Some(Value::String(s)) => ResultType::parse(s)?,
        Some(other) => return Err(ToolError::UnsupportedResultType(other.to_string())),
        None => return Err(ToolError::UnsupportedResultType("<missing>".to_string())),
    };
    let result = data.get("result").unwrap_or(&Value::Null);

    let series = match result_type {
        ResultType::Scalar | ResultType::String => {
            let point = parse_point(result)?;
            vec![MetricSeries {
                name: FALLBACK_SERIES_NAME.to_string(),
                labels: BTreeMap::new(),
                points: vec![point],
            }]
        }
        ResultType::Vector => as_array(result, "result")?
            .iter()
            .map(|item| {
                let item = as_object(item, "result item")?;
                let point = parse_point(item.get("value").unwrap_or(&Value::Null))?;
                series_from(item, vec![point])
            })
            .collect::<Result<Vec<_>, _>>()?,
        ResultType::Matrix => as_array(result, "result")?
            .iter()
            .map(|item| {
                let item = as_object(item, "result item")?;
                let points = as_array(item.get("values").unwrap_or(&Value::Null), "values")?
                    .iter()
                    .map(parse_point)
                    .collect::<Result<Vec<_>, _>>()?;
                series_from(item, points)
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    debug!(
        result_type = ?result_type,
        series = series.len(),
        "Normalized metric response"
    );
    Ok(series)
}

fn series_from(
    item: &Map<String, Value>,
    points: Vec<MetricPoint>,
) -> Result<MetricSeries, ToolError> {
    let mut labels = BTreeMap::new();
    match item.get("metric") {
        Some(Value::Object(raw)) => {
            for (key, value) in raw {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                labels.insert(key.clone(), value);
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => {
            return Err(ToolError::MalformedMetricPoint(format!(
                "expected label object, got {}",
                other
            )))
        }
    }

    let name = labels
        .remove(NAME_LABEL)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| FALLBACK_SERIES_NAME.to_string());

    Ok(MetricSeries {
        name,
        labels,
        points,
    })
}

/// Decode `[timestamp_seconds, "value"]`.
fn parse_point(raw: &Value) -> Result<MetricPoint, ToolError> {
    let pair = match raw {
        Value::Array(pair) if pair.len() == 2 => pair,
        other => {
            return Err(ToolError::MalformedMetricPoint(format!(
                "expected [timestamp, value], got {}",
                other
            )))
        }
    };

    let seconds = match &pair[0] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|s| s.is_finite())
    .ok_or_else(|| ToolError::MalformedMetricPoint(format!("invalid timestamp {}", pair[0])))?;

    let value = match &pair[1] {
        Value::String(s) => s.trim().parse::<f64>().map_err(|e| {
            ToolError::MalformedMetricPoint(format!("invalid value {:?}: {}", s, e))
        })?,
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            ToolError::MalformedMetricPoint(format!("invalid value {}", n))
        })?,
        other => {
            return Err(ToolError::MalformedMetricPoint(format!(
                "invalid value {}",
                other
            )))
        }
    };

    Ok(MetricPoint {
        timestamp_ms: (seconds * 1000.0).round() as i64,
        value,
    })
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, ToolError> {
    value.as_array().ok_or_else(|| {
        ToolError::MalformedMetricPoint(format!("expected {} array, got {}", what, value))
    })
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, ToolError> {
    value.as_object().ok_or_else(|| {
        ToolError::MalformedMetricPoint(format!("expected {} object, got {}", what, value))
    })
}
