//! Tool error types.
//!
//! Every failure a tool can hit while building a query, talking to the
//! SUSE Observability API, or reshaping its response. None of these are
//! retried locally; they abort the in-flight tool call and are reported
//! back to the caller as a tool error result.

use crate::clients::ObservabilityError;
use thiserror::Error;

/// Errors raised by the query builder, the normalizer and the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No filter field produced a clause.
    #[error("at least one filter must be provided (names, types, healthstates, layers, domains or namespace)")]
    InvalidFilter,

    /// Neighbor expansion was requested without a base selection.
    #[error("with_neighbors requires at least one base filter to select the starting components")]
    MissingBaseFilter,

    /// Neighbor direction outside of up/down/both.
    #[error("invalid with_neighbors_direction '{0}' (expected 'up', 'down' or 'both')")]
    InvalidDirection(String),

    /// Neighbor levels outside of 1..=14 / "all".
    #[error("invalid with_neighbors_levels '{0}' (expected a number between 1 and 14 or 'all')")]
    InvalidLevels(String),

    /// Metric response carries a resultType the normalizer does not know.
    #[error("unsupported metric result type: {0}")]
    UnsupportedResultType(String),

    /// A metric point could not be decoded.
    #[error("malformed metric point: {0}")]
    MalformedMetricPoint(String),

    /// Time argument is neither "now" nor a duration.
    #[error("invalid time format: {0} (expected 'now' or duration like '1h')")]
    InvalidTimeFormat(String),

    /// Metric name filter is not a valid regex.
    #[error("invalid regex filter: {0}")]
    InvalidRegex(String),

    /// Requested entity does not exist upstream.
    #[error("{0}")]
    NotFound(String),

    /// Failure reported by the SUSE Observability API client.
    #[error(transparent)]
    Upstream(#[from] ObservabilityError),
}
