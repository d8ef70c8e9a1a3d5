//! Presentation of tool results.
//!
//! Everything here is a pure function from normalized data to text:
//! - `table`: Markdown tables (metrics, components, monitors, events)
//! - `chart`: ASCII line charts of metric series

pub mod chart;
pub mod table;

pub use chart::{format_chart, format_charts, ChartOptions};
pub use table::{
    format_bound_metrics, format_component_monitors, format_components, format_events,
    format_metrics_table, format_timestamp, Component, MarkdownTable, NO_DATA,
};
