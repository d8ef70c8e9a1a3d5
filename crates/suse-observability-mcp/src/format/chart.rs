//! ASCII line chart rendering.
//!
//! A chart is a fixed character grid: a box border with a title, a value
//! axis on the left, a time axis at the bottom and one `•` per point.

use crate::metrics::{MetricPoint, MetricSeries};
use chrono::{DateTime, Utc};

/// Width reserved for value labels left of the y axis.
const Y_AXIS_WIDTH: usize = 10;

/// Rows below the plot area: axis line and time labels.
const X_AXIS_HEIGHT: usize = 2;

/// Longest legend before it is shortened with `...`.
const MAX_LEGEND_LEN: usize = 30;

const TITLE: &str = " Metrics ";
const MARKER: char = '•';

/// Chart dimensions in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: usize,
    pub height: usize,
}

impl ChartOptions {
    pub const MIN_WIDTH: usize = 40;
    pub const MIN_HEIGHT: usize = 8;

    /// Dimensions raised to the smallest size that fits labels and legend.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(Self::MIN_WIDTH),
            height: self.height.max(Self::MIN_HEIGHT),
        }
    }
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 80,
            height: 15,
        }
    }
}

struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![' '; width]; height],
        }
    }

    fn set(&mut self, x: usize, y: usize, ch: char) {
        if x < self.width && y < self.height {
            self.cells[y][x] = ch;
        }
    }

    /// Writes `text` from `(x, y)`, clipped at `max_x` (exclusive).
    fn put_str(&mut self, x: usize, y: usize, text: &str, max_x: usize) {
        for (i, ch) in text.chars().enumerate() {
            if x + i >= max_x {
                break;
            }
            self.set(x + i, y, ch);
        }
    }

    fn draw_border(&mut self) {
        let (right, bottom) = (self.width - 1, self.height - 1);
        for x in 1..right {
            self.set(x, 0, '─');
            self.set(x, bottom, '─');
        }
        for y in 1..bottom {
            self.set(0, y, '│');
            self.set(right, y, '│');
        }
        self.set(0, 0, '┌');
        self.set(right, 0, '┐');
        self.set(0, bottom, '└');
        self.set(right, bottom, '┘');
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(self.width * self.height * 3);
        for row in &self.cells {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}

/// Shorten to [`MAX_LEGEND_LEN`] characters, ending in `...` when cut.
fn truncate_legend(text: &str) -> String {
    if text.chars().count() <= MAX_LEGEND_LEN {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_LEGEND_LEN - 3).collect();
    out.push_str("...");
    out
}

fn time_label(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

fn bounds<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Position within `[0, 1]`; a flat range maps everything to the middle.
fn ratio(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Render one series as an ASCII chart.
///
/// Series with fewer than two points produce a one-line notice instead.
pub fn format_chart(series: &MetricSeries, options: ChartOptions) -> String {
    if series.points.len() < 2 {
        return format!("Not enough data points to plot for {}", series.name);
    }

    let ChartOptions { width, height } = options.clamped();
    let mut canvas = Canvas::new(width, height);
    canvas.draw_border();

    let title_x = (width - TITLE.chars().count()) / 2;
    canvas.put_str(title_x, 0, TITLE, width - 1);

    let axis_row = height - 1 - X_AXIS_HEIGHT;
    let label_row = axis_row + 1;
    let plot_top = 1;
    let plot_bottom = axis_row - 1;
    let plot_left = Y_AXIS_WIDTH + 1;
    let plot_right = width - 2;

    for y in plot_top..axis_row {
        canvas.set(Y_AXIS_WIDTH, y, '│');
    }
    canvas.set(Y_AXIS_WIDTH, axis_row, '└');
    for x in plot_left..=plot_right {
        canvas.set(x, axis_row, '─');
    }

    let points: &[MetricPoint] = &series.points;
    let (min_value, max_value) = bounds(points.iter().map(|p| p.value));
    // Time runs from the first to the last point; input is ordered by timestamp.
    let first_time = points[0].timestamp_ms;
    let last_time = points[points.len() - 1].timestamp_ms;

    canvas.put_str(1, plot_top, &format!("{:.2}", max_value), Y_AXIS_WIDTH);
    canvas.put_str(1, plot_bottom, &format!("{:.2}", min_value), Y_AXIS_WIDTH);
    if plot_top + 1 < plot_bottom {
        canvas.put_str(1, plot_top + 1, "Value", Y_AXIS_WIDTH);
    }

    let span_x = (plot_right - plot_left) as f64;
    let span_y = (plot_bottom - plot_top) as f64;
    for point in points {
        let rx = ratio(point.timestamp_ms as f64, first_time as f64, last_time as f64);
        let ry = ratio(point.value, min_value, max_value);
        let x = (plot_left + (rx * span_x).round() as usize).min(plot_right);
        let y = plot_bottom - (ry * span_y).round() as usize;
        canvas.set(x, y.max(plot_top), MARKER);
    }

    let first = time_label(first_time);
    let last = time_label(last_time);
    canvas.put_str(plot_left, label_row, &first, width - 1);
    let last_x = (plot_right + 1).saturating_sub(last.chars().count());
    if last_x > plot_left + first.chars().count() {
        canvas.put_str(last_x, label_row, &last, width - 1);
    }

    let legend = truncate_legend(&format!(" {} ", series.name));
    let legend_len = legend.chars().count();
    let legend_x = width - legend_len - 3;
    let rule: String = "─".repeat(legend_len);
    canvas.put_str(legend_x, 2, &format!("┌{}┐", rule), width - 1);
    canvas.put_str(legend_x, 3, &format!("│{}│", legend), width - 1);
    canvas.put_str(legend_x, 4, &format!("└{}┘", rule), width - 1);

    canvas.render()
}

/// Render every series as its own chart, separated by blank lines.
pub fn format_charts(series: &[MetricSeries], options: ChartOptions) -> String {
    if series.is_empty() {
        return super::table::NO_DATA.to_string();
    }
    series
        .iter()
        .map(|s| format_chart(s, options))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn series(name: &str, points: &[(i64, f64)]) -> MetricSeries {
        MetricSeries {
            name: name.to_string(),
            labels: BTreeMap::new(),
            points: points
                .iter()
                .map(|(t, v)| MetricPoint {
                    timestamp_ms: *t,
                    value: *v,
                })
                .collect(),
        }
    }

    fn grid(out: &str) -> Vec<Vec<char>> {
        out.lines().map(|l| l.chars().collect()).collect()
    }

    #[test]
    fn test_single_point_not_plotted() {
        let out = format_chart(&series("up", &[(0, 1.0)]), ChartOptions::default());
        assert_eq!(out, "Not enough data points to plot for up");
    }

    #[test]
    fn test_grid_dimensions_and_border() {
        let s = series("cpu", &[(1_700_000_000_000, 1.0), (1_700_000_060_000, 3.0)]);
        let out = format_chart(&s, ChartOptions::default());
        let rows = grid(&out);
        assert_eq!(rows.len(), 15);
        assert!(rows.iter().all(|r| r.len() == 80));
        assert_eq!(rows[0][0], '┌');
        assert_eq!(rows[0][79], '┐');
        assert_eq!(rows[14][0], '└');
        assert_eq!(rows[14][79], '┘');
        assert!(out.lines().next().unwrap().contains(" Metrics "));
    }

    #[test]
    fn test_extremes_plotted_at_corners() {
        let s = series("cpu", &[(1_700_000_000_000, 1.0), (1_700_000_060_000, 3.0)]);
        let rows = grid(&format_chart(&s, ChartOptions::default()));
        // min value at the bottom-left of the plot area, max at the top-right
        assert_eq!(rows[11][11], MARKER);
        assert_eq!(rows[1][78], MARKER);
        assert_eq!(
            rows.iter().flatten().filter(|c| **c == MARKER).count(),
            2
        );
    }

    #[test]
    fn test_labels() {
        let s = series("cpu", &[(1_700_000_000_000, 0.5), (1_700_000_060_000, 12.25)]);
        let out = format_chart(&s, ChartOptions::default());
        assert!(out.contains("12.25"));
        assert!(out.contains("0.50"));
        assert!(out.contains("Value"));
        assert!(out.contains("22:13:20"));
        assert!(out.contains("22:14:20"));
        assert!(out.contains("│ cpu │"));
    }

    #[test]
    fn test_time_axis_spans_first_to_last_point() {
        let s = series(
            "cpu",
            &[
                (1_700_000_060_000, 1.0),
                (1_700_000_000_000, 2.0),
                (1_700_000_120_000, 3.0),
            ],
        );
        let out = format_chart(&s, ChartOptions::default());
        let label_row = out.lines().nth(13).unwrap();
        assert!(label_row.contains("22:14:20"));
        assert!(label_row.contains("22:15:20"));
        assert!(!out.contains("22:13:20"));
    }

    #[test]
    fn test_flat_series() {
        let s = series("flat", &[(0, 2.0), (1_000, 2.0), (2_000, 2.0)]);
        let out = format_chart(&s, ChartOptions::default());
        assert_eq!(out.matches(MARKER).count(), 3);
    }

    #[test]
    fn test_long_legend_truncated() {
        let name = "kubernetes_container_memory_working_set_bytes";
        let s = series(name, &[(0, 1.0), (1_000, 2.0)]);
        let out = format_chart(&s, ChartOptions::default());
        assert!(!out.contains(name));
        assert!(out.contains("│ kubernetes_container_memor...│"));
    }

    #[test]
    fn test_small_options_clamped() {
        let s = series("cpu", &[(0, 1.0), (1_000, 2.0)]);
        let rows = grid(&format_chart(&s, ChartOptions { width: 5, height: 2 }));
        assert_eq!(rows.len(), ChartOptions::MIN_HEIGHT);
        assert!(rows.iter().all(|r| r.len() == ChartOptions::MIN_WIDTH));
    }

    #[test]
    fn test_multiple_series() {
        let data = vec![
            series("a", &[(0, 1.0), (1_000, 2.0)]),
            series("b", &[(0, 1.0)]),
        ];
        let out = format_charts(&data, ChartOptions::default());
        assert!(out.contains("│ a │"));
        assert!(out.ends_with("Not enough data points to plot for b"));
        assert_eq!(format_charts(&[], ChartOptions::default()), "No data found.");
    }
}
