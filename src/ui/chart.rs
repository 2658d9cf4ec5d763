//! Distance chart for the filtered readings.
//!
//! Readings are plotted against time. Each point is colored by its hazard
//! stage and the stage boundaries are drawn as horizontal guides.

use chrono::{DateTime, FixedOffset, Utc};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Line,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::timefmt::{format_axis_label, AxisScale};
use crate::data::{CanonicalRecord, HazardStage, Thresholds};

/// Most x-axis labels that fit a typical terminal.
const MAX_LABELS: usize = 6;

/// Render the chart.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let derived = app.view.derived();
    let records = derived.filtered;

    let block = Block::default()
        .title(format!(" Water level ({} readings) ", records.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        let message = if app.view.dataset().is_empty() {
            "No readings yet"
        } else {
            "No readings in the selected range"
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let x_min = first.timestamp.timestamp() as f64;
    let x_max = (last.timestamp.timestamp() as f64).max(x_min + 1.0);
    let y_max = y_upper_bound(records);

    let line: Vec<(f64, f64)> = records.iter().map(point).collect();
    let by_stage: Vec<(HazardStage, Vec<(f64, f64)>)> = HazardStage::ALL
        .iter()
        .map(|&stage| {
            let points = records.iter().filter(|r| r.stage() == stage).map(point).collect();
            (stage, points)
        })
        .collect();
    let guides = guide_lines(x_min, x_max);

    let mut datasets = vec![Dataset::default()
        .name("distance")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.series))
        .data(&line)];
    for (stage, points) in &guides {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(app.theme.stage_style(*stage).add_modifier(Modifier::DIM))
                .data(points),
        );
    }
    for (stage, points) in &by_stage {
        if points.is_empty() {
            continue;
        }
        datasets.push(
            Dataset::default()
                .name(stage.local_label())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(app.theme.stage_style(*stage))
                .data(points),
        );
    }

    let x_labels: Vec<Line> = axis_labels(
        first.timestamp,
        last.timestamp,
        label_count(records.len(), derived.tick_interval),
        app.view.offset(),
    )
    .into_iter()
    .map(Line::from)
    .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([x_min, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("cm")
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, y_max])
                .labels(vec![
                    Line::from("0"),
                    Line::from(format!("{:.0}", y_max / 2.0)),
                    Line::from(format!("{:.0}", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}

fn point(record: &CanonicalRecord) -> (f64, f64) {
    (record.timestamp.timestamp() as f64, record.distance_cm)
}

/// Top of the y axis: room above the highest reading and the safe boundary.
fn y_upper_bound(records: &[CanonicalRecord]) -> f64 {
    let max = records.iter().map(|r| r.distance_cm).fold(0.0_f64, f64::max);
    let top = max.max(Thresholds::default().watch_below);
    (top + top / 10.0).ceil()
}

/// Horizontal guides at each stage boundary, colored by the stage below it.
fn guide_lines(x_min: f64, x_max: f64) -> Vec<(HazardStage, [(f64, f64); 2])> {
    let thresholds = Thresholds::default();
    [
        (HazardStage::Submerged, thresholds.submerged_below),
        (HazardStage::Alert, thresholds.alert_below),
        (HazardStage::Watch, thresholds.watch_below),
    ]
    .into_iter()
    .map(|(stage, y)| (stage, [(x_min, y), (x_max, y)]))
    .collect()
}

/// Number of x-axis labels for `n` points when every `interval + 1`th
/// point is labelled.
pub fn label_count(n: usize, interval: usize) -> usize {
    if n == 0 {
        return 0;
    }
    n.div_ceil(interval + 1).clamp(1, MAX_LABELS).max(n.min(2))
}

/// Evenly spaced labels from `first` to `last`.
pub fn axis_labels(
    first: DateTime<Utc>,
    last: DateTime<Utc>,
    count: usize,
    offset: FixedOffset,
) -> Vec<String> {
    let scale = AxisScale::for_span(first, last);
    match count {
        0 => Vec::new(),
        1 => vec![format_axis_label(first, scale, offset)],
        _ => {
            let span = last - first;
            let steps = (count - 1) as i32;
            (0..count as i32)
                .map(|i| format_axis_label(first + span * i / steps, scale, offset))
                .collect()
        }
    }
}
