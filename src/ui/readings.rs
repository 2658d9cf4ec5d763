//! Reading log rendering.
//!
//! Displays the date filter inputs above a paginated table of readings,
//! newest page last, with the page position in the table title.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, InputField};
use crate::data::timefmt::{format_detail, format_log_entry};
use crate::data::DateWindow;

/// Render the filter inputs and the current page of readings.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).split(area);
    render_filter(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
}

fn render_filter(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for field in [InputField::Start, InputField::End] {
        let text = match field {
            InputField::Start => &app.start_input,
            InputField::End => &app.end_input,
        };
        let editing = app.editing == Some(field);
        let style = if editing {
            app.theme.input_active
        } else {
            app.theme.input_inactive
        };
        let shown = match (text.is_empty(), editing) {
            (_, true) => format!("{}_", text),
            (true, false) => "any".to_string(),
            (false, false) => text.clone(),
        };
        spans.push(Span::styled(format!("{}: ", field.label()), style));
        spans.push(Span::styled(format!("[{}]", shown), style));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        describe_window(&app.view.window(), app),
        Style::default().add_modifier(Modifier::DIM),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// One-line description of the active window.
fn describe_window(window: &DateWindow, app: &App) -> String {
    let offset = app.view.offset();
    match (window.start, window.end) {
        (None, None) => "showing all readings".to_string(),
        (Some(start), None) => format!("from {}", format_detail(start, offset)),
        (None, Some(end)) => format!("until {}", format_detail(end, offset)),
        (Some(start), Some(end)) => format!(
            "{} to {}",
            format_detail(start, offset),
            format_detail(end, offset)
        ),
    }
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let derived = app.view.derived();
    let offset = app.view.offset();

    let header = Row::new(vec![
        Cell::from("Time"),
        Cell::from("Distance"),
        Cell::from("Stage"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = derived
        .items
        .iter()
        .map(|r| {
            let stage = r.stage();
            let style = app.theme.stage_style(stage);
            Row::new(vec![
                Cell::from(format_log_entry(r.timestamp, offset)),
                Cell::from(format!("{:.1} cm", r.distance_cm)).style(style),
                Cell::from(format!("{} {}", stage.symbol(), stage.local_label())).style(style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2), // Time
        Constraint::Fill(1), // Distance
        Constraint::Fill(1), // Stage
    ];

    let page_info = if derived.total_pages == 0 {
        "no pages".to_string()
    } else {
        format!("page {}/{}", derived.page_index, derived.total_pages)
    };
    let title = format!(
        " Log ({} readings) [{} | {} per page] ",
        derived.filtered.len(),
        page_info,
        derived.page_size
    );

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );

    frame.render_widget(table, area);
}
