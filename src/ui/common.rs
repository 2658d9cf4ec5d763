//! Common UI components.
//!
//! This module contains the header bar, stage legend, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{stage_counts, HazardStage};
use crate::ingest::FeedStatus;

/// Render the header bar with the current reading.
///
/// Displays: stage indicator, current distance, stage label, reading count.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" FLOODWATCH ", Style::default().add_modifier(Modifier::BOLD));

    let Some(stage) = app.current_stage() else {
        let state = match app.status {
            FeedStatus::Waiting => "Waiting for data...",
            _ => "No data available",
        };
        let line = Line::from(vec![title, Span::raw("│ "), Span::raw(state)]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let style = app.theme.stage_style(stage);
    let mut spans = vec![
        Span::styled(" ● ", style),
        title,
        Span::raw("│ "),
        Span::styled(
            format!("{:.1} cm", app.view.current_value()),
            style.add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(format!("{} ({})", stage.label(), stage.local_label()), style),
        Span::raw(" │ "),
        Span::styled(
            format!("{}", app.view.dataset().len()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" readings"),
    ];

    if let FeedStatus::Populated { rejected, .. } = app.status {
        if rejected > 0 {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(
                format!("{} rejected", rejected),
                Style::default().add_modifier(Modifier::DIM),
            ));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the hazard stage legend with the number of filtered readings in each stage.
pub fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let counts = stage_counts(app.view.derived().filtered);
    let mut spans = vec![Span::raw(" ")];
    for stage in HazardStage::ALL {
        let count = counts.get(&stage).copied().unwrap_or(0);
        spans.push(Span::styled("■ ", app.theme.stage_style(stage)));
        spans.push(Span::raw(format!("{} {}  ", stage.local_label(), count)));
    }
    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, time since last update, available controls.
/// Also displays temporary status messages.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.editing.is_some() {
        "Type a date (YYYY-MM-DD [HH:MM]) | Tab:switch Enter:apply Esc:cancel"
    } else {
        "s/e:bounds c:clear ←/→:page +/-:size x:export ?:help q:quit"
    };

    let feed = if app.feed_closed() {
        "Feed closed".to_string()
    } else if let Some(updated) = app.last_update {
        format!("Updated {:.1}s ago", updated.elapsed().as_secs_f64())
    } else {
        "Waiting...".to_string()
    };

    let status = format!(" {} | {} | {}", app.source_description(), feed, controls);
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Log pages",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ p/n     Previous/next page"),
        Line::from("  Home/End    First/last page"),
        Line::from("  +/-         Change page size"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Date filter",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  s / e       Edit start / end"),
        Line::from("  Tab         Switch bound"),
        Line::from("  Enter       Apply filter"),
        Line::from("  c           Clear filter"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  x           Export to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
