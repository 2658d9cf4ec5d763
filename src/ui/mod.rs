//! Terminal UI rendering using ratatui.
//!
//! The dashboard is a single screen. Each region is implemented in its own
//! submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`chart`]: Distance over time for the filtered readings
//! - [`readings`]: Paginated reading log with the date filter inputs
//! - [`common`]: Shared components (header, legend, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header (common::render_header)         │
//! ├────────────────────────────────────────┤
//! │ Legend (common::render_legend)         │
//! ├────────────────────────────────────────┤
//! │ Chart (chart::render)                  │
//! ├────────────────────────────────────────┤
//! │ Filter inputs + log (readings::render) │
//! ├────────────────────────────────────────┤
//! │ Status Bar (common::render_status_bar) │
//! └────────────────────────────────────────┘
//!         ↑
//!    Overlay rendered on top:
//!    - common::render_help
//! ```

pub mod chart;
pub mod common;
pub mod readings;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

/// Minimum terminal width for a usable display.
pub const MIN_WIDTH: u16 = 60;
/// Minimum terminal height for a usable display.
pub const MIN_HEIGHT: u16 = 20;

/// Draw the whole dashboard.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5);
        frame.render_widget(paragraph, centered.intersection(area));
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1),      // Header
        Constraint::Length(1),      // Legend
        Constraint::Percentage(45), // Chart
        Constraint::Min(8),         // Filter + log
        Constraint::Length(1),      // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_legend(frame, app, chunks[1]);
    chart::render(frame, app, chunks[2]);
    readings::render(frame, app, chunks[3]);
    common::render_status_bar(frame, app, chunks[4]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
