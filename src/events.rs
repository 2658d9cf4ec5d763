use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputField};

/// Where the `x` key writes the export.
pub const EXPORT_FILE: &str = "floodwatch-export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // While a bound is being edited, keys are text input
    if app.editing.is_some() {
        handle_input(app, key);
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // Paging
        KeyCode::Left | KeyCode::Char('p') => {
            app.view.prev_page();
        }
        KeyCode::Right | KeyCode::Char('n') => {
            app.view.next_page();
        }
        KeyCode::Home => {
            app.view.first_page();
        }
        KeyCode::End => {
            app.view.last_page();
        }

        // Page size
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let size = app.view.grow_page_size().page_size;
            app.set_status_message(format!("{} readings per page", size));
        }
        KeyCode::Char('-') => {
            let size = app.view.shrink_page_size().page_size;
            app.set_status_message(format!("{} readings per page", size));
        }

        // Date filter
        KeyCode::Char('s') => app.start_editing(InputField::Start),
        KeyCode::Char('e') => app.start_editing(InputField::End),
        KeyCode::Enter => app.apply_filter(),
        KeyCode::Char('c') => app.clear_filter(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('x') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(count) => {
                    app.set_status_message(format!(
                        "Exported {} readings to {}",
                        count,
                        export_path.display()
                    ));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while a date bound is being edited
fn handle_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Apply both bounds
        KeyCode::Enter => app.apply_filter(),

        // Stop editing, keep the typed text
        KeyCode::Esc => app.cancel_editing(),

        // Switch between start and end
        KeyCode::Tab | KeyCode::BackTab => app.toggle_input_field(),

        KeyCode::Backspace => app.input_pop(),

        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.input_push(c),

        _ => {}
    }
}
