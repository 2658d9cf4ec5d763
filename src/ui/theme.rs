//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.
//! Hazard stage colors are fixed across themes so the legend always matches
//! the sensor site's signage.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::HazardStage;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color of the distance line on the chart.
    pub series: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for the bound currently being edited.
    pub input_active: Style,
    /// Style for bounds not being edited.
    pub input_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            border: Color::Gray,
            series: Color::LightBlue,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            input_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            input_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            border: Color::DarkGray,
            series: Color::Blue,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            input_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            input_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Color for a hazard stage.
    pub fn stage_color(&self, stage: HazardStage) -> Color {
        let (r, g, b) = stage.rgb();
        Color::Rgb(r, g, b)
    }

    /// Get style for a hazard stage
    pub fn stage_style(&self, stage: HazardStage) -> Style {
        let style = Style::default().fg(self.stage_color(stage));
        match stage {
            HazardStage::Submerged => style.add_modifier(Modifier::BOLD),
            _ => style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_colors_match_legend() {
        let theme = Theme::light();
        assert_eq!(
            theme.stage_color(HazardStage::Submerged),
            Color::Rgb(0xd3, 0x2f, 0x2f)
        );
        assert_eq!(theme.stage_color(HazardStage::Safe), Color::Rgb(0x82, 0xca, 0x9d));
        assert_eq!(
            Theme::dark().stage_color(HazardStage::Watch),
            theme.stage_color(HazardStage::Watch)
        );
    }

    #[test]
    fn test_submerged_is_bold() {
        let theme = Theme::dark();
        assert!(theme
            .stage_style(HazardStage::Submerged)
            .add_modifier
            .contains(Modifier::BOLD));
        assert!(!theme
            .stage_style(HazardStage::Alert)
            .add_modifier
            .contains(Modifier::BOLD));
    }
}
