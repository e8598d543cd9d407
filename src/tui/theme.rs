//! Dashboard palettes and theme detection

use ratatui::prelude::*;

use crate::config::ThemeMode;

/// Colors and styles used by every dashboard page
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    // Traffic light for rates and relative scores
    pub good: Color,
    pub fair: Color,
    pub poor: Color,
    pub bar_empty: Color,

    // Tables
    pub row_alt_bg: Color,
    pub index_color: Color,
    pub header_style: Style,
    pub row_selected: Style,

    pub muted: Color,
    pub title_color: Color,
    pub accent: Color,

    // Tabs and status line
    pub tab_active_style: Style,
    pub tab_inactive_style: Style,

    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Popups
    pub popup_border: Color,
    pub popup_title: Style,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            good: Color::Green,
            fair: Color::Yellow,
            poor: Color::Red,
            bar_empty: Color::DarkGray,
            row_alt_bg: Color::Indexed(235),
            index_color: Color::DarkGray,
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Gray,
            title_color: Color::Cyan,
            accent: Color::Magenta,
            tab_active_style: Style::new().fg(Color::Cyan).bold().reversed(),
            tab_inactive_style: Style::new().fg(Color::DarkGray),
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
        }
    }

    pub fn light() -> Self {
        Self {
            good: Color::Rgb(0, 128, 0),
            fair: Color::Rgb(176, 112, 0),
            poor: Color::Rgb(190, 0, 0),
            bar_empty: Color::Indexed(250),
            row_alt_bg: Color::Indexed(254),
            index_color: Color::Indexed(244),
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Indexed(240),
            title_color: Color::Blue,
            accent: Color::Magenta,
            tab_active_style: Style::new().fg(Color::Blue).bold().reversed(),
            tab_inactive_style: Style::new().fg(Color::Indexed(244)),
            status_bar_bg: Color::Indexed(253),
            status_key_color: Color::Blue,
            flash_success: Color::Rgb(0, 128, 0),
            flash_error: Color::Rgb(190, 0, 0),
            popup_border: Color::Blue,
            popup_title: Style::new().fg(Color::Blue).bold(),
        }
    }

    /// Color for a value on a 0-100 scale where higher is better
    pub fn percent_color(&self, percent: f64) -> Color {
        if percent >= 70.0 {
            self.good
        } else if percent >= 40.0 {
            self.fair
        } else {
            self.poor
        }
    }

    /// Color for a score relative to the best and worst scores on screen
    pub fn score_color(&self, score: f64, best: f64, worst: f64) -> Color {
        let span = best - worst;
        let percent = if span > 0.0 {
            (score - worst) / span * 100.0
        } else {
            100.0
        };
        self.percent_color(percent)
    }
}

/// Pick the palette for the configured mode. `Auto` asks the terminal for
/// its background luminance and falls back to dark when it cannot tell.
pub fn resolve_theme(mode: ThemeMode) -> ThemeColors {
    match mode {
        ThemeMode::Dark => ThemeColors::dark(),
        ThemeMode::Light => ThemeColors::light(),
        ThemeMode::Auto => match terminal_light::luma() {
            Ok(luma) if luma > 0.6 => ThemeColors::light(),
            _ => ThemeColors::dark(),
        },
    }
}
