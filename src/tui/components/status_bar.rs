// Status bar component
//
// Session statistics at the bottom: uptime, dispatched fetches, failures,
// live counters, and the key hints for the current view.

use super::formatters::format_compact_number;
use crate::tui::app::App;
use crate::tui::layout::Breakpoint;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

/// Render the status bar
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let bp = Breakpoint::from_width(area.width);
    let stats = &app.stats;

    let counters = match (app.active_users, app.petitioners) {
        (Some(active), Some(total)) => format!(
            " │ 👥 {} / {}",
            format_compact_number(active),
            format_compact_number(total)
        ),
        (Some(active), None) => format!(" │ 👥 {}", format_compact_number(active)),
        _ => String::new(),
    };

    let status_text = if bp.at_least(Breakpoint::Normal) {
        format!(
            " {} │ 📡 {} fetches │ ✗ {}{} │ {}",
            app.uptime(),
            stats.commands_sent,
            stats.fetch_failures,
            counters,
            app.view.key_hints(),
        )
    } else {
        format!(
            " {} │ 📡 {} │ ✗ {}{}",
            app.uptime(),
            stats.commands_sent,
            stats.fetch_failures,
            counters,
        )
    };

    let paragraph = Paragraph::new(status_text).style(Style::default().fg(Color::Gray));
    f.render_widget(paragraph, area);
}
