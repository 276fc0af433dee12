// Title bar component
//
// App name, current view, signed-in identity, and the live feed indicator.

use crate::events::FeedStatus;
use crate::tui::app::App;
use crate::tui::layout::Breakpoint;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the title bar
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let bp = Breakpoint::from_width(area.width);

    let identity = match &app.session.identity.name {
        Some(name) => name.clone(),
        None => "not signed in".to_string(),
    };

    let (feed_symbol, feed_color) = match &app.feed_status {
        FeedStatus::Connected => ("●", Color::Green),
        FeedStatus::Connecting => ("◌", Color::Yellow),
        FeedStatus::Reconnecting { .. } => ("◌", Color::Yellow),
        FeedStatus::Disconnected => ("○", Color::DarkGray),
        FeedStatus::Error(_) => ("●", Color::Red),
    };

    let mut spans = vec![
        Span::styled(
            " agora ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(app.view.name(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" │ "),
        Span::styled(feed_symbol, Style::default().fg(feed_color)),
        Span::raw(" live"),
    ];

    if bp.at_least(Breakpoint::Normal) {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(identity, Style::default().fg(Color::Gray)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
