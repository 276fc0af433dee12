// Minimal scrollbar rendered along a panel's right border

use crate::tui::scroll::ScrollState;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

/// Render a scrollbar for `scroll` if its content overflows.
pub fn render_scrollbar(f: &mut Frame, area: Rect, scroll: &ScrollState) {
    if !scroll.needs_scrollbar() {
        return;
    }

    let mut state = ScrollbarState::new(scroll.total().saturating_sub(scroll.viewport()))
        .position(scroll.offset());

    let bar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(None)
        .end_symbol(None)
        .style(Style::default().fg(Color::DarkGray));

    f.render_stateful_widget(bar, area, &mut state);
}
