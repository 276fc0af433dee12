// Logs panel component
//
// Displays the in-memory log buffer with color-coded levels. Owns its
// scroll state; auto-follows streaming entries until the user scrolls.

use super::scrollbar::render_scrollbar;
use crate::logging::{LogEntry, LogLevel};
use crate::tui::scroll::ScrollState;
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

pub struct LogsPanel {
    pub scroll: ScrollState,
}

impl LogsPanel {
    pub fn new() -> Self {
        Self {
            scroll: ScrollState::new(), // Auto-follow by default
        }
    }

    /// Route a key; returns true when handled.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Up | KeyCode::Char('k') => self.scroll.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => self.scroll.scroll_down(),
            KeyCode::PageUp => self.scroll.page_up(),
            KeyCode::PageDown => self.scroll.page_down(),
            KeyCode::Home => self.scroll.scroll_to_top(),
            KeyCode::End => self.scroll.scroll_to_bottom(),
            _ => return false,
        }
        true
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, entries: &[LogEntry], focused: bool) {
        let viewport = area.height.saturating_sub(2) as usize;
        self.scroll.update_dimensions(entries.len(), viewport);

        let (start, end) = self.scroll.visible_range();
        let items: Vec<ListItem> = entries[start..end]
            .iter()
            .map(|entry| {
                let line = format!(
                    "[{}] {:5} {}",
                    entry.timestamp.format("%H:%M:%S"),
                    entry.level.as_str(),
                    entry.message
                );
                ListItem::new(line).style(level_style(entry.level))
            })
            .collect();

        let border = if focused { Color::Cyan } else { Color::DarkGray };
        let title = if self.scroll.auto_follow {
            " System Logs "
        } else {
            " System Logs [scroll] "
        };

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(title),
        );
        f.render_widget(list, area);
        render_scrollbar(f, area, &self.scroll);
    }
}

impl Default for LogsPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn level_style(level: LogLevel) -> Style {
    let color = match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Info => Color::Reset,
        LogLevel::Debug => Color::DarkGray,
        LogLevel::Trace => Color::DarkGray,
    };
    Style::default().fg(color)
}
