// Toast notification - transient status message overlaid bottom-right

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::time::{Duration, Instant};

/// How long a toast stays visible.
const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct Toast {
    message: String,
    shown_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn expired(&self) -> bool {
        self.shown_at.elapsed() >= TOAST_DURATION
    }

    /// Render in the bottom-right corner of `area`.
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let width = (self.message.len() as u16 + 4).min(area.width);
        let rect = Rect {
            x: area.right().saturating_sub(width + 1),
            y: area.bottom().saturating_sub(4),
            width,
            height: 3,
        };

        f.render_widget(Clear, rect);
        let paragraph = Paragraph::new(self.message.as_str())
            .style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, rect);
    }
}
