// Circle panel - conversations, contacts, circle contacts
//
// Three freshness-gated lists side by side. Tab moves between them; each
// keeps its own scroll state. The panel never fetches on its own: entering
// the view or pressing r asks the stores, which skip the call inside the
// freshness window.

use super::formatters::fit_to_width;
use super::scrollbar::render_scrollbar;
use crate::events::CircleList;
use crate::store::cache::{EntityCache, FetchStatus, Keyed};
use crate::store::CircleStore;
use crate::tui::scroll::ScrollState;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Which of the three lists has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircleSection {
    #[default]
    Conversations,
    Contacts,
    CircleContacts,
}

impl CircleSection {
    fn next(self) -> Self {
        match self {
            Self::Conversations => Self::Contacts,
            Self::Contacts => Self::CircleContacts,
            Self::CircleContacts => Self::Conversations,
        }
    }
}

pub struct CirclePanel {
    pub section: CircleSection,
    conversations_scroll: ScrollState,
    contacts_scroll: ScrollState,
    circle_scroll: ScrollState,
}

impl CirclePanel {
    pub fn new() -> Self {
        Self {
            section: CircleSection::default(),
            conversations_scroll: ScrollState::new(),
            contacts_scroll: ScrollState::new(),
            circle_scroll: ScrollState::new(),
        }
    }

    fn focused_scroll(&mut self) -> &mut ScrollState {
        match self.section {
            CircleSection::Conversations => &mut self.conversations_scroll,
            CircleSection::Contacts => &mut self.contacts_scroll,
            CircleSection::CircleContacts => &mut self.circle_scroll,
        }
    }

    /// Route a key; returns true when handled.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Tab => {
                self.section = self.section.next();
            }
            KeyCode::Up | KeyCode::Char('k') => self.focused_scroll().scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => self.focused_scroll().scroll_down(),
            KeyCode::PageUp => self.focused_scroll().page_up(),
            KeyCode::PageDown => self.focused_scroll().page_down(),
            _ => return false,
        }
        true
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, circle: &CircleStore, focused: bool) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ])
            .split(area);

        let conversation_lines: Vec<String> = circle
            .conversations
            .items()
            .map(|c| {
                let unread = if c.unread > 0 {
                    format!(" ({})", c.unread)
                } else {
                    String::new()
                };
                let last = c.last_message.as_deref().unwrap_or("");
                format!("{}{unread} · {last}", c.name)
            })
            .collect();
        render_list(
            f,
            cols[0],
            &format!(" {} ", CircleList::Conversations.label()),
            &circle.conversations,
            conversation_lines,
            &mut self.conversations_scroll,
            focused && self.section == CircleSection::Conversations,
        );

        let contact_lines: Vec<String> = circle.contacts.items().map(|c| c.name.clone()).collect();
        render_list(
            f,
            cols[1],
            &format!(" {} ", CircleList::Contacts.label()),
            &circle.contacts,
            contact_lines,
            &mut self.contacts_scroll,
            focused && self.section == CircleSection::Contacts,
        );

        let circle_lines: Vec<String> = circle
            .circle_contacts
            .items()
            .map(|c| c.name.clone())
            .collect();
        render_list(
            f,
            cols[2],
            &format!(" {} ", CircleList::CircleContacts.label()),
            &circle.circle_contacts,
            circle_lines,
            &mut self.circle_scroll,
            focused && self.section == CircleSection::CircleContacts,
        );
    }
}

impl Default for CirclePanel {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn render_list<T: Keyed>(
    f: &mut Frame,
    area: Rect,
    title: &str,
    cache: &EntityCache<T>,
    lines: Vec<String>,
    scroll: &mut ScrollState,
    focused: bool,
) {
    let viewport = area.height.saturating_sub(2) as usize;
    scroll.update_dimensions(lines.len(), viewport);

    let width = area.width.saturating_sub(3) as usize;
    let items: Vec<ListItem> = if let Some(error) = &cache.error {
        vec![ListItem::new(format!("⚠ {error}")).style(Style::default().fg(Color::Red))]
    } else if cache.status == FetchStatus::Loading && lines.is_empty() {
        vec![ListItem::new("loading…").style(Style::default().fg(Color::DarkGray))]
    } else {
        let (start, end) = scroll.visible_range();
        lines[start..end]
            .iter()
            .map(|line| ListItem::new(fit_to_width(line, width)))
            .collect()
    };

    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title),
    );
    f.render_widget(list, area);
    render_scrollbar(f, area, scroll);
}
