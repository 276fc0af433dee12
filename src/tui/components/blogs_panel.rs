// Blogs panel - per-category lists with optimistic like/share
//
// Tab cycles categories; l likes and s shares the selected post. Both
// reactions show immediately and settle (or roll back) when the server
// answers - the counts rendered here are whatever the store holds, so a
// rollback is visible without any panel logic.

use super::formatters::fit_to_width;
use super::scrollbar::render_scrollbar;
use crate::api::models::{Blog, BlogId, BlogKind};
use crate::store::cache::FetchStatus;
use crate::store::BlogStore;
use crate::tui::scroll::ScrollState;
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

const KINDS: [BlogKind; 3] = [BlogKind::News, BlogKind::Circle, BlogKind::Petition];

/// What the panel wants the app to do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlogAction {
    None,
    /// Category switched; fetch it if stale.
    KindChanged(BlogKind),
    Like(BlogKind, BlogId),
    Share(BlogKind, BlogId),
}

pub struct BlogsPanel {
    pub kind: BlogKind,
    pub scroll: ScrollState,
    pub selected: usize,
}

impl BlogsPanel {
    pub fn new() -> Self {
        Self {
            kind: BlogKind::News,
            scroll: ScrollState::new(),
            selected: 0,
        }
    }

    fn selected_blog(&self, store: &BlogStore) -> Option<BlogId> {
        store
            .cache(self.kind)
            .items()
            .nth(self.selected)
            .map(|b: &Blog| b.id)
    }

    pub fn handle_key(&mut self, key: KeyCode, store: &BlogStore) -> BlogAction {
        let count = store.cache(self.kind).len();
        match key {
            KeyCode::Tab => {
                let at = KINDS.iter().position(|k| *k == self.kind).unwrap_or(0);
                self.kind = KINDS[(at + 1) % KINDS.len()];
                self.selected = 0;
                self.scroll = ScrollState::new();
                BlogAction::KindChanged(self.kind)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                self.scroll.ensure_visible(self.selected);
                BlogAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if count > 0 && self.selected + 1 < count {
                    self.selected += 1;
                    self.scroll.ensure_visible(self.selected);
                }
                BlogAction::None
            }
            KeyCode::Char('l') => match self.selected_blog(store) {
                Some(id) => BlogAction::Like(self.kind, id),
                None => BlogAction::None,
            },
            KeyCode::Char('s') => match self.selected_blog(store) {
                Some(id) => BlogAction::Share(self.kind, id),
                None => BlogAction::None,
            },
            _ => BlogAction::None,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, store: &BlogStore, focused: bool) {
        let cache = store.cache(self.kind);
        let viewport = area.height.saturating_sub(2) as usize;
        self.scroll.update_dimensions(cache.len(), viewport);
        self.selected = self.selected.min(cache.len().saturating_sub(1));

        let width = area.width.saturating_sub(3) as usize;
        let items: Vec<ListItem> = if let Some(error) = &cache.error {
            vec![ListItem::new(format!("⚠ {error} (press r to retry)"))
                .style(Style::default().fg(Color::Red))]
        } else if cache.status == FetchStatus::Loading && cache.is_empty() {
            vec![ListItem::new("loading…").style(Style::default().fg(Color::DarkGray))]
        } else if cache.is_empty() {
            vec![ListItem::new("No posts in this category.")
                .style(Style::default().fg(Color::DarkGray))]
        } else {
            let (start, end) = self.scroll.visible_range();
            cache
                .items()
                .enumerate()
                .skip(start)
                .take(end - start)
                .map(|(i, blog)| {
                    let author = blog.author.as_deref().unwrap_or("anonymous");
                    let line = format!(
                        "{}  — {}  ♥ {}  ↗ {}",
                        blog.title, author, blog.likes, blog.shares
                    );
                    let mut style = Style::default();
                    if i == self.selected && focused {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    ListItem::new(fit_to_width(&line, width)).style(style)
                })
                .collect()
        };

        let border = if focused { Color::Cyan } else { Color::DarkGray };
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(format!(" Blogs · {} ", self.kind.label())),
        );
        f.render_widget(list, area);
        render_scrollbar(f, area, &self.scroll);
    }
}

impl Default for BlogsPanel {
    fn default() -> Self {
        Self::new()
    }
}
