// Timeline panel - the lineage browser
//
// Renders one timeline slot as a single list: the ancestor chain on top
// (most distant first, so older pages prepend above the viewport) and the
// descendant path below it. Selection walks rows; moving past the top row
// asks the app to fetch the next older page. The viewport anchor is
// preserved across prepends, and a stored scroll offset is re-applied once
// the first page of data is in.

use super::formatters::fit_to_width;
use super::scrollbar::render_scrollbar;
use crate::api::models::{ProfileId, ProfileSnapshot};
use crate::store::timeline::TimelineState;
use crate::tui::scroll::ScrollState;
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// What the panel wants the app to do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineAction {
    None,
    /// Viewport moved; the app persists the new offset.
    ScrollChanged,
    /// Selection pushed past the top edge; fetch the next older page.
    FetchOlder,
    /// Pivot the descendant path at the selected node.
    Shift { profile_id: ProfileId, index: usize },
}

pub struct TimelinePanel {
    pub scroll: ScrollState,
    /// Selected row (absolute index into the combined head+tail rows).
    pub selected: usize,
    /// Stored offset to re-apply once the slot has data.
    pending_restore: Option<u16>,
}

impl TimelinePanel {
    pub fn new() -> Self {
        Self {
            scroll: ScrollState::new(),
            selected: 0,
            pending_restore: None,
        }
    }

    /// Reset for a freshly entered slot, remembering a stored offset to
    /// restore once data arrives. Without one, a true first load lands at
    /// the bottom (most recent first).
    pub fn enter_slot(&mut self, stored_offset: Option<u16>) {
        self.scroll = ScrollState::new();
        self.selected = 0;
        self.pending_restore = stored_offset;
    }

    fn row_count(slot: &TimelineState) -> usize {
        slot.head.len() + slot.tail.len()
    }

    /// The profile behind an absolute row index. Head rows are displayed
    /// most-distant-first, so row 0 is the *last* fetched head entry.
    fn row_profile<'a>(slot: &'a TimelineState, row: usize) -> Option<&'a ProfileSnapshot> {
        if row < slot.head.len() {
            slot.head.get(slot.head.len() - 1 - row)
        } else {
            slot.tail.get(row - slot.head.len())
        }
    }

    /// An older page of `appended` entries landed: shift the anchor and
    /// the selection so the visible rows stay put, then apply any pending
    /// restore now that data exists.
    pub fn on_page_applied(&mut self, slot: &TimelineState, appended: usize) {
        if appended > 0 && !Self::is_first_content(slot, appended) {
            self.scroll.note_prepended(appended);
            self.selected = (self.selected + appended).min(Self::row_count(slot).saturating_sub(1));
        }
        if let Some(offset) = self.pending_restore.take() {
            self.scroll.restore(offset as usize);
            self.selected = offset as usize;
        } else if Self::is_first_content(slot, appended) {
            // True first load: bottom of the list, selection on the subject.
            self.selected = Self::row_count(slot).saturating_sub(1);
            self.scroll.scroll_to_bottom();
        }
    }

    fn is_first_content(slot: &TimelineState, appended: usize) -> bool {
        slot.head.len() == appended
    }

    /// Route a key; the slot is read-only here, mutations go through the
    /// returned action.
    pub fn handle_key(&mut self, key: KeyCode, slot: Option<&TimelineState>) -> TimelineAction {
        let Some(slot) = slot else {
            return TimelineAction::None;
        };
        let rows = Self::row_count(slot);

        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected == 0 {
                    // Pushing past the top edge pulls the next older page.
                    // The store's cursor and loading guard make repeats
                    // free while nothing new can be requested.
                    return TimelineAction::FetchOlder;
                }
                self.selected -= 1;
                self.scroll.ensure_visible(self.selected);
                TimelineAction::ScrollChanged
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if rows > 0 && self.selected + 1 < rows {
                    self.selected += 1;
                    self.scroll.ensure_visible(self.selected);
                }
                TimelineAction::ScrollChanged
            }
            KeyCode::PageUp => {
                self.selected = self.selected.saturating_sub(self.scroll.viewport().max(1));
                self.scroll.ensure_visible(self.selected);
                TimelineAction::ScrollChanged
            }
            KeyCode::PageDown => {
                if rows > 0 {
                    self.selected =
                        (self.selected + self.scroll.viewport().max(1)).min(rows - 1);
                    self.scroll.ensure_visible(self.selected);
                }
                TimelineAction::ScrollChanged
            }
            KeyCode::End => {
                if rows > 0 {
                    self.selected = rows - 1;
                    self.scroll.scroll_to_bottom();
                }
                TimelineAction::ScrollChanged
            }
            KeyCode::Enter => {
                let Some(profile) = Self::row_profile(slot, self.selected) else {
                    return TimelineAction::None;
                };
                let index = if self.selected < slot.head.len() {
                    // Pivoting at an ancestor replaces the whole path.
                    0
                } else {
                    // Pivoting at a tail node keeps it and replaces the
                    // chain below it.
                    self.selected - slot.head.len() + 1
                };
                TimelineAction::Shift {
                    profile_id: profile.id,
                    index,
                }
            }
            _ => TimelineAction::None,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, slot: Option<&TimelineState>, focused: bool) {
        let border = if focused { Color::Cyan } else { Color::DarkGray };

        let Some(slot) = slot else {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(" Timeline ");
            f.render_widget(
                List::new([ListItem::new("Please log in to browse your timeline.")
                    .style(Style::default().fg(Color::Yellow))]),
                block.inner(area),
            );
            f.render_widget(block, area);
            return;
        };

        let rows = Self::row_count(slot);
        let viewport = area.height.saturating_sub(2) as usize;
        self.scroll.update_dimensions(rows, viewport);
        self.selected = self.selected.min(rows.saturating_sub(1));

        let width = area.width.saturating_sub(4) as usize;
        let (start, end) = self.scroll.visible_range();
        let items: Vec<ListItem> = (start..end)
            .filter_map(|row| {
                let profile = Self::row_profile(slot, row)?;
                let in_tail = row >= slot.head.len();
                let line = if in_tail {
                    let depth = row - slot.head.len();
                    format!(
                        "{}└─ {}  ({} children)",
                        "  ".repeat(depth),
                        profile.name,
                        profile.children
                    )
                } else {
                    format!(
                        "{}  ·  influence {}  depth {}",
                        profile.name, profile.influence, profile.depth
                    )
                };
                let mut style = if in_tail {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                if row == self.selected && focused {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Some(ListItem::new(fit_to_width(&line, width)).style(style))
            })
            .collect();

        let title = match (slot.loading, &slot.error, slot.head_total) {
            (true, _, _) => " Timeline · loading page… ".to_string(),
            (_, Some(error), _) => format!(" Timeline · ⚠ {error} "),
            (_, None, Some(total)) => {
                let suffix = if slot.exhausted() { "all" } else { "partial" };
                format!(" Timeline · {}/{} ancestors ({suffix}) ", slot.head.len(), total)
            }
            _ => " Timeline ".to_string(),
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

impl Default for TimelinePanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::TimelinePage;
    use crate::store::timeline::TimelineStore;

    fn snapshot(id: ProfileId) -> ProfileSnapshot {
        ProfileSnapshot {
            id,
            name: format!("p{id}"),
            picture: None,
            children: 0,
            influence: 0,
            height: 0,
            weight: 0,
            depth: 0,
        }
    }

    fn page(ids: &[ProfileId], count: usize, more: bool, own: Option<ProfileId>) -> TimelinePage {
        TimelinePage {
            results: ids.iter().copied().map(snapshot).collect(),
            count,
            next: more.then(|| "next".into()),
            load: false,
            user_profile: own.map(snapshot),
        }
    }

    fn store_with_first_page() -> (TimelineStore, u64) {
        let mut store = TimelineStore::new();
        store.add_timeline(1, 100);
        let generation = match store.fetch_head(1).unwrap() {
            crate::events::Command::FetchTimelinePage { generation, .. } => generation,
            _ => unreachable!(),
        };
        store.apply_head_page(1, generation, 1, page(&[1, 2, 3], 6, true, Some(100)));
        (store, generation)
    }

    #[test]
    fn first_load_selects_the_subject_at_the_bottom() {
        let (store, _) = store_with_first_page();
        let mut panel = TimelinePanel::new();
        panel.enter_slot(None);
        panel.on_page_applied(store.get(1).unwrap(), 3);

        // 3 head rows + 1 tail row; selection on the last.
        assert_eq!(panel.selected, 3);
        assert!(panel.scroll.auto_follow);
    }

    #[test]
    fn older_page_shifts_selection_with_the_anchor() {
        let (mut store, _) = store_with_first_page();
        let mut panel = TimelinePanel::new();
        panel.enter_slot(None);
        panel.on_page_applied(store.get(1).unwrap(), 3);
        panel.selected = 1;

        let generation = match store.fetch_head(1).unwrap() {
            crate::events::Command::FetchTimelinePage { generation, .. } => generation,
            _ => unreachable!(),
        };
        store.apply_head_page(1, generation, 2, page(&[4, 5, 6], 6, false, None));
        panel.on_page_applied(store.get(1).unwrap(), 3);

        // Three rows landed above; same logical row stays selected.
        assert_eq!(panel.selected, 4);
    }

    #[test]
    fn stored_offset_is_restored_once_data_lands() {
        let (store, _) = store_with_first_page();
        let mut panel = TimelinePanel::new();
        panel.enter_slot(Some(2));
        panel.on_page_applied(store.get(1).unwrap(), 3);

        assert_eq!(panel.scroll.offset(), 2);
        assert!(!panel.scroll.auto_follow);
    }

    #[test]
    fn up_at_top_requests_an_older_page() {
        let (store, _) = store_with_first_page();
        let mut panel = TimelinePanel::new();
        panel.enter_slot(None);
        panel.on_page_applied(store.get(1).unwrap(), 3);
        panel.selected = 0;

        let action = panel.handle_key(KeyCode::Up, store.get(1));
        assert_eq!(action, TimelineAction::FetchOlder);
    }

    #[test]
    fn enter_on_tail_row_pivots_below_it() {
        let (store, _) = store_with_first_page();
        let mut panel = TimelinePanel::new();
        panel.enter_slot(None);
        panel.on_page_applied(store.get(1).unwrap(), 3);

        // Selection sits on the tail's subject row (index 3).
        let action = panel.handle_key(KeyCode::Enter, store.get(1));
        assert_eq!(
            action,
            TimelineAction::Shift {
                profile_id: 100,
                index: 1
            }
        );
    }

    #[test]
    fn enter_on_head_row_replaces_the_whole_path() {
        let (store, _) = store_with_first_page();
        let mut panel = TimelinePanel::new();
        panel.enter_slot(None);
        panel.on_page_applied(store.get(1).unwrap(), 3);
        panel.selected = 0; // Most distant ancestor (head row)

        let action = panel.handle_key(KeyCode::Enter, store.get(1));
        // Row 0 is the most distant ancestor = last head entry = id 3.
        assert_eq!(
            action,
            TimelineAction::Shift {
                profile_id: 3,
                index: 0
            }
        );
    }
}
