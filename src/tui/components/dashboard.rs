// Dashboard view content
//
// Live counters from the activity feed, connection status, and the
// signed-in user's milestones. The counters only ever move on a tagged
// frame; until the first one arrives they render as placeholders.

use super::formatters::format_compact_number;
use crate::events::{CounterKind, FeedStatus};
use crate::store::cache::FetchStatus;
use crate::tui::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Render the dashboard view
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    render_counters(f, rows[0], app);
    render_milestones(f, rows[1], app);
}

fn render_counters(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    counter_block(f, cols[0], app, CounterKind::ActiveUsers, app.active_users);
    counter_block(f, cols[1], app, CounterKind::Petitioners, app.petitioners);
}

fn counter_block(f: &mut Frame, area: Rect, app: &App, kind: CounterKind, value: Option<u64>) {
    let body = match value {
        Some(v) => format_compact_number(v),
        None => match &app.feed_status {
            FeedStatus::Error(err) => err.clone(),
            FeedStatus::Reconnecting { attempt, delay_ms } => {
                format!("reconnecting (attempt {attempt}, {delay_ms}ms)")
            }
            FeedStatus::Connecting => "…".to_string(),
            _ => "—".to_string(),
        },
    };

    let style = if value.is_some() {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let paragraph = Paragraph::new(Line::from(Span::styled(body, style)))
        .centered()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", kind.label())),
        );
    f.render_widget(paragraph, area);
}

fn render_milestones(f: &mut Frame, area: Rect, app: &App) {
    let cache = &app.milestones.cache;

    let items: Vec<ListItem> = if !app.session.identity.is_logged_in() {
        vec![ListItem::new("Please log in to see your milestones.")
            .style(Style::default().fg(Color::Yellow))]
    } else if let Some(error) = &cache.error {
        vec![ListItem::new(format!("⚠ {error} (press r to retry)"))
            .style(Style::default().fg(Color::Red))]
    } else if cache.status == FetchStatus::Loading && cache.is_empty() {
        vec![ListItem::new(format!("{} loading…", app.spinner()))]
    } else if cache.is_empty() {
        vec![ListItem::new("No milestones yet.").style(Style::default().fg(Color::DarkGray))]
    } else {
        cache
            .items()
            .map(|m| {
                let when = m
                    .achieved_at
                    .map(|at| at.format(" (%Y-%m-%d)").to_string())
                    .unwrap_or_default();
                ListItem::new(format!("★ {}{}", m.title, when))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Milestones "),
    );
    f.render_widget(list, area);
}
