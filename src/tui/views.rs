// View rendering - lays out the shell and dispatches to the active view

use crate::tui::app::{App, View};
use crate::tui::components::{self, dashboard};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Draw one frame
pub fn draw(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(5),    // Body
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    components::title_bar::render(f, rows[0], app);
    draw_body(f, rows[1], app);
    components::status_bar::render(f, rows[2], app);

    let full = f.area();
    if let Some(toast) = &app.toast {
        toast.render(f, full);
    }
}

fn draw_body(f: &mut Frame, area: Rect, app: &mut App) {
    match app.view {
        View::Dashboard => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(area);

            dashboard::render(f, parts[0], app);

            let entries = app.log_buffer.get_all();
            let focused = app.logs_focused;
            app.logs_panel.render(f, parts[1], &entries, focused);
        }
        View::Timeline => {
            let slot = app.timelines.get(app.current_timeline);
            app.timeline_panel.render(f, area, slot, true);
        }
        View::Circle => {
            app.circle_panel.render(f, area, &app.circle, true);
        }
        View::Blogs => {
            app.blogs_panel.render(f, area, &app.blogs, true);
        }
        View::Help => draw_help(f, area),
    }
}

fn draw_help(f: &mut Frame, area: Rect) {
    let text = "\n\
        \n  Views\n\
        \n    d / F1    Dashboard (live counters, milestones)\
        \n    t / F2    Timeline (lineage browser)\
        \n    c / F3    Circle (conversations, contacts)\
        \n    b / F4    Blogs\
        \n    ?         This help\n\
        \n  Timeline\n\
        \n    ↑ / ↓     Walk the lineage; pushing past the top loads older ancestors\
        \n    Enter     Pivot the descendant path at the selected person\n\
        \n  Everywhere\n\
        \n    Tab       Cycle panel / category focus\
        \n    r         Refresh the current view (forces past the cache window)\
        \n    X         Sign out (clears all local state)\
        \n    q         Quit\
        ";

    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help "),
    );
    f.render_widget(paragraph, area);
}
