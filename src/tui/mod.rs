// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks, sync events)
// - Rendering the UI
//
// Every input event also feeds the live connection's inactivity clock, so
// the socket is torn down only after a genuinely idle stretch.

pub mod app;
pub mod components;
pub mod layout;
pub mod scroll;
pub mod views;

use crate::events::SyncEvent;
use anyhow::{Context, Result};
use app::{App, View};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the TUI
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// when done. Blocks until the user quits.
pub async fn run_tui(mut app: App, mut sync_rx: mpsc::Receiver<SyncEvent>) -> Result<()> {
    // Set up terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Run the on-mount effects for the initial view (opens the live feed)
    app.enter_view();

    let result = run_event_loop(&mut terminal, &mut app, &mut sync_rx).await;

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Waits on three sources with tokio::select!: keyboard/mouse input,
/// periodic ticks for redraw and animation, and completed background work
/// from the sync layer.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    sync_rx: &mut mpsc::Receiver<SyncEvent>,
) -> Result<()> {
    // Periodic redraws (5 FPS is enough for counters and spinners)
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| views::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            // Keyboard or mouse input
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key_event)) => handle_key_event(app, key_event),
                        Ok(Event::Mouse(mouse_event)) => handle_mouse_event(app, mouse_event),
                        _ => {}
                    }
                }
            } => {}

            // Periodic tick for redrawing
            _ = tick_interval.tick() => {
                app.tick_animation();
            }

            // Completed background work
            Some(sync_event) = sync_rx.recv() => {
                app.apply_sync(sync_event);
                // Drain whatever else is already queued before redrawing
                while let Ok(sync_event) = sync_rx.try_recv() {
                    app.apply_sync(sync_event);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle keyboard input
/// Layered dispatch: global keys first, then the focused panel.
fn handle_key_event(app: &mut App, key_event: KeyEvent) {
    if key_event.kind != KeyEventKind::Press {
        return;
    }

    // Any keystroke counts as user activity for the feed's idle clock.
    app.touch_feed();

    if handle_global_keys(app, &key_event) {
        return;
    }

    app.handle_panel_key(key_event.code);
}

/// Handle global keys - returns true if handled
/// Global keys work the same regardless of current view.
fn handle_global_keys(app: &mut App, key_event: &KeyEvent) -> bool {
    match key_event.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Char('Q') => {
            if !app.should_debounce_action() {
                app.should_quit = true;
            }
            true
        }
        // View switching - F-keys (primary) and letter shortcuts
        KeyCode::F(1) | KeyCode::Char('d') | KeyCode::Char('D') => {
            app.set_view(View::Dashboard);
            true
        }
        KeyCode::F(2) | KeyCode::Char('t') | KeyCode::Char('T') => {
            app.set_view(View::Timeline);
            true
        }
        KeyCode::F(3) | KeyCode::Char('c') | KeyCode::Char('C') => {
            app.set_view(View::Circle);
            true
        }
        KeyCode::F(4) | KeyCode::Char('b') | KeyCode::Char('B') => {
            app.set_view(View::Blogs);
            true
        }
        // Help
        KeyCode::Char('?') => {
            app.set_view(View::Help);
            true
        }
        KeyCode::Esc => {
            if app.view == View::Help {
                app.set_view(View::Dashboard);
                return true;
            }
            false
        }
        // Refresh (forces past freshness windows)
        KeyCode::Char('r') | KeyCode::Char('R') => {
            if !app.should_debounce_action() {
                app.refresh_current_view();
            }
            true
        }
        // Sign out (explicit clear of every store)
        KeyCode::Char('X') => {
            if !app.should_debounce_action() {
                app.logout();
            }
            true
        }
        _ => false,
    }
}

/// Handle mouse input - wheel scrolling routes to the focused panel, and
/// any pointer motion feeds the inactivity clock.
fn handle_mouse_event(app: &mut App, mouse_event: MouseEvent) {
    app.touch_feed();

    match mouse_event.kind {
        MouseEventKind::ScrollUp => app.handle_panel_key(KeyCode::Up),
        MouseEventKind::ScrollDown => app.handle_panel_key(KeyCode::Down),
        _ => {}
    }
}
