//! Terminal User Interface for TrueTrack
//!
//! Customer verification, the retailer and admin dashboards, and the home
//! page single-use demo, all driven from one event loop.

pub mod app;
pub mod components;
pub mod event;
pub mod nav;
pub mod ui;

use anyhow::{Context, Result};
use clap::Args;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, prelude::*, Terminal};
use std::io::stdout;
use std::sync::Arc;
use truetrack::Settings;
use truetrack_audit::AuditWriter;

use crate::cli::error::HelpfulError;
use crate::cli::tui::app::App;
use crate::cli::tui::event::{Event, EventHandler};

/// TUI command arguments
#[derive(Debug, Args)]
pub struct TuiArgs {
    /// Refuse camera access, as if the permission prompt was declined
    #[arg(long)]
    pub deny_camera: bool,
}

/// Run the TUI
pub async fn run(args: TuiArgs, audit: Option<Arc<AuditWriter>>) -> Result<()> {
    // Settings errors are reported before the terminal is taken over.
    let mut settings = Settings::load().map_err(HelpfulError::from)?;
    if args.deny_camera {
        settings.camera.deny_permission = true;
    }

    enable_raw_mode().context("failed to enable raw terminal mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter the alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, audit);
    let mut events = EventHandler::new(std::time::Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    // The camera must not outlive the screen that asked for it.
    app.teardown_scan();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Run the application loop
async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        match events.next().await {
            Some(Event::Key(key)) => app.handle_key(key),
            Some(Event::Tick) => app.tick().await,
            Some(Event::Resize(_, _)) => {}
            None => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_app_starts_in_home_mode() {
        let app = App::new(Settings::default(), None);
        assert!(matches!(app.mode, app::TuiMode::Home));
        assert!(app.running);
    }

    #[test]
    fn test_app_renders_without_panic() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        let app = App::new(Settings::default(), None);
        terminal.draw(|frame| ui::draw(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        assert_eq!(buffer.area.width, 80);
        assert_eq!(buffer.area.height, 24);
    }
}
