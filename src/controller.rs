//! Application controller.
//!
//! This module orchestrates the main application loop:
//! - Terminal initialization and cleanup (raw mode, alternate screen, mouse
//!   capture)
//! - Event polling and handling
//! - State updates and rendering
//! - The SVG export side effect requested from the event layer

use std::fs::File;
use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use crate::event::{apply_action, handle_event, poll_event, Action};
use crate::model::{AppState, PanelRegion};
use crate::render;
use crate::render_svg;
use crate::ui;

/// The main application controller.
pub struct App {
    /// Terminal backend
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Application state
    state: AppState,
    /// Event poll timeout
    tick_rate: Duration,
}

impl App {
    /// Creates a new application with the given state.
    pub fn new(state: AppState) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            state,
            tick_rate: Duration::from_millis(50),
        })
    }

    /// Runs the main application loop.
    pub fn run(&mut self) -> Result<()> {
        self.update_panel_regions()?;

        loop {
            self.terminal.draw(|frame| {
                ui::render(frame, &self.state);
            })?;

            if let Some(event) = poll_event(self.tick_rate) {
                let action = handle_event(event, &self.state);

                // Handle resize specially to refresh the mouse hit regions.
                if let Action::Resize(_, _) = action {
                    self.update_panel_regions()?;
                }

                apply_action(&mut self.state, action);

                if self.state.export_requested {
                    self.state.export_requested = false;
                    export_chart(&mut self.state);
                }

                if self.state.should_quit {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Recomputes the panel regions from the terminal dimensions, using the
    /// same split the renderer uses.
    fn update_panel_regions(&mut self) -> Result<()> {
        let size = self.terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        let (chart, seq, _) = ui::panel_layout(area);
        self.state.chart_panel = region_from(chart);
        self.state.seq_panel = region_from(seq);
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Restore terminal
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

fn region_from(rect: Rect) -> PanelRegion {
    PanelRegion {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
    }
}

/// Writes the current chart as an SVG file next to the working directory.
/// Failures land in the status line; the viewer keeps running.
fn export_chart(state: &mut AppState) {
    let Some(trace) = &state.trace else {
        state.status_message = Some("No trace to export".to_string());
        return;
    };
    let model = render::build(trace, &state.viewport, &state.styles);
    let filename = format!("trace-{:08x}.svg", rand::random::<u32>());
    let result = File::create(&filename).and_then(|file| render_svg::write_chart(file, &model));
    state.status_message = Some(match result {
        Ok(()) => {
            log::info!("exported chart to {filename}");
            format!("Wrote {filename}")
        }
        Err(err) => {
            log::warn!("chart export failed: {err}");
            format!("Export failed: {err}")
        }
    });
}

/// Convenience function to run the application with a prepared state.
pub fn run_app(state: AppState) -> Result<()> {
    let mut app = App::new(state)?;
    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_conversion() {
        let region = region_from(Rect::new(2, 3, 40, 10));
        assert_eq!(
            region,
            PanelRegion {
                x: 2,
                y: 3,
                width: 40,
                height: 10
            }
        );
        assert!(region.contains(2, 3));
        assert!(region.contains(41, 12));
        assert!(!region.contains(42, 12));
    }

    #[test]
    fn test_export_without_trace_sets_status() {
        let mut state = AppState::new();
        export_chart(&mut state);
        assert_eq!(state.status_message.as_deref(), Some("No trace to export"));
    }
}
