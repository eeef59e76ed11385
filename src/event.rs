//! Keyboard and mouse event handling.
//!
//! Navigation bindings:
//! - `Left`/`h`, `Right`/`l`: pan by a third of the window
//! - `PageUp`/`p`, `PageDown`/`n`: pan by a whole window
//! - `+`/`=`, `-`: zoom the trace axis in/out
//! - `Up`/`k`: bigger peaks (lower amplitude ceiling)
//! - `Down`/`j`: smaller peaks (higher amplitude ceiling)
//! - `a`/`c`/`g`/`t`: highlight one channel, `Esc`: restore all four
//! - `r`: reset the view to defaults
//! - `e`: export the chart as SVG
//! - `q` or `Ctrl+C`: quit
//!
//! Mouse, over the chart: drag to pan (drag right moves toward earlier
//! positions), wheel to zoom around the cursor. Over the sequence panel:
//! click-drag a range to recenter the chart on it.

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

use crate::model::{AppState, Channel, Direction};

/// Actions that can be triggered by user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action (input not recognized)
    None,
    /// Quit the application
    Quit,
    /// Pan backward by a whole window
    PanBackWindow,
    /// Pan forward by a whole window
    PanForwardWindow,
    /// Pan backward by a third of the window
    PanBackThird,
    /// Pan forward by a third of the window
    PanForwardThird,
    /// Zoom the trace axis in (3/4)
    ZoomXIn,
    /// Zoom the trace axis out (4/3)
    ZoomXOut,
    /// Lower the amplitude ceiling (bigger peaks)
    ZoomYIn,
    /// Raise the amplitude ceiling (smaller peaks)
    ZoomYOut,
    /// Emphasize one channel
    Highlight(Channel),
    /// Restore the neutral palette
    ClearHighlight,
    /// Reset window and palette to defaults
    ResetView,
    /// Write the chart as an SVG file
    ExportSvg,
    /// Terminal resized
    Resize(u16, u16),
    /// Start panning from this column
    BeginDrag(u16),
    /// Continue an active pan at this column
    DragTo(u16),
    /// Finish the active pan
    EndDrag,
    /// Wheel zoom anchored at this column
    Wheel { column: u16, zoom_in: bool },
    /// Start a sequence selection at this cell
    BeginSelect(u16, u16),
    /// Finish the sequence selection at this cell
    EndSelect(u16, u16),
}

/// Polls for input events with a timeout.
///
/// Returns `None` if no event occurred within the timeout.
pub fn poll_event(timeout: Duration) -> Option<Event> {
    if event::poll(timeout).ok()? {
        event::read().ok()
    } else {
        None
    }
}

/// Converts an input event to an Action. Mouse events are resolved against
/// the panel regions recorded in the state.
pub fn handle_event(event: Event, state: &AppState) -> Action {
    match event {
        Event::Key(key_event) => handle_key_event(key_event),
        Event::Mouse(mouse_event) => handle_mouse_event(mouse_event, state),
        Event::Resize(width, height) => Action::Resize(width, height),
        _ => Action::None,
    }
}

fn handle_key_event(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,

        // Pan a third of the window
        KeyCode::Left | KeyCode::Char('h') => Action::PanBackThird,
        KeyCode::Right | KeyCode::Char('l') => Action::PanForwardThird,

        // Pan a whole window
        KeyCode::PageUp | KeyCode::Char('p') => Action::PanBackWindow,
        KeyCode::PageDown | KeyCode::Char('n') => Action::PanForwardWindow,

        // Trace axis zoom
        KeyCode::Char('+') | KeyCode::Char('=') => Action::ZoomXIn,
        KeyCode::Char('-') => Action::ZoomXOut,

        // Amplitude ceiling
        KeyCode::Up | KeyCode::Char('k') => Action::ZoomYIn,
        KeyCode::Down | KeyCode::Char('j') => Action::ZoomYOut,

        // Channel highlighting
        KeyCode::Char('a') | KeyCode::Char('A') => Action::Highlight(Channel::A),
        KeyCode::Char('c') | KeyCode::Char('C') => Action::Highlight(Channel::C),
        KeyCode::Char('g') | KeyCode::Char('G') => Action::Highlight(Channel::G),
        KeyCode::Char('t') | KeyCode::Char('T') => Action::Highlight(Channel::T),
        KeyCode::Esc => Action::ClearHighlight,

        KeyCode::Char('r') => Action::ResetView,
        KeyCode::Char('e') => Action::ExportSvg,

        _ => Action::None,
    }
}

fn handle_mouse_event(mouse: MouseEvent, state: &AppState) -> Action {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if state.chart_panel.contains(column, row) {
                Action::BeginDrag(column)
            } else if state.seq_panel.contains(column, row) {
                Action::BeginSelect(column, row)
            } else {
                Action::None
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if state.drag.is_some() {
                Action::DragTo(column)
            } else {
                Action::None
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if state.drag.is_some() {
                Action::EndDrag
            } else if state.select_anchor.is_some() {
                Action::EndSelect(column, row)
            } else {
                Action::None
            }
        }
        MouseEventKind::ScrollUp if state.chart_panel.contains(column, row) => Action::Wheel {
            column,
            zoom_in: true,
        },
        MouseEventKind::ScrollDown if state.chart_panel.contains(column, row) => Action::Wheel {
            column,
            zoom_in: false,
        },
        _ => Action::None,
    }
}

/// Applies an action to the application state.
///
/// Returns `true` if the application should continue, `false` if it should
/// quit.
pub fn apply_action(state: &mut AppState, action: Action) -> bool {
    match action {
        Action::None => {}
        Action::Quit => {
            state.should_quit = true;
        }
        Action::PanBackWindow => {
            state.pan_window(Direction::Backward);
        }
        Action::PanForwardWindow => {
            state.pan_window(Direction::Forward);
        }
        Action::PanBackThird => {
            state.pan_third(Direction::Backward);
        }
        Action::PanForwardThird => {
            state.pan_third(Direction::Forward);
        }
        Action::ZoomXIn => {
            state.zoom_x_in();
        }
        Action::ZoomXOut => {
            state.zoom_x_out();
        }
        Action::ZoomYIn => {
            state.zoom_y_in();
        }
        Action::ZoomYOut => {
            state.zoom_y_out();
        }
        Action::Highlight(channel) => {
            state.set_highlight(Some(channel));
        }
        Action::ClearHighlight => {
            state.set_highlight(None);
        }
        Action::ResetView => {
            state.reset_view();
        }
        Action::ExportSvg => {
            state.export_requested = true;
        }
        Action::Resize(_, _) => {
            // Handled in the main loop with the actual terminal dimensions.
        }
        Action::BeginDrag(column) => {
            state.begin_drag(column);
        }
        Action::DragTo(column) => {
            state.drag_to(column);
        }
        Action::EndDrag => {
            state.end_drag();
        }
        Action::Wheel { column, zoom_in } => {
            state.wheel_zoom_at(column, zoom_in);
        }
        Action::BeginSelect(column, row) => {
            state.begin_select(column, row);
        }
        Action::EndSelect(column, row) => {
            state.end_select(column, row);
        }
    }

    !state.should_quit
}
