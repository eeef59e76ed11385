//! TUI rendering module.
//!
//! This module paints the render model with ratatui:
//! - Chart panel: the four channel curves on a braille canvas, base-call
//!   ticks along the bottom, reference row along the top
//! - Sequence panel: the called sequence, wrapped, with the in-view portion
//!   highlighted
//! - Status bar with window/ceiling info and key hints
//!
//! All geometry and scaling decisions live in `render`; this module only
//! maps frame coordinates onto the canvas and picks terminal colors.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, Paragraph,
    },
    Frame,
};

use crate::model::{AppState, Channel, ChannelStyle};
use crate::render::{self, Mismatch, RenderModel, FRAME_Y_END};

/// Height of the sequence panel (including its border).
const SEQ_PANEL_HEIGHT: u16 = 8;
/// Height of the status bar.
const STATUS_BAR_HEIGHT: u16 = 1;

/// Splits the terminal into chart, sequence, and status areas. The
/// controller uses the same split to keep the mouse hit regions in sync with
/// what is painted.
pub fn panel_layout(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(SEQ_PANEL_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

/// Terminal color for a channel curve. The SVG palette maps onto terminal
/// colors; black strokes become yellow so the G channel stays visible on a
/// dark background.
fn channel_color(channel: Channel, style: &ChannelStyle) -> Color {
    if style.color.starts_with('#') {
        return Color::DarkGray;
    }
    let emphasized = style.width > 2.0;
    match channel {
        Channel::A if emphasized => Color::LightGreen,
        Channel::A => Color::Green,
        Channel::C if emphasized => Color::LightBlue,
        Channel::C => Color::Blue,
        Channel::G if emphasized => Color::LightYellow,
        Channel::G => Color::Yellow,
        Channel::T if emphasized => Color::LightRed,
        Channel::T => Color::Red,
    }
}

/// Renders the complete UI.
pub fn render(frame: &mut Frame, state: &AppState) {
    let (chart_area, seq_area, status_area) = panel_layout(frame.area());

    if let Some(message) = &state.error {
        render_error_panel(frame, message, chart_area);
        render_empty_sequence(frame, seq_area);
    } else if let Some(trace) = &state.trace {
        let model = render::build(trace, &state.viewport, &state.styles);
        render_chart(frame, state, &model, chart_area);
        render_sequence_panel(frame, state, seq_area);
    } else {
        let placeholder = Paragraph::new("No trace loaded.")
            .block(Block::default().borders(Borders::ALL).title("Trace"));
        frame.render_widget(placeholder, chart_area);
        render_empty_sequence(frame, seq_area);
    }

    render_status_bar(frame, state, status_area);
}

/// Paints a load/upload failure into the chart region.
fn render_error_panel(frame: &mut Frame, message: &str, area: Rect) {
    let width = area.width.saturating_sub(2).max(1) as usize;
    let lines: Vec<Line> = textwrap::wrap(message, width)
        .into_iter()
        .map(|l| Line::from(l.into_owned()))
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Error")
        .style(Style::default().fg(Color::Red));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_empty_sequence(frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Sequence");
    frame.render_widget(Paragraph::new("").block(block), area);
}

fn chart_title(state: &AppState, model: &RenderModel) -> String {
    let vp = &state.viewport;
    let len = state.trace.as_ref().map(|t| t.len()).unwrap_or(0);
    let mut title = format!(
        "Trace [{:.0}-{:.0}/{} | Y {:.0}]",
        vp.x_start, vp.x_end, len, vp.y_end
    );
    if let Some(ch) = state.highlight {
        title.push_str(&format!(" [{} highlighted]", ch.letter()));
    }
    if let Some(caption) = &model.ref_caption {
        title.push_str(&format!(" [{caption}]"));
    }
    if let Some((first, last)) = model.ref_coords {
        title.push_str(&format!(" [ref {first}..{last}]"));
    }
    title
}

/// Paints the chart canvas: curves, tick labels, and the reference row.
fn render_chart(frame: &mut Frame, state: &AppState, model: &RenderModel, area: Rect) {
    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(chart_title(state, model)),
        )
        .marker(symbols::Marker::Braille)
        .x_bounds([render::FRAME_X_START, render::FRAME_X_END])
        .y_bounds([render::FRAME_Y_START, FRAME_Y_END])
        .paint(|ctx| {
            for curve in &model.curves {
                let color = channel_color(curve.channel, &curve.style);
                for segment in &curve.segments {
                    for pair in segment.windows(2) {
                        ctx.draw(&CanvasLine {
                            x1: pair[0].x,
                            y1: FRAME_Y_END - pair[0].y,
                            x2: pair[1].x,
                            y2: FRAME_Y_END - pair[1].y,
                            color,
                        });
                    }
                }
            }

            ctx.layer();
            for tick in &model.y_ticks {
                ctx.print(
                    2.0,
                    FRAME_Y_END - tick.y,
                    Line::from(Span::styled(
                        render::format_tick_value(tick.value),
                        Style::default().fg(Color::DarkGray),
                    )),
                );
            }
            for tick in &model.x_ticks {
                ctx.print(
                    tick.x,
                    4.0,
                    Line::from(Span::styled(
                        tick.label.clone(),
                        Style::default().fg(Color::White),
                    )),
                );
            }
            if let Some(marks) = &model.ref_marks {
                for mark in marks {
                    let style = match mark.mismatch {
                        Some(Mismatch::Full) => Style::default()
                            .fg(Color::Red)
                            .add_modifier(Modifier::BOLD),
                        Some(Mismatch::Partial) => Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                        None => Style::default().fg(Color::Gray),
                    };
                    ctx.print(
                        mark.x,
                        FRAME_Y_END - 6.0,
                        Line::from(Span::styled(mark.base.to_string(), style)),
                    );
                }
            }
        });
    frame.render_widget(canvas, area);
}

/// Renders the called sequence, wrapped at the panel width, with the portion
/// currently inside the chart window highlighted.
fn render_sequence_panel(frame: &mut Frame, state: &AppState, area: Rect) {
    let Some(trace) = &state.trace else { return };
    let view = render::sequence_view(trace, &state.viewport);
    let wrap = area.width.saturating_sub(2).max(1) as usize;

    let in_view_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let out_style = Style::default().fg(Color::Gray);

    let mut lines: Vec<Line> = Vec::new();
    let mut spans: Vec<Span> = Vec::new();
    for (i, c) in view.annotated.chars().enumerate() {
        if i > 0 && i % wrap == 0 {
            lines.push(Line::from(std::mem::take(&mut spans)));
        }
        let style = if view.in_view.get(i).copied().unwrap_or(false) {
            in_view_style
        } else {
            out_style
        };
        spans.push(Span::styled(c.to_string(), style));
    }
    if !spans.is_empty() {
        lines.push(Line::from(spans));
    }

    let title = format!("Sequence [{} calls]", trace.call_count());
    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the status bar at the bottom.
fn render_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let message = state
        .status_message
        .as_deref()
        .unwrap_or("pan \u{2190}/\u{2192} p/n | zoom +/- wheel | peaks \u{2191}/\u{2193} | a/c/g/t highlight | e export | q quit");

    let position_info = match &state.trace {
        Some(trace) => format!(
            " {:.0}-{:.0}/{} ",
            state.viewport.x_start,
            state.viewport.x_end,
            trace.len()
        ),
        None => String::new(),
    };

    let left_content = format!(" {message} ");
    let left_len = left_content.len();
    let status_line = Line::from(vec![
        Span::styled(
            left_content,
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::styled(
            " ".repeat((area.width as usize).saturating_sub(left_len + position_info.len())),
            Style::default().bg(Color::Cyan),
        ),
        Span::styled(
            position_info,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    frame.render_widget(Paragraph::new(status_line), area);
}
