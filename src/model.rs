//! Data model for the chromatogram viewer.
//!
//! This module contains all data structures for representing:
//! - The four-channel trace and its base calls
//! - Viewport state and navigation over the trace axis
//! - Channel display styles (highlighting)
//! - Application state
//!
//! Navigation operations are pure value transformations on `Viewport`, so the
//! whole window/zoom model can be unit tested without a terminal.

/// Default right edge of a freshly loaded window (trace indices).
pub const DEFAULT_X_END: f64 = 600.0;
/// Default amplitude ceiling. Intensities are divided by this value, so a
/// larger ceiling renders smaller peaks.
pub const DEFAULT_Y_END: f64 = 2300.0;

/// Minimum window span after button navigation.
pub const MIN_NAV_SPAN: f64 = 1.0;
/// Minimum window span after drag, wheel, or selection navigation.
pub const MIN_POINTER_SPAN: f64 = 10.0;

/// X-axis zoom factors (buttons).
pub const ZOOM_IN_FACTOR: f64 = 3.0 / 4.0;
pub const ZOOM_OUT_FACTOR: f64 = 4.0 / 3.0;
/// Wheel zoom factors (cursor-anchored).
pub const WHEEL_IN_FACTOR: f64 = 0.8;
pub const WHEEL_OUT_FACTOR: f64 = 1.25;
/// Margin applied around a sequence selection when focusing on it.
pub const SELECTION_MARGIN_FACTOR: f64 = 1.2;

/// One of the four trace channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    C,
    G,
    T,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::A, Channel::C, Channel::G, Channel::T];

    /// Index into per-channel tables (A=0, C=1, G=2, T=3).
    pub fn index(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::C => 1,
            Channel::G => 2,
            Channel::T => 3,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Channel::A => 'A',
            Channel::C => 'C',
            Channel::G => 'G',
            Channel::T => 'T',
        }
    }
}

/// Stroke color and width for one channel curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStyle {
    pub color: &'static str,
    pub width: f32,
}

/// Full-strength channel colors (A, C, G, T).
pub const STRONG_COLORS: [&str; 4] = ["green", "blue", "black", "red"];
/// Desaturated channel colors used while another channel is highlighted.
pub const FAINT_COLORS: [&str; 4] = ["#a6d3a6", "#a6a6ff", "#a6a6a6", "#ffa6a6"];

const NORMAL_WIDTH: f32 = 1.5;
const HIGHLIGHT_WIDTH: f32 = 2.5;

/// The neutral palette: all four channels full strength, equal weight.
pub fn default_styles() -> [ChannelStyle; 4] {
    let mut styles = [ChannelStyle {
        color: "",
        width: NORMAL_WIDTH,
    }; 4];
    for ch in Channel::ALL {
        styles[ch.index()].color = STRONG_COLORS[ch.index()];
    }
    styles
}

/// The palette with one channel emphasized and the rest desaturated.
pub fn highlight_styles(channel: Channel) -> [ChannelStyle; 4] {
    let mut styles = [ChannelStyle {
        color: "",
        width: NORMAL_WIDTH,
    }; 4];
    for ch in Channel::ALL {
        styles[ch.index()].color = FAINT_COLORS[ch.index()];
    }
    styles[channel.index()] = ChannelStyle {
        color: STRONG_COLORS[channel.index()],
        width: HIGHLIGHT_WIDTH,
    };
    styles
}

/// Direction of a pan operation along the trace axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// A single base call: the call ordinal reported by the instrument, the
/// primary nucleotide, and an optional secondary (ambiguous) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseCall {
    pub index: i64,
    pub primary: char,
    pub secondary: Option<char>,
}

impl BaseCall {
    /// The character(s) shown on the base-call axis tick: the primary call,
    /// followed by the secondary call when one is present.
    pub fn tick_label(&self) -> String {
        match self.secondary {
            Some(sec) => format!("{}{}", self.primary, sec),
            None => self.primary.to_string(),
        }
    }

    /// The secondary call, falling back to the primary when absent. Reference
    /// mismatches compare against both.
    pub fn secondary_or_primary(&self) -> char {
        self.secondary.unwrap_or(self.primary)
    }
}

/// A loaded chromatogram trace.
///
/// The four channel arrays are indexed by scan position; entries may be
/// absent (sparse payloads). `basecall_pos` and `calls` run in parallel and
/// are ordered by scan position. The reference fields are independently
/// optional; each gates its own piece of the rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Channel intensities, indexed by `Channel::index()`.
    pub peaks: [Vec<Option<f64>>; 4],
    /// Scan position of each base call, in call order.
    pub basecall_pos: Vec<usize>,
    /// The call at each entry of `basecall_pos`.
    pub calls: Vec<BaseCall>,
    /// Aligned reference string.
    pub ref_align: Option<String>,
    /// Chromosome / contig label of the reference.
    pub ref_chr: Option<String>,
    /// Reference start offset.
    pub ref_pos: Option<i64>,
    /// Orientation: `Some(true)` forward, `Some(false)` reverse, `None` when
    /// the payload carries no orientation at all.
    pub forward: Option<bool>,
}

impl Trace {
    /// Nominal trace length. The A channel is authoritative, matching how the
    /// window is clamped everywhere.
    pub fn len(&self) -> usize {
        self.peaks[Channel::A.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest addressable scan position, or -1.0 for an empty trace (the
    /// clamp skips its upper bound for negative values).
    pub fn max_x(&self) -> f64 {
        self.len() as f64 - 1.0
    }

    pub fn channel(&self, channel: Channel) -> &[Option<f64>] {
        &self.peaks[channel.index()]
    }

    /// Number of base calls.
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }
}

/// The visible window: `[x_start, x_end)` over scan positions plus the
/// amplitude ceiling `y_end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_start: f64,
    pub x_end: f64,
    pub y_end: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x_start: 0.0,
            x_end: DEFAULT_X_END,
            y_end: DEFAULT_Y_END,
        }
    }
}

impl Viewport {
    pub fn span(&self) -> f64 {
        self.x_end - self.x_start
    }

    /// Restores the window invariants after an operation.
    ///
    /// A left overshoot slides the whole window right; a right overshoot
    /// slides it left (start floored at 0), so the span is preserved wherever
    /// possible. `max_x < 0` (no trace) skips the upper bound.
    pub fn clamp(&mut self, max_x: f64) {
        if !self.x_start.is_finite() || !self.x_end.is_finite() {
            self.x_start = 0.0;
            self.x_end = 1.0;
        }
        if self.x_end <= self.x_start {
            self.x_end = self.x_start + MIN_NAV_SPAN;
        }
        if self.x_start < 0.0 {
            let d = -self.x_start;
            self.x_start = 0.0;
            self.x_end += d;
        }
        if max_x >= 0.0 && self.x_end > max_x {
            let over = self.x_end - max_x;
            self.x_start = (self.x_start - over).max(0.0);
            self.x_end = max_x;
        }
        if self.x_end - self.x_start < MIN_NAV_SPAN {
            self.x_end = self.x_start + MIN_NAV_SPAN;
        }
    }

    /// Shifts the window by its own width.
    pub fn pan_by_window(&mut self, direction: Direction) {
        let step = self.span();
        match direction {
            Direction::Backward => {
                self.x_start -= step;
                self.x_end -= step;
                if self.x_start < 0.0 {
                    self.x_start = 0.0;
                    self.x_end = step;
                }
            }
            Direction::Forward => {
                self.x_start += step;
                self.x_end += step;
            }
        }
    }

    /// Shifts the window by a third of its width. A left clamp restores the
    /// full pre-pan width at the origin.
    pub fn pan_by_third(&mut self, direction: Direction) {
        let old_step = self.span();
        let step = (old_step / 3.0).floor();
        match direction {
            Direction::Backward => {
                self.x_start -= step;
                self.x_end -= step;
                if self.x_start < 0.0 {
                    self.x_start = 0.0;
                    self.x_end = old_step;
                }
            }
            Direction::Forward => {
                self.x_start += step;
                self.x_end += step;
            }
        }
    }

    /// Rescales the window width around its center. `factor` is 3/4 for zoom
    /// in and 4/3 for zoom out; a left overshoot resets the window to
    /// `[0, step)`.
    pub fn zoom_x(&mut self, factor: f64) {
        let old_step = self.span();
        let center = self.x_start + old_step / 2.0;
        let step = (old_step * factor).floor();
        self.x_start = (center - step / 2.0).floor();
        self.x_end = (center + step / 2.0).floor();
        if self.x_start < 0.0 {
            self.x_start = 0.0;
            self.x_end = step;
        }
    }

    /// Rescales the amplitude ceiling. Intensities are divided by `y_end`, so
    /// a factor below 1 makes peaks taller.
    pub fn zoom_y(&mut self, factor: f64) {
        self.y_end *= factor;
    }

    /// Pans relative to the window captured when the drag started.
    ///
    /// Dragging right (`delta_cells > 0`) moves the window to earlier
    /// positions; the mapping is intentionally inverted, like grabbing the
    /// paper under a plotter pen.
    pub fn drag_from(&mut self, origin: Viewport, delta_cells: f64, width_cells: f64, max_x: f64) {
        if width_cells <= 0.0 {
            return;
        }
        let bases_per_cell = origin.span() / width_cells;
        if !bases_per_cell.is_finite() || bases_per_cell == 0.0 {
            return;
        }
        let delta_bases = delta_cells * bases_per_cell;

        let mut new_start = origin.x_start - delta_bases;
        let mut new_end = origin.x_end - delta_bases;
        if new_start < 0.0 {
            new_end -= new_start;
            new_start = 0.0;
        }
        if new_end > max_x {
            let over = new_end - max_x;
            new_start = (new_start - over).max(0.0);
            new_end = max_x;
        }
        if new_end - new_start < MIN_POINTER_SPAN {
            new_end = new_start + MIN_POINTER_SPAN;
        }

        self.x_start = new_start;
        self.x_end = new_end;
        self.clamp(max_x);
    }

    /// Zooms the window around the base under the cursor.
    ///
    /// `cursor_fraction` is the cursor's horizontal position over the chart,
    /// 0.0 at the left edge and 1.0 at the right edge. The base under the
    /// cursor stays (approximately) fixed.
    pub fn wheel_zoom(&mut self, cursor_fraction: f64, zoom_in: bool, max_x: f64) {
        let span = self.span();
        if span <= 0.0 {
            return;
        }
        let rel = cursor_fraction.clamp(0.0, 1.0);
        let pivot = self.x_start + rel * span;

        let factor = if zoom_in {
            WHEEL_IN_FACTOR
        } else {
            WHEEL_OUT_FACTOR
        };
        let mut new_span = span * factor;
        if new_span < MIN_POINTER_SPAN {
            new_span = MIN_POINTER_SPAN;
        }

        let mut new_start = pivot - rel * new_span;
        let mut new_end = new_start + new_span;
        if new_start < 0.0 {
            new_end -= new_start;
            new_start = 0.0;
        }
        if new_end > max_x {
            let over = new_end - max_x;
            new_start = (new_start - over).max(0.0);
            new_end = max_x;
        }
        if new_end - new_start < MIN_POINTER_SPAN {
            new_end = new_start + MIN_POINTER_SPAN;
        }

        self.x_start = new_start;
        self.x_end = new_end;
        self.clamp(max_x);
    }

    /// Centers the window on a selected base range with a 20% margin.
    pub fn focus_selection(&mut self, start_base: f64, end_base: f64, max_x: f64) {
        let selected = (end_base - start_base + 1.0).max(1.0);
        let span = (selected * SELECTION_MARGIN_FACTOR).max(MIN_POINTER_SPAN);
        let center = (start_base + end_base) / 2.0;
        self.x_start = center - span / 2.0;
        self.x_end = center + span / 2.0;
        self.clamp(max_x);
    }

    /// The integer scan range actually painted: `[s, e)` with
    /// `s = max(0, floor(x_start))` and `e = min(len, ceil(x_end))`,
    /// widened to one sample when it would collapse.
    pub fn paint_range(&self, len: usize) -> (usize, usize) {
        let s = self.x_start.floor().max(0.0) as usize;
        let mut e = (self.x_end.ceil() as usize).min(len);
        if e <= s {
            e = s + 1;
        }
        (s, e)
    }
}

/// An in-progress mouse drag over the chart.
#[derive(Debug, Clone, Copy)]
pub struct DragState {
    /// Column where the drag started.
    pub anchor_col: u16,
    /// Window at drag start; every motion pans relative to this.
    pub origin: Viewport,
}

/// Screen region of a panel, in terminal cells. Kept as plain numbers so the
/// model stays independent of the UI toolkit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelRegion {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl PanelRegion {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.x
            && column < self.x + self.width
            && row >= self.y
            && row < self.y + self.height
    }
}

/// The complete application state.
#[derive(Debug)]
pub struct AppState {
    /// The loaded trace, if any.
    pub trace: Option<Trace>,
    /// Current window over the trace axis.
    pub viewport: Viewport,
    /// Per-channel stroke styles.
    pub styles: [ChannelStyle; 4],
    /// Currently emphasized channel.
    pub highlight: Option<Channel>,
    /// Load/upload failure shown in the error region. Set only after the
    /// previous results have been cleared.
    pub error: Option<String>,
    /// Transient status line message.
    pub status_message: Option<String>,
    /// Whether the application should quit.
    pub should_quit: bool,
    /// Set by the export action; the controller performs the write.
    pub export_requested: bool,
    /// Active chart drag, if any.
    pub drag: Option<DragState>,
    /// First endpoint of an in-progress sequence selection (call ordinal).
    pub select_anchor: Option<usize>,
    /// Chart panel region, updated on resize.
    pub chart_panel: PanelRegion,
    /// Sequence panel region, updated on resize.
    pub seq_panel: PanelRegion,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            trace: None,
            viewport: Viewport::default(),
            styles: default_styles(),
            highlight: None,
            error: None,
            status_message: None,
            should_quit: false,
            export_requested: false,
            drag: None,
            select_anchor: None,
            chart_panel: PanelRegion::default(),
            seq_panel: PanelRegion::default(),
        }
    }

    /// Installs a freshly loaded trace and resets the view to defaults.
    pub fn load_trace(&mut self, trace: Trace) {
        self.viewport = Viewport::default();
        self.styles = default_styles();
        self.highlight = None;
        self.error = None;
        self.status_message = None;
        self.drag = None;
        self.select_anchor = None;
        self.viewport.clamp(trace.max_x());
        self.trace = Some(trace);
    }

    /// Clears the current results and shows a load/upload failure instead.
    pub fn set_error(&mut self, message: String) {
        self.trace = None;
        self.viewport = Viewport::default();
        self.styles = default_styles();
        self.highlight = None;
        self.drag = None;
        self.select_anchor = None;
        self.error = Some(message);
    }

    fn max_x(&self) -> f64 {
        self.trace.as_ref().map(Trace::max_x).unwrap_or(-1.0)
    }

    /// Resets the window to defaults and the palette to neutral.
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::default();
        self.viewport.clamp(self.max_x());
        self.styles = default_styles();
        self.highlight = None;
    }

    pub fn pan_window(&mut self, direction: Direction) {
        self.viewport.pan_by_window(direction);
        self.viewport.clamp(self.max_x());
    }

    pub fn pan_third(&mut self, direction: Direction) {
        self.viewport.pan_by_third(direction);
        self.viewport.clamp(self.max_x());
    }

    pub fn zoom_x_in(&mut self) {
        self.viewport.zoom_x(ZOOM_IN_FACTOR);
        self.viewport.clamp(self.max_x());
    }

    pub fn zoom_x_out(&mut self) {
        self.viewport.zoom_x(ZOOM_OUT_FACTOR);
        self.viewport.clamp(self.max_x());
    }

    pub fn zoom_y_in(&mut self) {
        self.viewport.zoom_y(ZOOM_IN_FACTOR);
    }

    pub fn zoom_y_out(&mut self) {
        self.viewport.zoom_y(ZOOM_OUT_FACTOR);
    }

    pub fn set_highlight(&mut self, channel: Option<Channel>) {
        self.highlight = channel;
        self.styles = match channel {
            Some(ch) => highlight_styles(ch),
            None => default_styles(),
        };
    }

    pub fn begin_drag(&mut self, column: u16) {
        if self.trace.is_none() {
            return;
        }
        self.drag = Some(DragState {
            anchor_col: column,
            origin: self.viewport,
        });
    }

    pub fn drag_to(&mut self, column: u16) {
        let Some(drag) = self.drag else { return };
        let width = self.chart_panel.width.saturating_sub(2);
        let delta = column as f64 - drag.anchor_col as f64;
        let max_x = self.max_x();
        self.viewport
            .drag_from(drag.origin, delta, width as f64, max_x);
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn wheel_zoom_at(&mut self, column: u16, zoom_in: bool) {
        if self.trace.is_none() {
            return;
        }
        let width = self.chart_panel.width.saturating_sub(2);
        if width == 0 {
            return;
        }
        let rel_col = column.saturating_sub(self.chart_panel.x + 1);
        let fraction = rel_col as f64 / width as f64;
        let max_x = self.max_x();
        self.viewport.wheel_zoom(fraction, zoom_in, max_x);
    }

    /// Maps a cell inside the sequence panel to a base-call ordinal, taking
    /// the wrapped layout into account.
    pub fn sequence_ordinal_at(&self, column: u16, row: u16) -> Option<usize> {
        let trace = self.trace.as_ref()?;
        if !self.seq_panel.contains(column, row) {
            return None;
        }
        let wrap = self.seq_panel.width.saturating_sub(2) as usize;
        if wrap == 0 {
            return None;
        }
        let inner_col = column.checked_sub(self.seq_panel.x + 1)? as usize;
        let inner_row = row.checked_sub(self.seq_panel.y + 1)? as usize;
        if inner_col >= wrap {
            return None;
        }
        let ordinal = inner_row * wrap + inner_col;
        (ordinal < trace.call_count()).then_some(ordinal)
    }

    pub fn begin_select(&mut self, column: u16, row: u16) {
        self.select_anchor = self.sequence_ordinal_at(column, row);
    }

    /// Completes a sequence selection and recenters the chart on it.
    pub fn end_select(&mut self, column: u16, row: u16) {
        let Some(anchor) = self.select_anchor.take() else {
            return;
        };
        let Some(end) = self.sequence_ordinal_at(column, row) else {
            return;
        };
        let Some(trace) = self.trace.as_ref() else {
            return;
        };
        let (first, last) = if anchor <= end {
            (anchor, end)
        } else {
            (end, anchor)
        };
        let start_base = trace.basecall_pos[first] as f64;
        let end_base = trace.basecall_pos[last] as f64;
        let max_x = trace.max_x();
        self.viewport.focus_selection(start_base, end_base, max_x);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
