//! Render-model computation.
//!
//! This module turns a trace plus a viewport into plain geometry: channel
//! polylines, axis ticks, reference-mismatch marks, and the sequence text
//! views. It knows nothing about terminals or SVG; the adapters in `ui` and
//! `render_svg` paint the model they are given. That split keeps all scaling
//! and windowing logic testable without any display substrate.

use crate::model::{Channel, ChannelStyle, Trace, Viewport};

/// The fixed frame the chart is scaled into, in abstract pixels.
/// Adapters map frame coordinates onto their own surface.
pub const FRAME_X_START: f64 = 0.0;
pub const FRAME_X_END: f64 = 1000.0;
pub const FRAME_Y_START: f64 = 0.0;
pub const FRAME_Y_END: f64 = 200.0;

/// Samples at or below this value mark a gap in the trace: the polyline is
/// broken there instead of interpolating across. The exact threshold is a
/// convention of capped/clipped trace exports; treated as a fixed contract.
pub const GAP_SENTINEL: f64 = -90.0;

/// A point in frame coordinates. `y` grows downward, like screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One channel's curve: contiguous polyline segments, broken at gaps.
#[derive(Debug, Clone)]
pub struct ChannelCurve {
    pub channel: Channel,
    pub style: ChannelStyle,
    pub segments: Vec<Vec<Point>>,
}

/// A base-call tick on the X axis.
#[derive(Debug, Clone, PartialEq)]
pub struct XTick {
    /// Frame X position.
    pub x: f64,
    /// Call character(s): primary, plus secondary when present.
    pub label: String,
    /// The instrument's call ordinal (the `n` of `"n:p"`).
    pub index: i64,
}

/// An intensity tick on the Y axis.
#[derive(Debug, Clone, PartialEq)]
pub struct YTick {
    /// Frame Y position.
    pub y: f64,
    /// Raw intensity value at this tick.
    pub value: f64,
}

/// How a base call disagrees with the aligned reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// Neither the primary nor the secondary call matches (red).
    Full,
    /// Exactly one of the two matches (orange).
    Partial,
}

/// Reference information for one visible base call.
#[derive(Debug, Clone, PartialEq)]
pub struct RefMark {
    /// Frame X position (same as the call's tick).
    pub x: f64,
    /// The reference character at this call.
    pub base: char,
    /// `None` on an exact match.
    pub mismatch: Option<Mismatch>,
}

/// Everything an adapter needs to paint the chart.
#[derive(Debug, Clone)]
pub struct RenderModel {
    /// The four channel curves, in A, C, G, T order.
    pub curves: Vec<ChannelCurve>,
    pub x_ticks: Vec<XTick>,
    pub y_ticks: Vec<YTick>,
    /// Per-call reference row; present iff the trace has an alignment.
    pub ref_marks: Option<Vec<RefMark>>,
    /// Reference coordinates of the first and last visible call. Present
    /// only when the trace carries both an orientation and an offset, and at
    /// least one call is visible.
    pub ref_coords: Option<(i64, i64)>,
    /// Chromosome/contig caption, with an orientation suffix when the trace
    /// carries one.
    pub ref_caption: Option<String>,
    /// The integer scan window that was painted.
    pub window: (usize, usize),
}

/// Sequence text in its two forms, plus the in-view flags for the annotated
/// form.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceView {
    /// Primary call characters, gaps retained. Position-accurate: character
    /// `i` belongs to `basecall_pos[i]`.
    pub annotated: String,
    /// Primary call characters with internal gap characters stripped; the
    /// form handed out for copying.
    pub copyable: String,
    /// For each annotated character, whether its scan position lies inside
    /// the window (inclusive on both edges).
    pub in_view: Vec<bool>,
}

/// Builds the render model for the current window.
pub fn build(trace: &Trace, viewport: &Viewport, styles: &[ChannelStyle; 4]) -> RenderModel {
    let (start, end) = viewport.paint_range(trace.len());
    let curves = Channel::ALL
        .iter()
        .map(|&ch| ChannelCurve {
            channel: ch,
            style: styles[ch.index()],
            segments: channel_segments(trace.channel(ch), start, end, viewport.y_end),
        })
        .collect();

    let (x_ticks, visible_ordinals) = basecall_ticks(trace, start, end);
    let ref_marks = trace.ref_align.as_ref().map(|align| {
        let ref_chars: Vec<char> = align.chars().collect();
        visible_ordinals
            .iter()
            .zip(&x_ticks)
            .map(|(&ord, tick)| ref_mark(trace, &ref_chars, ord, tick.x))
            .collect()
    });

    RenderModel {
        curves,
        x_ticks,
        y_ticks: intensity_ticks(viewport.y_end),
        ref_marks,
        ref_coords: ref_coords(trace, &visible_ordinals),
        ref_caption: ref_caption(trace),
        window: (start, end),
    }
}

/// Scales one channel into frame space, breaking at gap sentinels.
fn channel_segments(
    samples: &[Option<f64>],
    start: usize,
    end: usize,
    y_end: f64,
) -> Vec<Vec<Point>> {
    let mut segments = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let span = (end - start) as f64;

    for i in start..end.min(samples.len()) {
        // Absent samples are skipped without closing the segment.
        let Some(value) = samples[i] else { continue };
        if value <= GAP_SENTINEL {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            continue;
        }
        let ratio = (value / y_end).min(1.0);
        current.push(Point {
            x: scale_x((i - start) as f64, span),
            y: FRAME_Y_END - ratio * (FRAME_Y_END - FRAME_Y_START),
        });
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn scale_x(offset: f64, span: f64) -> f64 {
    FRAME_X_START + offset / span * (FRAME_X_END - FRAME_X_START)
}

/// Ticks for every base call strictly inside the painted window, plus the
/// call ordinals they belong to.
fn basecall_ticks(trace: &Trace, start: usize, end: usize) -> (Vec<XTick>, Vec<usize>) {
    let span = (end - start) as f64;
    let mut ticks = Vec::new();
    let mut ordinals = Vec::new();
    for (ord, (&pos, call)) in trace.basecall_pos.iter().zip(&trace.calls).enumerate() {
        let pos = pos as f64;
        if pos > start as f64 && pos < end as f64 {
            ticks.push(XTick {
                x: scale_x(pos - start as f64, span),
                label: call.tick_label(),
                index: call.index,
            });
            ordinals.push(ord);
        }
    }
    (ticks, ordinals)
}

fn ref_mark(trace: &Trace, ref_chars: &[char], ordinal: usize, x: f64) -> RefMark {
    let reference = ref_chars.get(ordinal).copied();
    let call = &trace.calls[ordinal];
    let primary_matches = reference == Some(call.primary);
    let secondary_matches = reference == Some(call.secondary_or_primary());
    let mismatch = if primary_matches && secondary_matches {
        None
    } else if primary_matches || secondary_matches {
        Some(Mismatch::Partial)
    } else {
        Some(Mismatch::Full)
    };
    RefMark {
        x,
        base: reference.unwrap_or(' '),
        mismatch,
    }
}

/// Y-axis ticks at a power-of-ten-derived step over `[0, y_end)`.
fn intensity_ticks(y_end: f64) -> Vec<YTick> {
    if !(y_end > 0.0) {
        return Vec::new();
    }
    let pow = 10f64.powf((y_end / 10.0).log10().floor());
    let step = (y_end / 10.0 / pow).floor() * pow;
    if !step.is_finite() || step <= 0.0 {
        return Vec::new();
    }

    let mut ticks = Vec::new();
    let mut i = 0u32;
    while (i as f64) * step < y_end {
        let value = i as f64 * step;
        ticks.push(YTick {
            y: FRAME_Y_END - value / y_end * (FRAME_Y_END - FRAME_Y_START),
            value,
        });
        i += 1;
    }
    ticks
}

/// Reference coordinates of the first and last visible call:
/// `refpos + index` forward, `refpos - index` reverse. An orientation with
/// no offset yields nothing rather than a nonsense label.
fn ref_coords(trace: &Trace, visible_ordinals: &[usize]) -> Option<(i64, i64)> {
    let forward = trace.forward?;
    let ref_pos = trace.ref_pos?;
    let first = *visible_ordinals.first()?;
    let last = *visible_ordinals.last()?;
    let first_idx = trace.calls[first].index;
    let last_idx = trace.calls[last].index;
    if forward {
        Some((ref_pos + first_idx, ref_pos + last_idx))
    } else {
        Some((ref_pos - first_idx, ref_pos - last_idx))
    }
}

fn ref_caption(trace: &Trace) -> Option<String> {
    let chr = trace.ref_chr.as_ref()?;
    let suffix = match trace.forward {
        Some(true) => " - forward",
        Some(false) => " - reverse",
        None => "",
    };
    Some(format!("{chr}{suffix}"))
}

/// Builds both sequence text forms and the in-view flags for the window.
pub fn sequence_view(trace: &Trace, viewport: &Viewport) -> SequenceView {
    let annotated: String = trace.calls.iter().map(|c| c.primary).collect();
    let copyable: String = annotated.chars().filter(|&c| c != '-').collect();
    let in_view = trace
        .basecall_pos
        .iter()
        .map(|&pos| {
            let pos = pos as f64;
            pos >= viewport.x_start && pos <= viewport.x_end
        })
        .collect();
    SequenceView {
        annotated,
        copyable,
        in_view,
    }
}

/// Formats a tick value the way it would be written by hand: integers bare,
/// anything else with its fraction kept.
pub fn format_tick_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_styles, BaseCall, Viewport};

    fn test_trace(len: usize) -> Trace {
        Trace {
            peaks: [
                (0..len).map(|i| Some(i as f64)).collect(),
                vec![Some(50.0); len],
                vec![Some(50.0); len],
                vec![Some(50.0); len],
            ],
            basecall_pos: vec![],
            calls: vec![],
            ref_align: None,
            ref_chr: None,
            ref_pos: None,
            forward: None,
        }
    }

    fn call(index: i64, primary: char, secondary: Option<char>) -> BaseCall {
        BaseCall {
            index,
            primary,
            secondary,
        }
    }

    fn window(x_start: f64, x_end: f64, y_end: f64) -> Viewport {
        Viewport {
            x_start,
            x_end,
            y_end,
        }
    }

    #[test]
    fn test_curves_cover_all_channels() {
        let trace = test_trace(100);
        let model = build(&trace, &window(0.0, 100.0, 2300.0), &default_styles());
        assert_eq!(model.curves.len(), 4);
        assert_eq!(model.curves[0].channel, Channel::A);
        assert_eq!(model.curves[3].channel, Channel::T);
        assert_eq!(model.window, (0, 100));
    }

    #[test]
    fn test_gap_sentinel_breaks_polyline() {
        let mut trace = test_trace(6);
        trace.peaks[0] = vec![
            Some(100.0),
            Some(100.0),
            Some(-99.0),
            Some(100.0),
            Some(100.0),
            Some(100.0),
        ];
        let model = build(&trace, &window(0.0, 6.0, 2300.0), &default_styles());
        let segments = &model.curves[0].segments;
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1].len(), 3);
    }

    #[test]
    fn test_absent_samples_skip_without_breaking() {
        let mut trace = test_trace(5);
        trace.peaks[0] = vec![Some(10.0), None, None, Some(20.0), Some(30.0)];
        let model = build(&trace, &window(0.0, 5.0, 2300.0), &default_styles());
        let segments = &model.curves[0].segments;
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 3);
    }

    #[test]
    fn test_amplitude_ratio_clamped_to_one() {
        let mut trace = test_trace(2);
        trace.peaks[0] = vec![Some(99999.0), Some(0.0)];
        let model = build(&trace, &window(0.0, 2.0, 2300.0), &default_styles());
        let points = &model.curves[0].segments[0];
        // Over-range intensity pins to the frame top.
        assert_eq!(points[0].y, FRAME_Y_START);
        // Zero intensity sits on the baseline.
        assert_eq!(points[1].y, FRAME_Y_END);
    }

    #[test]
    fn test_smaller_ceiling_renders_taller_peaks() {
        let mut trace = test_trace(1);
        trace.peaks[0] = vec![Some(500.0)];
        let styles = default_styles();
        let tall = build(&trace, &window(0.0, 1.0, 1000.0), &styles);
        let short = build(&trace, &window(0.0, 1.0, 2000.0), &styles);
        let height = |m: &RenderModel| FRAME_Y_END - m.curves[0].segments[0][0].y;
        assert!(height(&tall) > height(&short));
    }

    #[test]
    fn test_x_ticks_strictly_inside_window() {
        let mut trace = test_trace(100);
        trace.basecall_pos = vec![10, 20, 30];
        trace.calls = vec![call(1, 'A', None), call(2, 'C', None), call(3, 'G', None)];
        let model = build(&trace, &window(10.0, 30.0, 2300.0), &default_styles());
        // Positions equal to either edge are excluded.
        assert_eq!(model.x_ticks.len(), 1);
        assert_eq!(model.x_ticks[0].label, "C");
        assert_eq!(model.x_ticks[0].index, 2);
        assert_eq!(model.x_ticks[0].x, 500.0);
    }

    #[test]
    fn test_mismatch_marks() {
        // Reference "AC" against calls A/A and G/G: exact match then full
        // mismatch.
        let mut trace = test_trace(100);
        trace.basecall_pos = vec![10, 20];
        trace.calls = vec![call(1, 'A', Some('A')), call(2, 'G', Some('G'))];
        trace.ref_align = Some("AC".to_string());
        let model = build(&trace, &window(0.0, 100.0, 2300.0), &default_styles());
        let marks = model.ref_marks.unwrap();
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].mismatch, None);
        assert_eq!(marks[0].base, 'A');
        assert_eq!(marks[1].mismatch, Some(Mismatch::Full));
        assert_eq!(marks[1].base, 'C');
    }

    #[test]
    fn test_partial_mismatch_is_orange() {
        let mut trace = test_trace(100);
        trace.basecall_pos = vec![10];
        trace.calls = vec![call(1, 'A', Some('G'))];
        trace.ref_align = Some("A".to_string());
        let model = build(&trace, &window(0.0, 100.0, 2300.0), &default_styles());
        let marks = model.ref_marks.unwrap();
        assert_eq!(marks[0].mismatch, Some(Mismatch::Partial));
    }

    #[test]
    fn test_reference_exhausted_counts_as_full_mismatch() {
        let mut trace = test_trace(100);
        trace.basecall_pos = vec![10, 20];
        trace.calls = vec![call(1, 'A', None), call(2, 'C', None)];
        trace.ref_align = Some("A".to_string());
        let model = build(&trace, &window(0.0, 100.0, 2300.0), &default_styles());
        let marks = model.ref_marks.unwrap();
        assert_eq!(marks[1].mismatch, Some(Mismatch::Full));
        assert_eq!(marks[1].base, ' ');
    }

    #[test]
    fn test_ref_coords_forward_and_reverse() {
        let mut trace = test_trace(100);
        trace.basecall_pos = vec![10, 20, 30];
        trace.calls = vec![call(5, 'A', None), call(6, 'C', None), call(7, 'G', None)];
        trace.ref_pos = Some(100);
        trace.forward = Some(true);
        let model = build(&trace, &window(0.0, 100.0, 2300.0), &default_styles());
        assert_eq!(model.ref_coords, Some((105, 107)));

        trace.forward = Some(false);
        let model = build(&trace, &window(0.0, 100.0, 2300.0), &default_styles());
        assert_eq!(model.ref_coords, Some((95, 93)));
    }

    #[test]
    fn test_orientation_without_offset_yields_no_coords() {
        let mut trace = test_trace(100);
        trace.basecall_pos = vec![10];
        trace.calls = vec![call(5, 'A', None)];
        trace.forward = Some(true);
        let model = build(&trace, &window(0.0, 100.0, 2300.0), &default_styles());
        assert_eq!(model.ref_coords, None);
        assert_eq!(model.ref_caption, None);
    }

    #[test]
    fn test_caption_orientation_suffix() {
        let mut trace = test_trace(10);
        trace.ref_chr = Some("chr7".to_string());
        let model = build(&trace, &window(0.0, 10.0, 2300.0), &default_styles());
        assert_eq!(model.ref_caption.as_deref(), Some("chr7"));

        trace.forward = Some(true);
        let model = build(&trace, &window(0.0, 10.0, 2300.0), &default_styles());
        assert_eq!(model.ref_caption.as_deref(), Some("chr7 - forward"));

        trace.forward = Some(false);
        let model = build(&trace, &window(0.0, 10.0, 2300.0), &default_styles());
        assert_eq!(model.ref_caption.as_deref(), Some("chr7 - reverse"));
    }

    #[test]
    fn test_intensity_ticks_default_ceiling() {
        let ticks = intensity_ticks(2300.0);
        // 2300 / 10 = 230 -> step 200: ticks at 0, 200, ..., 2200.
        assert_eq!(ticks.len(), 12);
        assert_eq!(ticks[0].value, 0.0);
        assert_eq!(ticks[0].y, FRAME_Y_END);
        assert_eq!(ticks[1].value, 200.0);
        assert_eq!(ticks.last().unwrap().value, 2200.0);
    }

    #[test]
    fn test_intensity_ticks_small_ceiling() {
        let ticks = intensity_ticks(100.0);
        // step 10: 0..90.
        assert_eq!(ticks.len(), 10);
        assert_eq!(ticks[1].value, 10.0);
    }

    #[test]
    fn test_sequence_text_round_trip() {
        let mut trace = test_trace(10);
        trace.basecall_pos = vec![0, 1];
        trace.calls = vec![call(1, 'A', None), call(2, 'C', None)];
        let view = sequence_view(&trace, &window(0.0, 10.0, 2300.0));
        assert_eq!(view.copyable, "AC");
        assert_eq!(view.annotated, "AC");
    }

    #[test]
    fn test_sequence_gaps_stripped_only_from_copyable() {
        let mut trace = test_trace(10);
        trace.basecall_pos = vec![0, 1, 2];
        trace.calls = vec![call(1, 'A', None), call(2, '-', None), call(3, 'C', None)];
        let view = sequence_view(&trace, &window(0.0, 10.0, 2300.0));
        assert_eq!(view.annotated, "A-C");
        assert_eq!(view.copyable, "AC");
        assert_eq!(view.in_view.len(), 3);
    }

    #[test]
    fn test_in_view_flags_inclusive() {
        let mut trace = test_trace(100);
        trace.basecall_pos = vec![10, 20, 30, 40];
        trace.calls = vec![
            call(1, 'A', None),
            call(2, 'C', None),
            call(3, 'G', None),
            call(4, 'T', None),
        ];
        let view = sequence_view(&trace, &window(20.0, 30.0, 2300.0));
        assert_eq!(view.in_view, vec![false, true, true, false]);
    }

    #[test]
    fn test_format_tick_value() {
        assert_eq!(format_tick_value(200.0), "200");
        assert_eq!(format_tick_value(0.0), "0");
        assert_eq!(format_tick_value(2.5), "2.5");
    }
}
