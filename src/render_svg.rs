//! SVG chart adapter.
//!
//! Paints a `RenderModel` into an `svg::Document`: four channel polylines,
//! the two axes with their ticks, the reference row, and the channel legend.
//! All geometry comes from the render model; this module only lays the frame
//! margins around it.

use std::io::{self, Write};

use svg::node::element::{Line, Polyline, Rectangle, Text};
use svg::Document;

use crate::model::STRONG_COLORS;
use crate::render::{
    format_tick_value, Mismatch, RenderModel, FRAME_X_END, FRAME_X_START, FRAME_Y_END,
    FRAME_Y_START,
};

const WIDTH: f64 = 1200.0;
/// Chart height without / with the reference row.
const HEIGHT: f64 = 300.0;
const HEIGHT_WITH_REF: f64 = 360.0;
/// Axis lines sit just outside the frame.
const AXIS_GAP: f64 = 5.0;

const FONT: &str = "Arial";

/// Builds the SVG document for a render model.
pub fn document(model: &RenderModel) -> Document {
    let height = if model.ref_marks.is_some() {
        HEIGHT_WITH_REF
    } else {
        HEIGHT
    };
    let mut doc = Document::new()
        .set("width", WIDTH)
        .set("height", height)
        .set("viewBox", (-60.0, -40.0, WIDTH, height));

    doc = add_axes(doc);
    doc = add_curves(doc, model);
    doc = add_x_ticks(doc, model);
    doc = add_y_ticks(doc, model);
    doc = add_reference(doc, model);
    add_legend(doc)
}

/// Writes the chart for a render model to any writer.
pub fn write_chart<W: Write>(target: W, model: &RenderModel) -> io::Result<()> {
    svg::write(target, &document(model))
}

fn add_axes(doc: Document) -> Document {
    let x0 = FRAME_X_START - AXIS_GAP;
    let x1 = FRAME_X_END + AXIS_GAP;
    let y0 = FRAME_Y_START - AXIS_GAP;
    let y1 = FRAME_Y_END + AXIS_GAP;
    doc.add(
        Line::new()
            .set("x1", x0)
            .set("y1", y1)
            .set("x2", x1)
            .set("y2", y1)
            .set("stroke", "black")
            .set("stroke-width", 2)
            .set("stroke-linecap", "square"),
    )
    .add(
        Line::new()
            .set("x1", x0)
            .set("y1", y0)
            .set("x2", x0)
            .set("y2", y1)
            .set("stroke", "black")
            .set("stroke-width", 2)
            .set("stroke-linecap", "square"),
    )
}

fn add_curves(mut doc: Document, model: &RenderModel) -> Document {
    for curve in &model.curves {
        for segment in &curve.segments {
            let points = segment
                .iter()
                .map(|p| format!("{},{}", p.x, p.y))
                .collect::<Vec<_>>()
                .join(" ");
            doc = doc.add(
                Polyline::new()
                    .set("fill", "none")
                    .set("stroke-linejoin", "round")
                    .set("stroke", curve.style.color)
                    .set("stroke-width", curve.style.width)
                    .set("points", points),
            );
        }
    }
    doc
}

fn add_x_ticks(mut doc: Document, model: &RenderModel) -> Document {
    let axis_y = FRAME_Y_END + AXIS_GAP;
    for tick in &model.x_ticks {
        doc = doc.add(
            Line::new()
                .set("x1", tick.x)
                .set("y1", axis_y)
                .set("x2", tick.x)
                .set("y2", axis_y + 7.0)
                .set("stroke", "black")
                .set("stroke-width", 2),
        );
        let (tx, ty) = (tick.x + 3.0, axis_y + 11.0);
        doc = doc.add(
            Text::new(format!("{}:{}", tick.index, tick.label))
                .set("x", tx)
                .set("y", ty)
                .set("font-family", FONT)
                .set("font-size", 10)
                .set("fill", "black")
                .set("text-anchor", "end")
                .set("transform", format!("rotate(-90 {tx},{ty})")),
        );
    }
    doc
}

fn add_y_ticks(mut doc: Document, model: &RenderModel) -> Document {
    let axis_x = FRAME_X_START - AXIS_GAP;
    for tick in &model.y_ticks {
        doc = doc.add(
            Line::new()
                .set("x1", axis_x)
                .set("y1", tick.y)
                .set("x2", axis_x - 7.0)
                .set("y2", tick.y)
                .set("stroke", "black")
                .set("stroke-width", 2),
        );
        doc = doc.add(
            Text::new(format_tick_value(tick.value))
                .set("x", axis_x - 11.0)
                .set("y", tick.y + 3.0)
                .set("font-family", FONT)
                .set("font-size", 10)
                .set("fill", "black")
                .set("text-anchor", "end"),
        );
    }
    doc
}

fn add_reference(mut doc: Document, model: &RenderModel) -> Document {
    let row_y = FRAME_Y_END + AXIS_GAP + 63.0;
    if let Some(marks) = &model.ref_marks {
        for mark in marks {
            if let Some(mismatch) = mark.mismatch {
                let color = match mismatch {
                    Mismatch::Full => "red",
                    Mismatch::Partial => "orange",
                };
                doc = doc.add(
                    Rectangle::new()
                        .set("x", mark.x - 5.0)
                        .set("y", row_y)
                        .set("width", 10)
                        .set("height", 10)
                        .set("fill", color)
                        .set("stroke", color)
                        .set("stroke-width", 3),
                );
            }
            doc = doc.add(
                Text::new(mark.base.to_string())
                    .set("x", mark.x + 3.0)
                    .set("y", row_y + 8.0)
                    .set("font-family", FONT)
                    .set("font-size", 10)
                    .set("fill", "black")
                    .set("text-anchor", "end"),
            );
        }
    }
    if let Some((first, last)) = model.ref_coords {
        doc = doc
            .add(
                Text::new(first.to_string())
                    .set("x", FRAME_X_START - AXIS_GAP)
                    .set("y", row_y + 8.0)
                    .set("font-family", FONT)
                    .set("font-size", 10)
                    .set("fill", "black")
                    .set("text-anchor", "end"),
            )
            .add(
                Text::new(last.to_string())
                    .set("x", FRAME_X_END + AXIS_GAP)
                    .set("y", row_y + 8.0)
                    .set("font-family", FONT)
                    .set("font-size", 10)
                    .set("fill", "black")
                    .set("text-anchor", "start"),
            );
    }
    if let Some(caption) = &model.ref_caption {
        doc = doc.add(
            Text::new(caption.clone())
                .set("x", (FRAME_X_START + FRAME_X_END) / 2.0)
                .set("y", FRAME_Y_END + AXIS_GAP + 100.0)
                .set("font-family", FONT)
                .set("font-size", 15)
                .set("fill", "black")
                .set("text-anchor", "middle"),
        );
    }
    doc
}

fn add_legend(mut doc: Document) -> Document {
    for (i, (letter, color)) in ["A", "C", "G", "T"].iter().zip(STRONG_COLORS).enumerate() {
        let x = 400.0 + i as f64 * 50.0;
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", -20)
                    .set("width", 10)
                    .set("height", 10)
                    .set("fill", color)
                    .set("stroke", color)
                    .set("stroke-width", 3),
            )
            .add(
                Text::new(*letter)
                    .set("x", x + 17.0)
                    .set("y", -9)
                    .set("font-family", FONT)
                    .set("font-size", 18)
                    .set("fill", "black"),
            );
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_styles, BaseCall, Trace, Viewport};
    use crate::render;

    fn sample_trace() -> Trace {
        Trace {
            peaks: [
                vec![Some(100.0); 50],
                vec![Some(200.0); 50],
                vec![Some(300.0); 50],
                vec![Some(400.0); 50],
            ],
            basecall_pos: vec![10, 25, 40],
            calls: vec![
                BaseCall {
                    index: 1,
                    primary: 'A',
                    secondary: None,
                },
                BaseCall {
                    index: 2,
                    primary: 'C',
                    secondary: Some('T'),
                },
                BaseCall {
                    index: 3,
                    primary: 'G',
                    secondary: None,
                },
            ],
            ref_align: None,
            ref_chr: None,
            ref_pos: None,
            forward: None,
        }
    }

    fn render_to_string(trace: &Trace) -> String {
        let vp = Viewport {
            x_start: 0.0,
            x_end: 50.0,
            y_end: 2300.0,
        };
        let model = render::build(trace, &vp, &default_styles());
        let mut out = Vec::new();
        write_chart(&mut out, &model).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_chart_has_four_polylines_and_legend() {
        let out = render_to_string(&sample_trace());
        assert_eq!(out.matches("<polyline").count(), 4);
        for color in STRONG_COLORS {
            assert!(out.contains(color));
        }
        assert!(out.contains("height=\"300\""));
    }

    #[test]
    fn test_chart_with_reference_is_taller() {
        let mut trace = sample_trace();
        trace.ref_align = Some("ACG".to_string());
        let out = render_to_string(&trace);
        assert!(out.contains("height=\"360\""));
    }

    #[test]
    fn test_tick_labels_rotated() {
        let out = render_to_string(&sample_trace());
        assert!(out.contains("rotate(-90"));
        assert!(out.contains("2:CT"));
    }

    #[test]
    fn test_mismatch_rect_colors() {
        let mut trace = sample_trace();
        // A matches, C/T half-matches C, G mismatches T entirely.
        trace.ref_align = Some("ACT".to_string());
        let out = render_to_string(&trace);
        assert!(out.contains("orange"));
        // One red rect for the full mismatch, plus the red legend swatch.
        assert_eq!(out.matches("fill=\"red\"").count(), 2);
    }
}
