//! # tracetui - Terminal Chromatogram Viewer
//!
//! A terminal-based viewer for DNA sequencing chromatogram traces using
//! ratatui.
//!
//! ## Architecture
//!
//! The application follows an event-driven architecture with clear separation:
//! - `model`: Trace data, viewport navigation, channel styles, and
//!   application state
//! - `trace`: Trace JSON loading and field-by-field validation
//! - `render`: Pure render-model computation (curves, ticks, reference row,
//!   sequence views)
//! - `render_svg`: SVG chart adapter over the render model
//! - `ui`: TUI adapter over the render model
//! - `event`: Keyboard/mouse handling and state transitions
//! - `controller`: Terminal lifecycle and main loop
//! - `fetch`: Upload client for the trace server endpoint
//!
//! The render model and all navigation operations are pure, so window math,
//! scaling, gap handling, and reference mismatches are tested without a
//! terminal or a browser.

pub mod controller;
pub mod event;
pub mod fetch;
pub mod model;
pub mod render;
pub mod render_svg;
pub mod trace;
pub mod ui;
