//! tracetui - Terminal Chromatogram Viewer
//!
//! A terminal-based viewer for DNA sequencing chromatogram traces.
//!
//! ## Usage
//!
//! ```bash
//! tracetui trace.json                         # view a local trace
//! tracetui -u https://host/upload trace.ab1   # upload and view the result
//! tracetui -u https://host/upload --example   # view the server's example
//! tracetui trace.json -o chart.svg            # write the chart, no TUI
//! ```
//!
//! ## Navigation
//!
//! - `Left`/`Right`: pan by a third, `PageUp`/`PageDown`: pan by a window
//! - `+`/`-`: zoom the trace axis, `Up`/`Down`: bigger/smaller peaks
//! - `a`/`c`/`g`/`t`: highlight a channel, `Esc`: restore
//! - mouse: drag to pan, wheel to zoom, select sequence text to recenter
//! - `e`: export SVG, `q`: quit

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tracetui::controller::run_app;
use tracetui::fetch;
use tracetui::model::{default_styles, AppState, Trace, Viewport};
use tracetui::render;
use tracetui::render_svg;
use tracetui::trace;

/// tracetui - an interactive viewer for DNA sequencing chromatogram traces
///
/// When run without -o/--output, opens the interactive TUI viewer.
/// With -o/--output, renders the chart as SVG and exits (use "-" for stdout).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trace JSON file to view (or the file to send with --upload)
    file: Option<PathBuf>,

    /// Upload endpoint: POST the file there and view the returned trace
    #[arg(short = 'u', long = "upload")]
    upload: Option<String>,

    /// With --upload, request the server's canned example trace instead of
    /// uploading a file
    #[arg(long)]
    example: bool,

    /// Write the chart as SVG and exit (CLI mode). Use "-" for stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<String>,
}

/// Loads the trace from wherever the arguments point.
fn load_trace(args: &Args) -> Result<Trace> {
    if let Some(endpoint) = &args.upload {
        let value = if args.example {
            fetch::fetch_example(endpoint)?
        } else {
            // Presence is validated in main; this is unreachable without a file.
            let file = args.file.as_ref().context("no upload file")?;
            fetch::upload_file(endpoint, file)?
        };
        Ok(trace::from_value(&value)?)
    } else {
        let file = args.file.as_ref().context("no trace file")?;
        Ok(trace::load_file(file)?)
    }
}

/// Runs CLI mode: render the chart for the default window and write it out.
fn run_cli_mode(loaded: &Trace, output: &str) -> Result<()> {
    let mut viewport = Viewport::default();
    viewport.clamp(loaded.max_x());
    let model = render::build(loaded, &viewport, &default_styles());

    if output == "-" {
        let stdout = io::stdout();
        render_svg::write_chart(stdout.lock(), &model)?;
    } else {
        let file = File::create(output)
            .with_context(|| format!("Failed to create output file {output}"))?;
        render_svg::write_chart(file, &model)?;
        eprintln!("Wrote chart to {output}");
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Argument combinations that can never load anything fail right away;
    // load failures themselves end up in the viewer's error region.
    if args.example && args.upload.is_none() {
        anyhow::bail!("--example requires --upload");
    }
    if args.upload.is_none() && args.file.is_none() {
        anyhow::bail!("a trace JSON file is required (or use --upload)");
    }
    if args.upload.is_some() && !args.example && args.file.is_none() {
        anyhow::bail!("--upload needs a file to send (or --example)");
    }

    // CLI mode: render once and exit.
    if let Some(output) = &args.output {
        let loaded = load_trace(&args)?;
        return run_cli_mode(&loaded, output);
    }

    // TUI mode: a failed load still opens the viewer, with the failure shown
    // in the error region.
    let mut state = AppState::new();
    match load_trace(&args) {
        Ok(loaded) => state.load_trace(loaded),
        Err(err) => {
            log::warn!("trace load failed: {err:#}");
            state.set_error(format!("{err:#}"));
        }
    }
    run_app(state)
}
