//! Dump the overview strip for a synthetic document.
//!
//! Reads a list of annotations such as
//! `[{ "type": "error", "line": 120 }, { "type": "search", "line": 4000, "span": 3 }]`
//! and prints one row per overview mark.

use annotation_ruler::model::{AnnotationModel, DocumentLines, LineIndex, Position, SimpleAnnotationModel};
use annotation_ruler::view::{GeometrySnapshot, RulerPainter, ScrollMetrics};
use annotation_ruler::RulerConfig;
use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Print overview ruler marks as text
#[derive(Parser, Debug)]
#[command(name = "overview_dump")]
#[command(about = "Print the overview ruler marks for a synthetic document", long_about = None)]
struct Args {
    /// JSON file with the annotations to place
    #[arg(value_name = "ANNOTATIONS")]
    annotations: PathBuf,

    /// Ruler configuration; the built-in types are used when omitted
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of lines in the synthetic document
    #[arg(long, default_value = "10000")]
    lines: usize,

    /// Height of the overview strip in pixels
    #[arg(long, default_value = "600")]
    height: i32,

    /// Line height of the text area in pixels
    #[arg(long, default_value = "15")]
    line_height: i32,
}

#[derive(Debug, Deserialize)]
struct AnnotationEntry {
    #[serde(rename = "type")]
    kind: String,
    line: usize,
    #[serde(default = "one")]
    span: usize,
}

fn one() -> usize {
    1
}

impl AnnotationEntry {
    /// Text of the spanned lines without the final newline. The empty line
    /// after the last newline gives an empty position.
    fn position(&self, lines: &LineIndex) -> anyhow::Result<Position> {
        let last_line = self.line + self.span.max(1) - 1;
        let start = lines
            .line_start(self.line)
            .with_context(|| format!("line {} is past the document", self.line))?;
        let end = lines
            .line_end(last_line)
            .with_context(|| format!("line {last_line} is past the document"))?;
        Ok(Position::new(start, (end - start).saturating_sub(1)))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RulerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RulerConfig::default(),
    };
    let entries: Vec<AnnotationEntry> = serde_json::from_str(
        &std::fs::read_to_string(&args.annotations)
            .with_context(|| format!("reading {}", args.annotations.display()))?,
    )?;

    let text = "x".repeat(40) + "\n";
    let text = text.repeat(args.lines);
    let lines = LineIndex::from_str(&text);
    let model = Arc::new(SimpleAnnotationModel::new(lines.length()));
    model.batch(|m| -> anyhow::Result<()> {
        for entry in &entries {
            m.annotate(&entry.kind, entry.position(&lines)?)?;
        }
        Ok(())
    })?;

    let mut painter = RulerPainter::from_config(&config);
    painter
        .cache_mut()
        .set_model(Some(model.clone() as Arc<dyn AnnotationModel>));

    let metrics = ScrollMetrics {
        total_lines: lines.line_count(),
        line_height: args.line_height,
        client_height: args.height,
        top_margin: 0,
        bottom_margin: 0,
        strip_height: args.height,
        strip_top_offset: 0,
        thumb_height: None,
    };
    let geometry = GeometrySnapshot::from_scroll(&metrics, painter.config());
    tracing::info!(?geometry, annotations = model.len(), "painting overview");

    if let Some(color) = painter.overview_header() {
        println!("header {color}");
    }
    for mark in painter.paint_overview(0..geometry.strip_height, &geometry, &lines) {
        println!("{mark}");
    }
    Ok(())
}
